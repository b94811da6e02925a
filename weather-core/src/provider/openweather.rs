use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{Error, Result},
    model::{CityName, Coordinates, Pollutants, PollutionSnapshot, WeatherSnapshot},
};

use super::WeatherProvider;

const USER_AGENT: &str = concat!("weather-air-quality/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Issue a GET against `{base_url}/{path}` and return status and raw body.
    async fn get(
        &self,
        what: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<(StatusCode, String)> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(request = what, path, "calling OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::transport(what, e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| Error::transport(what, e))?;

        debug!(request = what, %status, bytes = body.len(), "OpenWeather responded");
        Ok((status, body))
    }

    fn coord_params(coords: Coordinates) -> Vec<(&'static str, String)> {
        vec![
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
        ]
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn resolve_city(&self, city: &CityName) -> Result<Coordinates> {
        let (status, body) = self
            .get("geocode", "weather", &[("q", city.as_str().to_string())])
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound { city: city.to_string() });
        }
        ensure_success("geocode", &city.to_string(), status, &body)?;

        let parsed: OwGeoResponse = decode("geocode", &body)?;
        parsed
            .coord
            .map(Coordinates::from)
            .ok_or_else(|| Error::provider(format!("failed to get coordinates for city '{city}'")))
    }

    async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot> {
        let mut params = Self::coord_params(coords);
        params.push(("units", "metric".to_string()));

        let (status, body) = self.get("weather", "weather", &params).await?;
        ensure_success("weather", &describe(coords), status, &body)?;

        let parsed: OwWeatherResponse = decode("weather", &body)?;
        Ok(parsed.into())
    }

    async fn fetch_pollution(&self, coords: Coordinates) -> Result<PollutionSnapshot> {
        let params = Self::coord_params(coords);

        let (status, body) = self.get("pollution", "air_pollution", &params).await?;
        ensure_success("pollution", &describe(coords), status, &body)?;

        let parsed: OwPollutionResponse = decode("pollution", &body)?;
        Ok(parsed.into())
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoResponse {
    #[serde(default)]
    coord: Option<OwCoord>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
}

impl From<OwCoord> for Coordinates {
    fn from(c: OwCoord) -> Self {
        Coordinates { latitude: c.lat, longitude: c.lon }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeatherResponse {
    main: Option<OwMain>,
    wind: Option<OwWind>,
    weather: Option<Vec<OwWeather>>,
}

impl From<OwWeatherResponse> for WeatherSnapshot {
    fn from(r: OwWeatherResponse) -> Self {
        let main = r.main.unwrap_or_default();
        let wind = r.wind.unwrap_or_default();
        let description = r
            .weather
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|w| w.description)
            .unwrap_or_else(|| "Unknown".to_string());

        WeatherSnapshot {
            temperature_celsius: main.temp,
            humidity_percent: main.humidity,
            wind_speed_mps: wind.speed,
            description,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwAqi {
    aqi: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwPollutionEntry {
    main: Option<OwAqi>,
    components: Option<Pollutants>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwPollutionResponse {
    list: Option<Vec<OwPollutionEntry>>,
}

impl From<OwPollutionResponse> for PollutionSnapshot {
    fn from(r: OwPollutionResponse) -> Self {
        let Some(first) = r.list.unwrap_or_default().into_iter().next() else {
            return PollutionSnapshot::default();
        };

        PollutionSnapshot {
            air_quality_index: first.main.unwrap_or_default().aqi,
            pollutants: first.components.unwrap_or_default(),
        }
    }
}

fn ensure_success(what: &str, subject: &str, status: StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    Err(Error::provider(format!(
        "OpenWeather {what} request for {subject} failed with status {status}: {}",
        truncate_body(body),
    )))
}

fn decode<T: DeserializeOwned>(what: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::provider(format!("failed to parse OpenWeather {what} JSON: {e}")))
}

fn describe(coords: Coordinates) -> String {
    format!("({}, {})", coords.latitude, coords.longitude)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
