use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest city name accepted, in characters.
pub const MAX_CITY_LEN: usize = 100;

/// A city name that passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityName(String);

impl CityName {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(Error::Validation("City name is required".into()));
        }
        if raw.chars().count() > MAX_CITY_LEN {
            return Err(Error::Validation(format!(
                "City name cannot exceed {MAX_CITY_LEN} characters"
            )));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub temperature_celsius: f64,
    pub humidity_percent: u8,
    pub wind_speed_mps: f64,
    pub description: String,
}

/// Pollutant concentrations in µg/m³.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pollutants {
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollutionSnapshot {
    /// 1..=5 as reported upstream, 0 when the provider returned no reading.
    pub air_quality_index: i32,
    pub pollutants: Pollutants,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQuality {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    Unknown,
}

impl AirQuality {
    pub fn from_index(aqi: i32) -> Self {
        match aqi {
            1 => AirQuality::Good,
            2 => AirQuality::Fair,
            3 => AirQuality::Moderate,
            4 => AirQuality::Poor,
            5 => AirQuality::VeryPoor,
            _ => AirQuality::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AirQuality::Good => "Good",
            AirQuality::Fair => "Fair",
            AirQuality::Moderate => "Moderate",
            AirQuality::Poor => "Poor",
            AirQuality::VeryPoor => "Very Poor",
            AirQuality::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for AirQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The combined payload returned for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub city: String,
    pub coordinates: Coordinates,
    pub weather: WeatherSnapshot,
    pub pollution: PollutionSnapshot,
    pub air_quality_label: String,
}

impl AggregatedResult {
    pub fn new(
        city: &CityName,
        coordinates: Coordinates,
        weather: WeatherSnapshot,
        pollution: PollutionSnapshot,
    ) -> Self {
        let label = AirQuality::from_index(pollution.air_quality_index).label();
        Self {
            city: city.as_str().to_owned(),
            coordinates,
            weather,
            pollution,
            air_quality_label: label.to_owned(),
        }
    }
}
