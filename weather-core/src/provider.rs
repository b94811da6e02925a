use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config,
    error::Result,
    model::{CityName, Coordinates, PollutionSnapshot, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};

pub mod openweather;

/// Upstream source of geocoding, weather and air-pollution readings.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Resolve a city to coordinates. Unknown cities yield `Error::NotFound`.
    async fn resolve_city(&self, city: &CityName) -> Result<Coordinates>;

    async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot>;

    /// An empty upstream reading list yields `PollutionSnapshot::default()`.
    async fn fetch_pollution(&self, coords: Coordinates) -> Result<PollutionSnapshot>;
}

/// Construct the OpenWeather-backed provider from resolved config.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>> {
    let provider = OpenWeatherProvider::new(
        config.api_key.clone(),
        config.base_url.clone(),
        config.timeout(),
    )?;

    Ok(Box::new(provider))
}
