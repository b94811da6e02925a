//! Core library for the weather and air-quality service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over the upstream weather provider
//! - Shared domain models (coordinates, snapshots, aggregated result)
//! - The aggregator that chains geocoding, weather and pollution lookups
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use aggregator::WeatherAggregator;
pub use config::{Config, FileConfig};
pub use error::{Error, Result};
pub use model::{
    AggregatedResult, AirQuality, CityName, Coordinates, Pollutants, PollutionSnapshot,
    WeatherSnapshot,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
