//! Resolve → weather → pollution call chain behind a single deadline.

use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    model::{AggregatedResult, CityName, Coordinates, PollutionSnapshot, WeatherSnapshot},
    provider::WeatherProvider,
};

#[derive(Debug, Clone)]
pub struct WeatherAggregator {
    provider: Arc<dyn WeatherProvider>,
    timeout: Duration,
    concurrent_fetch: bool,
}

impl WeatherAggregator {
    pub fn new(provider: Arc<dyn WeatherProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            concurrent_fetch: false,
        }
    }

    /// Fetch weather and pollution concurrently once coordinates are known.
    pub fn with_concurrent_fetch(mut self, enabled: bool) -> Self {
        self.concurrent_fetch = enabled;
        self
    }

    pub async fn resolve_city(&self, city: &CityName) -> Result<Coordinates> {
        self.provider.resolve_city(city).await
    }

    pub async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot> {
        self.provider.fetch_weather(coords).await
    }

    pub async fn fetch_pollution(&self, coords: Coordinates) -> Result<PollutionSnapshot> {
        self.provider.fetch_pollution(coords).await
    }

    /// Validate `city`, then combine its coordinates, weather and air quality.
    ///
    /// The first failing step aborts the whole chain. The total wall-clock
    /// time is bounded by the configured timeout.
    pub async fn aggregate(&self, city: &str) -> Result<AggregatedResult> {
        let city = CityName::parse(city)?;

        match tokio::time::timeout(self.timeout, self.run(&city)).await {
            Ok(result) => result,
            Err(_) => Err(Error::provider(format!(
                "request for city '{city}' timed out after {}s",
                self.timeout.as_secs_f64()
            ))),
        }
    }

    async fn run(&self, city: &CityName) -> Result<AggregatedResult> {
        let coords = self.resolve_city(city).await?;
        debug!(%city, lat = coords.latitude, lon = coords.longitude, "resolved city");

        let (weather, pollution) = if self.concurrent_fetch {
            tokio::try_join!(self.fetch_weather(coords), self.fetch_pollution(coords))?
        } else {
            let weather = self.fetch_weather(coords).await?;
            let pollution = self.fetch_pollution(coords).await?;
            (weather, pollution)
        };

        let result = AggregatedResult::new(city, coords, weather, pollution);
        info!(
            %city,
            aqi = result.pollution.air_quality_index,
            label = %result.air_quality_label,
            "aggregated weather and air quality"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pollutants;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Step {
        Resolve,
        Weather,
        Pollution,
    }

    #[derive(Debug, Default)]
    struct FakeProvider {
        calls: Mutex<Vec<Step>>,
        unknown_city: bool,
        weather_fails: bool,
        empty_pollution: bool,
        resolve_delay: Option<Duration>,
    }

    impl FakeProvider {
        fn calls(&self) -> Vec<Step> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, step: Step) {
            self.calls.lock().unwrap().push(step);
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn resolve_city(&self, city: &CityName) -> Result<Coordinates> {
            self.record(Step::Resolve);
            if let Some(delay) = self.resolve_delay {
                tokio::time::sleep(delay).await;
            }
            if self.unknown_city {
                return Err(Error::NotFound { city: city.to_string() });
            }
            Ok(Coordinates { latitude: 35.6944, longitude: 51.4215 })
        }

        async fn fetch_weather(&self, _coords: Coordinates) -> Result<WeatherSnapshot> {
            self.record(Step::Weather);
            if self.weather_fails {
                return Err(Error::provider("weather service returned 500"));
            }
            Ok(WeatherSnapshot {
                temperature_celsius: 15.5,
                humidity_percent: 65,
                wind_speed_mps: 5.2,
                description: "clear sky".into(),
            })
        }

        async fn fetch_pollution(&self, _coords: Coordinates) -> Result<PollutionSnapshot> {
            self.record(Step::Pollution);
            if self.empty_pollution {
                return Ok(PollutionSnapshot::default());
            }
            Ok(PollutionSnapshot {
                air_quality_index: 2,
                pollutants: Pollutants { co: 250.5, ..Pollutants::default() },
            })
        }
    }

    fn aggregator(provider: &Arc<FakeProvider>) -> WeatherAggregator {
        WeatherAggregator::new(provider.clone(), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn aggregate_combines_all_three_calls_in_order() {
        let provider = Arc::new(FakeProvider::default());

        let result = aggregator(&provider).aggregate("tehran").await.expect("aggregated");

        assert_eq!(provider.calls(), vec![Step::Resolve, Step::Weather, Step::Pollution]);
        assert_eq!(result.city, "tehran");
        assert_eq!(result.coordinates, Coordinates { latitude: 35.6944, longitude: 51.4215 });
        assert_eq!(result.weather.temperature_celsius, 15.5);
        assert_eq!(result.weather.humidity_percent, 65);
        assert_eq!(result.weather.wind_speed_mps, 5.2);
        assert_eq!(result.weather.description, "clear sky");
        assert_eq!(result.pollution.air_quality_index, 2);
        assert_eq!(result.pollution.pollutants.co, 250.5);
        assert_eq!(result.air_quality_label, "Fair");
    }

    #[tokio::test]
    async fn unknown_city_stops_the_chain() {
        let provider = Arc::new(FakeProvider { unknown_city: true, ..Default::default() });

        let err = aggregator(&provider).aggregate("InvalidCity").await.unwrap_err();

        assert!(matches!(err, Error::NotFound { ref city } if city == "InvalidCity"));
        assert_eq!(provider.calls(), vec![Step::Resolve]);
    }

    #[tokio::test]
    async fn weather_failure_skips_pollution() {
        let provider = Arc::new(FakeProvider { weather_fails: true, ..Default::default() });

        let err = aggregator(&provider).aggregate("tehran").await.unwrap_err();

        assert!(matches!(err, Error::Provider(_)));
        assert_eq!(provider.calls(), vec![Step::Resolve, Step::Weather]);
    }

    #[tokio::test]
    async fn invalid_city_makes_no_upstream_call() {
        let provider = Arc::new(FakeProvider::default());
        let agg = aggregator(&provider);

        let err = agg.aggregate(&"x".repeat(101)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = agg.aggregate("   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_pollution_yields_unknown_label() {
        let provider = Arc::new(FakeProvider { empty_pollution: true, ..Default::default() });

        let result = aggregator(&provider).aggregate("tehran").await.expect("aggregated");

        assert_eq!(result.pollution.air_quality_index, 0);
        assert_eq!(result.pollution.pollutants, Pollutants::default());
        assert_eq!(result.air_quality_label, "Unknown");
    }

    #[tokio::test]
    async fn concurrent_fetch_produces_same_result() {
        let provider = Arc::new(FakeProvider::default());
        let sequential = aggregator(&provider).aggregate("tehran").await.expect("aggregated");

        let provider = Arc::new(FakeProvider::default());
        let concurrent = aggregator(&provider)
            .with_concurrent_fetch(true)
            .aggregate("tehran")
            .await
            .expect("aggregated");

        assert_eq!(sequential, concurrent);
        let calls = provider.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Step::Resolve);
    }

    #[tokio::test]
    async fn concurrent_fetch_propagates_failure() {
        let provider = Arc::new(FakeProvider { weather_fails: true, ..Default::default() });

        let err = aggregator(&provider)
            .with_concurrent_fetch(true)
            .aggregate("tehran")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_upstream_hits_the_deadline() {
        let provider = Arc::new(FakeProvider {
            resolve_delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });

        let err = aggregator(&provider).aggregate("tehran").await.unwrap_err();

        assert!(matches!(err, Error::Provider(ref m) if m.contains("timed out")));
        assert_eq!(provider.calls(), vec![Step::Resolve]);
    }
}
