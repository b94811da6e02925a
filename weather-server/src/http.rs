//! HTTP surface: `GET /weather/{city}` and a health check.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use weather_core::{AggregatedResult, Error, WeatherAggregator};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: WeatherAggregator,
}

/// RFC 7807 body for upstream and internal failures.
#[derive(Debug, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub status: u16,
    pub detail: String,
}

/// Aggregation error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            err @ Error::NotFound { .. } => {
                (StatusCode::NOT_FOUND, err.to_string()).into_response()
            }
            err @ (Error::Provider(_) | Error::Configuration(_)) => {
                let status = StatusCode::BAD_GATEWAY;
                let problem = Problem {
                    kind: "about:blank",
                    title: "Error communicating with weather service",
                    status: status.as_u16(),
                    detail: err.to_string(),
                };
                (
                    status,
                    [(header::CONTENT_TYPE, "application/problem+json")],
                    Json(problem),
                )
                    .into_response()
            }
        }
    }
}

/// GET /weather/{city} - Current weather and air quality for a city
async fn get_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<AggregatedResult>, ApiError> {
    info!(%city, "Processing weather request");

    match state.aggregator.aggregate(&city).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            match &err {
                Error::Validation(msg) => warn!(%city, "rejected city name: {msg}"),
                Error::NotFound { .. } => warn!(%city, "City not found"),
                _ => error!(%city, "failed to aggregate weather data: {err}"),
            }
            Err(err.into())
        }
    }
}

/// GET /weather/ - Missing city segment
async fn missing_city() -> ApiError {
    ApiError(Error::Validation("City name is required".into()))
}

/// GET /health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Create the HTTP router
pub fn create_router(aggregator: WeatherAggregator) -> Router {
    let state = AppState { aggregator };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/weather", get(missing_city))
        .route("/weather/", get(missing_city))
        .route("/weather/{city}", get(get_weather))
        .layer(cors)
        .with_state(state)
}
