use thiserror::Error;

/// Errors produced while aggregating weather and air-quality data.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested city name was rejected before any upstream call.
    #[error("{0}")]
    Validation(String),

    /// The upstream provider does not know the city.
    #[error("City '{city}' not found")]
    NotFound { city: String },

    /// Any other upstream failure: transport, non-success status, bad payload, timeout.
    #[error("weather provider error: {0}")]
    Provider(String),

    /// Startup configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn provider(msg: impl Into<String>) -> Self {
        Error::Provider(msg.into())
    }

    /// Render a `reqwest` failure without its URL, which carries the API key.
    pub(crate) fn transport(what: &str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            Error::Provider(format!("{what} timed out"))
        } else {
            Error::Provider(format!("{what} failed: {err}"))
        }
    }
}
