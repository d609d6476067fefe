use crate::{
    Config,
    model::{LocationCandidate, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
pub use reqwest::StatusCode;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

/// Maximum number of candidates requested per geocoding lookup.
pub const GEOCODE_LIMIT: usize = 5;

/// Failure talking to a geocoding or weather service.
///
/// The `Display` text is what the user sees when a weather lookup fails, so
/// every variant renders as a short human-readable sentence.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network Error")]
    Transport(#[source] reqwest::Error),

    #[error("{}", status_text(.status, .message))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response contained no weather conditions")]
    NoConditions,

    #[error("Lookup was interrupted")]
    Interrupted,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs carry the API key in their query string.
        ApiError::Transport(err.without_url())
    }
}

fn status_text(status: &StatusCode, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("Request failed with status code {}", status.as_u16()),
    }
}

/// Resolves free-text place names to ranked candidates.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<LocationCandidate>, ApiError>;
}

/// Fetches current conditions for a coordinate pair, in metric units.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, ApiError>;
}

/// Construct the OpenWeather client from config, with an optional key that
/// takes precedence over the stored one (e.g. `--api-key`).
pub fn provider_from_config(
    config: &Config,
    api_key_override: Option<&str>,
) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = api_key_override
        .or_else(|| config.api_key())
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `cityweather configure` and enter your API key, or pass --api-key."
            )
        })?;

    let provider = OpenWeatherProvider::new(
        api_key.to_owned(),
        config.endpoints.clone(),
        config.timeout(),
    )?;

    Ok(provider)
}
