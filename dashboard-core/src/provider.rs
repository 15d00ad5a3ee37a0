use crate::{
    Config,
    model::{
        AirQualitySample, Coordinates, CurrentConditions, ForecastSeries, LocationQuery,
        UnitSystem,
    },
    provider::openweather::OpenWeatherSource,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub const LOCATION_NOT_FOUND: &str = "Location not found";
pub const FETCH_FAILED: &str = "Failed to fetch weather data";

/// Failure of a single upstream lookup.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The source explicitly reported the location as unresolvable.
    #[error("{0}")]
    NotFound(String),

    /// The source explicitly rejected the request for another reason (e.g. a bad key).
    #[error("upstream rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Message suitable for showing to the user in place of the dashboard.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::NotFound(message) if message.trim().is_empty() => {
                LOCATION_NOT_FOUND.to_string()
            }
            FetchError::NotFound(message) => message.clone(),
            FetchError::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            FetchError::Rejected { .. } | FetchError::Transport(_) | FetchError::Decode(_) => {
                FETCH_FAILED.to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// The three upstream lookups the dashboard depends on.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn current_conditions(
        &self,
        query: &LocationQuery,
        units: UnitSystem,
    ) -> Result<CurrentConditions, FetchError>;

    async fn forecast(
        &self,
        query: &LocationQuery,
        units: UnitSystem,
    ) -> Result<ForecastSeries, FetchError>;

    /// `Ok(None)` when the source has no reading for `coords`.
    async fn air_quality(&self, coords: Coordinates)
    -> Result<Option<AirQualitySample>, FetchError>;
}

/// Construct the OpenWeather source from config.
pub fn source_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weather-dashboard configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    let source = OpenWeatherSource::builder(api_key)
        .base_url(config.base_url())
        .timeout(config.timeout())
        .build()?;

    Ok(Box::new(source))
}
