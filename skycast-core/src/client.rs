use crate::model::{CurrentWeatherResponse, SearchMatch};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod weatherapi;

pub use weatherapi::WeatherApiClient;

/// Why a weather lookup failed.
#[derive(Debug, Error)]
pub enum WeatherClientError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("failed to decode response: {0}")]
    DecodeFailure(#[from] serde_json::Error),

    #[error("transport failure: {0}")]
    TransportFailure(String),
}

impl From<reqwest::Error> for WeatherClientError {
    fn from(err: reqwest::Error) -> Self {
        WeatherClientError::TransportFailure(err.to_string())
    }
}

#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    /// Free-text location search.
    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, WeatherClientError>;

    async fn weather_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<CurrentWeatherResponse, WeatherClientError>;

    async fn weather_by_city_name(
        &self,
        name: &str,
    ) -> Result<CurrentWeatherResponse, WeatherClientError>;
}
