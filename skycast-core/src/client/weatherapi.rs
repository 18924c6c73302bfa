use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::model::{CurrentWeatherResponse, SearchMatch};

use super::{WeatherClient, WeatherClientError};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1/";

/// Client for the WeatherAPI.com REST endpoints.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

/// The calls the controller makes against WeatherAPI.com.
#[derive(Debug)]
enum Endpoint<'a> {
    CurrentWithCity(&'a str),
    CurrentWithLatLon(f64, f64),
    Search(&'a str),
}

impl Endpoint<'_> {
    fn path(&self) -> &'static str {
        match self {
            Endpoint::CurrentWithCity(_) | Endpoint::CurrentWithLatLon(..) => "current.json",
            Endpoint::Search(_) => "search.json",
        }
    }

    fn query(&self) -> Result<String, WeatherClientError> {
        let q = match self {
            Endpoint::CurrentWithCity(city) => city.trim().to_string(),
            Endpoint::CurrentWithLatLon(lat, lon) => format!("{lat},{lon}"),
            Endpoint::Search(query) => query.trim().to_string(),
        };

        if q.is_empty() {
            return Err(WeatherClientError::MalformedRequest(format!(
                "empty query for {}",
                self.path()
            )));
        }

        Ok(q)
    }
}

impl WeatherApiClient {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    /// Builds a client with a custom base URL and an optional per-request timeout.
    pub fn with_options(
        api_key: String,
        base_url: String,
        timeout: Option<Duration>,
    ) -> Result<Self, WeatherClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { api_key, base_url, http })
    }

    fn url(&self, endpoint: &Endpoint<'_>) -> Result<Url, WeatherClientError> {
        let q = endpoint.query()?;

        let mut url = Url::parse(&self.base_url)
            .and_then(|base| base.join(endpoint.path()))
            .map_err(|err| {
                WeatherClientError::MalformedRequest(format!(
                    "invalid base URL '{}': {err}",
                    self.base_url
                ))
            })?;

        url.query_pairs_mut().append_pair("key", &self.api_key).append_pair("q", &q);

        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint<'_>,
    ) -> Result<T, WeatherClientError> {
        let url = self.url(&endpoint)?;
        debug!(path = endpoint.path(), "sending WeatherAPI request");

        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherClientError::TransportFailure(format!(
                "WeatherAPI {} request failed with status {}: {}",
                endpoint.path(),
                status,
                error_message(&body),
            )));
        }

        decode(&body)
    }
}

#[async_trait]
impl WeatherClient for WeatherApiClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, WeatherClientError> {
        self.fetch(Endpoint::Search(query)).await
    }

    async fn weather_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<CurrentWeatherResponse, WeatherClientError> {
        self.fetch(Endpoint::CurrentWithLatLon(lat, lon)).await
    }

    async fn weather_by_city_name(
        &self,
        name: &str,
    ) -> Result<CurrentWeatherResponse, WeatherClientError> {
        self.fetch(Endpoint::CurrentWithCity(name)).await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, WeatherClientError> {
    Ok(serde_json::from_str(body)?)
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: WaError,
}

#[derive(Debug, Deserialize)]
struct WaError {
    message: String,
}

/// Pulls `error.message` out of an API error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<WaErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => truncate_body(body),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
