//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::{
    client::{WeatherClient, WeatherClientError},
    model::{ApiCondition, ApiCurrent, ApiLocation, CurrentWeatherResponse, SearchMatch},
};

pub(crate) fn city(id: u64, name: &str, lat: f64) -> SearchMatch {
    SearchMatch { id, name: name.to_string(), lat, lon: -lat }
}

pub(crate) fn weather(name: &str, lat: f64, lon: f64) -> CurrentWeatherResponse {
    CurrentWeatherResponse {
        location: ApiLocation { name: name.to_string(), lat, lon },
        current: ApiCurrent {
            temp_c: 20.0,
            feelslike_c: 18.5,
            condition: ApiCondition {
                text: "Partly Cloudy".to_string(),
                icon: "//cdn.weatherapi.com/weather/64x64/day/116.png".to_string(),
            },
            humidity: 65,
            uv: 5.0,
        },
    }
}

/// Scripted [`WeatherClient`] that records every call.
#[derive(Debug, Default)]
pub(crate) struct FakeClient {
    searches: HashMap<String, Vec<SearchMatch>>,
    failing_search: bool,
    failing_lats: Vec<f64>,
    lat_delays: Vec<(f64, Duration)>,
    coordinate_delay: Duration,
    failing_city: bool,
    search_calls: Mutex<Vec<String>>,
    coordinate_calls: AtomicUsize,
    city_calls: Mutex<Vec<String>>,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_search(mut self, query: &str, matches: Vec<SearchMatch>) -> Self {
        self.searches.insert(query.to_string(), matches);
        self
    }

    pub(crate) fn failing_search(mut self) -> Self {
        self.failing_search = true;
        self
    }

    pub(crate) fn failing_lat(mut self, lat: f64) -> Self {
        self.failing_lats.push(lat);
        self
    }

    pub(crate) fn with_lat_delay(mut self, lat: f64, delay: Duration) -> Self {
        self.lat_delays.push((lat, delay));
        self
    }

    pub(crate) fn with_coordinate_delay(mut self, delay: Duration) -> Self {
        self.coordinate_delay = delay;
        self
    }

    pub(crate) fn failing_city(mut self) -> Self {
        self.failing_city = true;
        self
    }

    pub(crate) fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().expect("lock").clone()
    }

    pub(crate) fn coordinate_calls(&self) -> usize {
        self.coordinate_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn city_calls(&self) -> Vec<String> {
        self.city_calls.lock().expect("lock").clone()
    }

    fn name_for(&self, lat: f64) -> Option<String> {
        self.searches.values().flatten().find(|m| m.lat == lat).map(|m| m.name.clone())
    }
}

#[async_trait]
impl WeatherClient for FakeClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, WeatherClientError> {
        self.search_calls.lock().expect("lock").push(query.to_string());

        if self.failing_search {
            return Err(WeatherClientError::TransportFailure("search offline".into()));
        }

        Ok(self.searches.get(query).cloned().unwrap_or_default())
    }

    async fn weather_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<CurrentWeatherResponse, WeatherClientError> {
        self.coordinate_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self
            .lat_delays
            .iter()
            .find(|(l, _)| *l == lat)
            .map_or(self.coordinate_delay, |(_, d)| *d);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing_lats.contains(&lat) {
            return Err(WeatherClientError::TransportFailure(format!("no weather at {lat}")));
        }

        let name = self.name_for(lat).unwrap_or_else(|| format!("{lat},{lon}"));
        Ok(weather(&name, lat, lon))
    }

    async fn weather_by_city_name(
        &self,
        name: &str,
    ) -> Result<CurrentWeatherResponse, WeatherClientError> {
        self.city_calls.lock().expect("lock").push(name.to_string());

        if self.failing_city {
            return Err(WeatherClientError::TransportFailure("city lookup offline".into()));
        }

        Ok(weather(name, 0.0, 0.0))
    }
}
