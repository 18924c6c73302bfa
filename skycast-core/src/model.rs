use serde::{Deserialize, Serialize};

/// Weather for one location, ready for display.
///
/// Built from a [`CurrentWeatherResponse`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city_name: String,
    pub temperature: String,
    pub condition: String,
    pub icon_url: String,
    pub humidity: String,
    pub uv_index: String,
    pub feels_like: String,
}

/// A candidate location returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub id: u64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Raw `current.json` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    pub location: ApiLocation,
    pub current: ApiCurrent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCurrent {
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub condition: ApiCondition,
    pub humidity: i64,
    pub uv: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCondition {
    pub text: String,
    pub icon: String,
}

/// What the presentation layer renders. Exactly one variant is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Initial,
    NoCitySelected,
    CurrentWeather(WeatherSnapshot),
    SearchStarted,
    SearchResults(Vec<WeatherSnapshot>),
    Error(String),
}

impl From<CurrentWeatherResponse> for WeatherSnapshot {
    fn from(weather: CurrentWeatherResponse) -> Self {
        let CurrentWeatherResponse { location, current } = weather;

        Self {
            city_name: location.name,
            // Truncated toward zero, not rounded.
            temperature: format!("{}˚", current.temp_c.trunc() as i64),
            condition: current.condition.text,
            icon_url: icon_url(&current.condition.icon),
            humidity: current.humidity.to_string(),
            uv_index: decimal(current.uv),
            feels_like: decimal(current.feelslike_c),
        }
    }
}

/// The API hands out protocol-relative icon paths (`//cdn...`).
fn icon_url(icon: &str) -> String {
    if icon.starts_with("http://") || icon.starts_with("https://") {
        icon.to_string()
    } else {
        format!("https:{icon}")
    }
}

/// Formats a float keeping at least one fractional digit, so `5.0` stays `"5.0"`.
fn decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
