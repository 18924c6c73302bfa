use std::fmt;

use skycast_core::{ViewState, WeatherSnapshot};

/// Text for the whole screen in a given state.
pub fn view_state(state: &ViewState) -> String {
    match state {
        ViewState::Initial => "Loading...".to_string(),
        ViewState::NoCitySelected => {
            "No city selected yet. Search for a city to get started.".to_string()
        }
        ViewState::CurrentWeather(weather) => weather_card(weather),
        ViewState::SearchStarted => "Type a city name to search.".to_string(),
        ViewState::SearchResults(results) if results.is_empty() => {
            "No matching cities.".to_string()
        }
        ViewState::SearchResults(results) => results
            .iter()
            .map(|weather| format!("  {}", ResultRow(weather.clone())))
            .collect::<Vec<_>>()
            .join("\n"),
        ViewState::Error(message) => format!("Error: {message}"),
    }
}

pub fn weather_card(weather: &WeatherSnapshot) -> String {
    format!(
        "{}\n  {}  {}\n  Humidity {}%   UV {}   Feels like {}˚\n  {}",
        weather.city_name,
        weather.temperature,
        weather.condition,
        weather.humidity,
        weather.uv_index,
        weather.feels_like,
        weather.icon_url,
    )
}

/// One line per search result; also what the picker shows.
#[derive(Debug, Clone)]
pub struct ResultRow(pub WeatherSnapshot);

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<24} {:>5}  {}", self.0.city_name, self.0.temperature, self.0.condition)
    }
}
