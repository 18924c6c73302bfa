//! Core library for `skycast`.
//!
//! This crate defines:
//! - The home-screen controller: debounced search, concurrent weather fan-out, cancellation
//! - The WeatherAPI.com client and the last-city store it depends on
//! - Configuration and shared domain models
//!
//! It is used by `skycast-cli`, but any presentation layer can drive
//! [`WeatherController`] through the [`WeatherViewModel`] trait.

pub mod client;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod fanout;
pub mod model;
pub mod store;

#[cfg(test)]
mod testing;

pub use client::{WeatherApiClient, WeatherClient, WeatherClientError};
pub use config::Config;
pub use controller::{ControllerConfig, FETCH_ERROR_MESSAGE, WeatherController, WeatherViewModel};
pub use model::{SearchMatch, ViewState, WeatherSnapshot};
pub use store::{CityStore, FileCityStore, MemoryCityStore};
