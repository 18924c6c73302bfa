use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::Mutex,
};
use tracing::warn;

use crate::config::Config;

/// Remembers the last city the user picked.
///
/// Implementations swallow their own failures; the controller treats both calls as infallible.
pub trait CityStore: Send + Sync {
    fn last_city(&self) -> Option<String>;
    fn set_last_city(&self, city: &str);
}

/// On-disk shape of the state file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedCity {
    pub last_city: String,
    pub saved_at: DateTime<Utc>,
}

/// Stores the last city as TOML in the platform data directory.
#[derive(Debug, Clone)]
pub struct FileCityStore {
    path: PathBuf,
}

impl FileCityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location, next to the config file's project dirs.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Config::state_file_path()?))
    }

    /// Read the saved entry, `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<SavedCity>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))?;

        let saved: SavedCity = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))?;

        Ok(Some(saved))
    }

    pub fn save(&self, city: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let saved = SavedCity { last_city: city.to_string(), saved_at: Utc::now() };
        let toml = toml::to_string_pretty(&saved).context("Failed to serialize saved city")?;

        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;

        Ok(())
    }
}

impl CityStore for FileCityStore {
    fn last_city(&self) -> Option<String> {
        match self.load() {
            Ok(saved) => saved.map(|s| s.last_city),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "could not read last city");
                None
            }
        }
    }

    fn set_last_city(&self, city: &str) {
        if let Err(err) = self.save(city) {
            warn!(error = %format!("{err:#}"), city, "could not persist last city");
        }
    }
}

/// Keeps the last city in memory only.
#[derive(Debug, Default)]
pub struct MemoryCityStore {
    city: Mutex<Option<String>>,
}

impl MemoryCityStore {
    pub fn new(city: Option<String>) -> Self {
        Self { city: Mutex::new(city) }
    }
}

impl CityStore for MemoryCityStore {
    fn last_city(&self) -> Option<String> {
        self.city.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    fn set_last_city(&self, city: &str) {
        *self.city.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(city.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("skycast-store-{}-{name}", std::process::id()))
            .join("state.toml")
    }

    #[test]
    fn memory_store_round_trips_city() {
        let store = MemoryCityStore::default();
        assert_eq!(store.last_city(), None);

        store.set_last_city("Lisbon");
        assert_eq!(store.last_city(), Some("Lisbon".to_string()));
    }

    #[test]
    fn file_store_missing_file_means_no_city() {
        let store = FileCityStore::new(temp_path("missing"));
        assert_eq!(store.last_city(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let path = temp_path("persist");
        FileCityStore::new(&path).set_last_city("Oslo");

        let reopened = FileCityStore::new(&path);
        assert_eq!(reopened.last_city(), Some("Oslo".to_string()));
        let saved = reopened.load().expect("state must parse").expect("state must exist");
        assert!(saved.saved_at <= Utc::now());

        let _ = fs::remove_dir_all(path.parent().expect("temp path has a parent"));
    }

    #[test]
    fn file_store_corrupt_file_reads_as_absent() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().expect("temp path has a parent")).expect("mkdir");
        fs::write(&path, "not = [valid").expect("write");

        let store = FileCityStore::new(&path);
        assert!(store.load().is_err());
        assert_eq!(store.last_city(), None);

        let _ = fs::remove_dir_all(path.parent().expect("temp path has a parent"));
    }
}
