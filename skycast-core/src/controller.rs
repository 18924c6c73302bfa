//! The controller behind the home screen.
//!
//! [`WeatherController`] owns the [`ViewState`], the search text and the
//! "search presented" flag. Typing is debounced into a search request whose
//! matches are fanned out into concurrent weather lookups; a newer search
//! cancels the older one so stale results never reach the view.
//!
//! Every state write happens while holding the session lock, which is what
//! serializes them. Background work only touches state through that lock and
//! re-checks its cancellation token or generation before committing.

use async_trait::async_trait;
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    client::WeatherClient,
    debounce::Debouncer,
    fanout::{self, Cancelled},
    model::{ViewState, WeatherSnapshot},
    store::CityStore,
};

/// Shown when the active city's weather can't be loaded.
pub const FETCH_ERROR_MESSAGE: &str = "Unable to fetch weather. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Quiet period required before search text is sent.
    pub debounce: Duration,
    /// Shorter queries are never sent.
    pub min_query_len: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { debounce: Duration::from_secs(1), min_query_len: 3 }
    }
}

/// What a presentation layer needs from the home screen.
#[async_trait]
pub trait WeatherViewModel: Send + Sync {
    fn view_state(&self) -> ViewState;

    /// Receiver that is notified on every state change.
    fn subscribe(&self) -> watch::Receiver<ViewState>;

    fn search_text(&self) -> String;

    /// Update the query. Schedules a debounced search when the search UI is open.
    fn set_search_text(&self, text: String);

    fn is_search_presented(&self) -> bool;

    /// Opening shows [`ViewState::SearchStarted`]; closing falls back to the last weather.
    fn set_search_presented(&self, presented: bool);

    /// Re-show the cached weather, or [`ViewState::NoCitySelected`] if there is none.
    fn show_last_weather(&self);

    /// Make `weather` the active city.
    fn select(&self, weather: WeatherSnapshot);

    /// Load weather for the persisted city.
    async fn fetch_weather(&self);
}

/// Cheap to clone; clones share the same state.
///
/// Intents must be issued from within a tokio runtime since they may spawn timers and searches.
#[derive(Clone)]
pub struct WeatherController {
    shared: Arc<Shared>,
}

struct Shared {
    client: Arc<dyn WeatherClient>,
    store: Arc<dyn CityStore>,
    config: ControllerConfig,
    state: watch::Sender<ViewState>,
    session: Mutex<Session>,
}

struct Session {
    search_text: String,
    is_search_presented: bool,
    cached: Option<WeatherSnapshot>,
    debouncer: Debouncer,
    /// Bumped on every input change so a timer that already fired can tell it is stale.
    input_generation: u64,
    /// Token of the in-flight search, if any.
    search: Option<CancellationToken>,
    /// Bumped by every load and every selection; only the latest load may commit.
    load_generation: u64,
    /// The latest load failed and nothing has been shown for the city since.
    load_failed: bool,
}

impl WeatherController {
    pub fn new(
        client: Arc<dyn WeatherClient>,
        store: Arc<dyn CityStore>,
        config: ControllerConfig,
    ) -> Self {
        let (state, _) = watch::channel(ViewState::Initial);
        let session = Session {
            search_text: String::new(),
            is_search_presented: false,
            cached: None,
            debouncer: Debouncer::new(config.debounce),
            input_generation: 0,
            search: None,
            load_generation: 0,
            load_failed: false,
        };

        Self {
            shared: Arc::new(Shared { client, store, config, state, session: Mutex::new(session) }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.shared.config
    }

    /// The last weather shown for the active city.
    pub fn cached_weather(&self) -> Option<WeatherSnapshot> {
        self.shared.session().cached.clone()
    }

    /// Whether a search fan-out is currently running.
    pub fn is_searching(&self) -> bool {
        self.shared.session().search.is_some()
    }
}

impl std::fmt::Debug for WeatherController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherController")
            .field("client", &self.shared.client)
            .field("config", &self.shared.config)
            .field("state", &*self.shared.state.borrow())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WeatherViewModel for WeatherController {
    fn view_state(&self) -> ViewState {
        self.shared.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.shared.state.subscribe()
    }

    fn search_text(&self) -> String {
        self.shared.session().search_text.clone()
    }

    fn set_search_text(&self, text: String) {
        let mut session = self.shared.session();
        session.search_text = text;
        self.shared.on_search_input(&mut session);
    }

    fn is_search_presented(&self) -> bool {
        self.shared.session().is_search_presented
    }

    fn set_search_presented(&self, presented: bool) {
        let mut session = self.shared.session();
        session.is_search_presented = presented;

        if presented {
            self.shared.publish(ViewState::SearchStarted);
            self.shared.on_search_input(&mut session);
            return;
        }

        Shared::discard_pending_input(&mut session);
        Shared::cancel_search(&mut session);

        let searching = matches!(
            *self.shared.state.borrow(),
            ViewState::SearchStarted | ViewState::SearchResults(_)
        );
        if searching {
            self.shared.show_last_weather(&mut session);
        }
    }

    fn show_last_weather(&self) {
        let mut session = self.shared.session();
        self.shared.show_last_weather(&mut session);
    }

    fn select(&self, weather: WeatherSnapshot) {
        let mut session = self.shared.session();
        self.shared.select(&mut session, weather);
    }

    async fn fetch_weather(&self) {
        self.shared.fetch_weather().await;
    }
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: ViewState) {
        self.state.send_replace(state);
    }

    fn query_ready(&self, text: &str) -> bool {
        text.chars().count() >= self.config.min_query_len
    }

    fn discard_pending_input(session: &mut Session) {
        session.input_generation = session.input_generation.wrapping_add(1);
        session.debouncer.cancel();
    }

    fn cancel_search(session: &mut Session) {
        if let Some(token) = session.search.take() {
            debug!("cancelling in-flight search");
            token.cancel();
        }
    }

    /// Re-evaluates the search pipeline after the text or the presented flag changed.
    fn on_search_input(self: &Arc<Self>, session: &mut Session) {
        Self::discard_pending_input(session);

        if !session.is_search_presented {
            return;
        }

        if !self.query_ready(&session.search_text) {
            Self::cancel_search(session);
            let showing_results = matches!(*self.state.borrow(), ViewState::SearchResults(_));
            if showing_results {
                self.publish(ViewState::SearchStarted);
            }
            return;
        }

        let generation = session.input_generation;
        let shared = Arc::clone(self);
        session.debouncer.call(move || shared.on_debounce_elapsed(generation));
    }

    fn on_debounce_elapsed(self: &Arc<Self>, generation: u64) {
        let mut session = self.session();

        if session.input_generation != generation {
            debug!("ignoring stale debounce timer");
            return;
        }
        if !session.is_search_presented || !self.query_ready(&session.search_text) {
            return;
        }

        let query = session.search_text.clone();
        Self::cancel_search(&mut session);
        let token = CancellationToken::new();
        session.search = Some(token.clone());
        drop(session);

        debug!(query = %query, "starting search");
        let shared = Arc::clone(self);
        tokio::spawn(async move { shared.run_search(query, token).await });
    }

    async fn run_search(self: Arc<Self>, query: String, token: CancellationToken) {
        // A failed search call reads as "no matches" so the user doesn't see
        // error text flash while still typing.
        let results = match self.client.search(&query).await {
            Ok(matches) => {
                debug!(query = %query, count = matches.len(), "search returned matches");
                match fanout::fetch_all(Arc::clone(&self.client), matches, &token).await {
                    Ok(results) => results,
                    Err(Cancelled) => {
                        debug!(query = %query, "search superseded before completing");
                        return;
                    }
                }
            }
            Err(err) => {
                warn!(%err, query = %query, "search request failed; showing no results");
                Vec::new()
            }
        };

        let mut session = self.session();
        if token.is_cancelled() {
            debug!(query = %query, "discarding results of superseded search");
            return;
        }

        session.search = None;
        self.publish(ViewState::SearchResults(results));
    }

    fn show_last_weather(&self, session: &mut Session) {
        match session.cached.clone() {
            Some(cached) => self.select(session, cached),
            None => {
                Self::discard_pending_input(session);
                Self::cancel_search(session);
                session.is_search_presented = false;
                if session.load_failed {
                    self.publish(ViewState::Error(FETCH_ERROR_MESSAGE.to_string()));
                } else {
                    self.publish(ViewState::NoCitySelected);
                }
            }
        }
    }

    fn select(&self, session: &mut Session, weather: WeatherSnapshot) {
        Self::discard_pending_input(session);
        Self::cancel_search(session);
        session.load_generation = session.load_generation.wrapping_add(1);
        session.load_failed = false;

        self.store.set_last_city(&weather.city_name);
        info!(city = %weather.city_name, "active city selected");

        session.cached = Some(weather.clone());
        session.search_text.clear();
        session.is_search_presented = false;
        self.publish(ViewState::CurrentWeather(weather));
    }

    async fn fetch_weather(&self) {
        let city = self.store.last_city().filter(|city| !city.trim().is_empty());

        let Some(city) = city else {
            let mut session = self.session();
            session.load_generation = session.load_generation.wrapping_add(1);
            session.load_failed = false;
            if !session.is_search_presented {
                self.publish(ViewState::NoCitySelected);
            }
            return;
        };

        let generation = {
            let mut session = self.session();
            session.load_generation = session.load_generation.wrapping_add(1);
            session.load_generation
        };

        debug!(city = %city, "loading weather for persisted city");
        let outcome = self.client.weather_by_city_name(&city).await;

        let mut session = self.session();
        if session.load_generation != generation {
            debug!(city = %city, "discarding superseded weather load");
            return;
        }

        // While search is open the result only refreshes the cache or the failure flag.
        match outcome {
            Ok(weather) => {
                let snapshot = WeatherSnapshot::from(weather);
                session.load_failed = false;
                session.cached = Some(snapshot.clone());
                if !session.is_search_presented {
                    self.publish(ViewState::CurrentWeather(snapshot));
                }
            }
            Err(err) => {
                warn!(%err, city = %city, "failed to fetch weather");
                session.load_failed = true;
                if !session.is_search_presented {
                    self.publish(ViewState::Error(FETCH_ERROR_MESSAGE.to_string()));
                }
            }
        }
    }
}
