//! Concurrent weather lookups for every search match.

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    client::WeatherClient,
    model::{SearchMatch, WeatherSnapshot},
};

/// The fan-out was cancelled before its results could be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search was superseded")]
pub struct Cancelled;

/// Fetch weather for each match concurrently.
///
/// Failed lookups are dropped. Results come back in completion order. Returns
/// [`Cancelled`] if `token` fires at any point before the join completes.
pub async fn fetch_all(
    client: Arc<dyn WeatherClient>,
    matches: Vec<SearchMatch>,
    token: &CancellationToken,
) -> Result<Vec<WeatherSnapshot>, Cancelled> {
    let mut tasks = JoinSet::new();

    for candidate in matches {
        if token.is_cancelled() {
            tasks.abort_all();
            return Err(Cancelled);
        }

        let client = Arc::clone(&client);
        let token = token.clone();
        tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                res = client.weather_by_coordinates(candidate.lat, candidate.lon) => match res {
                    Ok(weather) => Some(WeatherSnapshot::from(weather)),
                    Err(err) => {
                        debug!(%err, name = %candidate.name, "dropping search match");
                        None
                    }
                },
            }
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(snapshot)) => results.push(snapshot),
            Ok(None) => {}
            Err(err) => warn!(%err, "weather lookup task failed"),
        }
    }

    if token.is_cancelled() {
        return Err(Cancelled);
    }

    Ok(results)
}
