use std::{fmt, time::Duration};

use anyhow::{Context, Result, bail};
use inquire::{CustomUserError, Select, Text, validator::Validation};
use skycast_core::{ViewState, WeatherController, WeatherSnapshot, WeatherViewModel};

use crate::render;

/// Upper bound on how long we wait for a search to settle.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
enum Action {
    Search,
    Refresh,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Search => "Search for a city",
            Action::Refresh => "Refresh",
            Action::Quit => "Quit",
        })
    }
}

pub async fn run(controller: &WeatherController) -> Result<()> {
    controller.fetch_weather().await;

    loop {
        println!("\n{}\n", render::view_state(&controller.view_state()));

        let actions = vec![Action::Search, Action::Refresh, Action::Quit];
        match Select::new("What next?", actions).prompt_skippable()? {
            Some(Action::Search) => search_round(controller).await?,
            Some(Action::Refresh) => controller.fetch_weather().await,
            Some(Action::Quit) | None => break,
        }
    }

    Ok(())
}

async fn search_round(controller: &WeatherController) -> Result<()> {
    controller.set_search_presented(true);
    let min_len = controller.config().min_query_len;

    let query = Text::new("City:")
        .with_help_message("Esc to cancel")
        .with_validator(move |input: &str| -> Result<Validation, CustomUserError> {
            Ok(if long_enough(input, min_len) {
                Validation::Valid
            } else {
                Validation::Invalid("Type a few more characters".into())
            })
        })
        .prompt_skippable()?;

    let Some(query) = query else {
        controller.set_search_presented(false);
        return Ok(());
    };

    let results = match search_results(controller, query).await {
        Ok(results) => results,
        Err(err) => {
            println!("{err:#}");
            controller.set_search_presented(false);
            return Ok(());
        }
    };
    if results.is_empty() {
        println!("{}", render::view_state(&controller.view_state()));
        controller.set_search_presented(false);
        return Ok(());
    }

    let rows = results.into_iter().map(render::ResultRow).collect();
    match Select::new("Pick a city:", rows).prompt_skippable()? {
        Some(row) => controller.select(row.0),
        None => controller.set_search_presented(false),
    }

    Ok(())
}

/// Whether `query` has enough characters once surrounding whitespace is dropped.
fn long_enough(query: &str, min_len: usize) -> bool {
    query.trim().chars().count() >= min_len
}

/// Opens search with `query` and waits for the debounced results to land.
pub async fn search_results(
    controller: &WeatherController,
    query: String,
) -> Result<Vec<WeatherSnapshot>> {
    let min_len = controller.config().min_query_len;
    if !long_enough(&query, min_len) {
        bail!("Search needs at least {min_len} characters, got '{query}'");
    }

    let mut rx = controller.subscribe();
    controller.set_search_presented(true);
    controller.set_search_text(query.trim().to_string());

    let settled = tokio::time::timeout(
        SEARCH_TIMEOUT,
        rx.wait_for(|state| matches!(state, ViewState::SearchResults(_) | ViewState::Error(_))),
    )
    .await
    .context("Timed out waiting for search results")?
    .context("Weather controller stopped")?
    .clone();

    match settled {
        ViewState::SearchResults(results) => Ok(results),
        ViewState::Error(message) => bail!(message),
        other => bail!("Unexpected state while searching: {other:?}"),
    }
}
