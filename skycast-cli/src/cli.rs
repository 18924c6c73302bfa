use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use skycast_core::{
    CityStore, Config, FileCityStore, MemoryCityStore, WeatherClient, WeatherController,
    WeatherViewModel,
};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Current weather for your city")]
pub struct Cli {
    /// WeatherAPI.com key; overrides the configured one.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Keep the selected city in memory instead of saving it.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Defaults to `interactive`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and search tuning.
    Configure,

    /// Show weather for the last selected city.
    Show,

    /// Search for cities and show their current weather.
    Search {
        /// City name or part of it.
        query: String,

        /// Choose one of the results as the active city.
        #[arg(long)]
        pick: bool,
    },

    /// Browse weather and search cities interactively.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let Cli { api_key, ephemeral, command } = self;

        let mut config = Config::load()?;
        if let Some(key) = api_key {
            config.set_api_key(key);
        }

        match command.unwrap_or(Command::Interactive) {
            Command::Configure => configure(config),
            Command::Show => show(&build_controller(&config, ephemeral)?, ephemeral).await,
            Command::Search { query, pick } => {
                search(&build_controller(&config, ephemeral)?, query, pick).await
            }
            Command::Interactive => interactive::run(&build_controller(&config, ephemeral)?).await,
        }
    }
}

fn build_controller(config: &Config, ephemeral: bool) -> Result<WeatherController> {
    let client: Arc<dyn WeatherClient> = Arc::new(config.weather_client()?);
    let store: Arc<dyn CityStore> = if ephemeral {
        Arc::new(MemoryCityStore::default())
    } else {
        Arc::new(FileCityStore::open_default()?)
    };

    Ok(WeatherController::new(client, store, config.controller_config()))
}

fn configure(mut config: Config) -> Result<()> {
    let current = config.api.api_key.clone().unwrap_or_default();

    let mut prompt = Text::new("WeatherAPI.com API key:");
    if !current.is_empty() {
        prompt = prompt.with_default(&current);
    }
    let api_key = prompt.prompt().context("Failed to read API key")?;

    let debounce_ms = CustomType::<u64>::new("Search debounce (ms):")
        .with_default(config.search.debounce_ms)
        .with_error_message("Please enter a whole number of milliseconds")
        .prompt()
        .context("Failed to read debounce interval")?;

    config.set_api_key(api_key.trim().to_string());
    config.search.debounce_ms = debounce_ms;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(controller: &WeatherController, ephemeral: bool) -> Result<()> {
    controller.fetch_weather().await;
    println!("{}", render::view_state(&controller.view_state()));

    if !ephemeral {
        if let Some(saved) = FileCityStore::open_default()?.load()? {
            let when = saved.saved_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
            println!("  (selected {when})");
        }
    }

    Ok(())
}

async fn search(controller: &WeatherController, query: String, pick: bool) -> Result<()> {
    let results = interactive::search_results(controller, query).await?;

    if !pick || results.is_empty() {
        println!("{}", render::view_state(&controller.view_state()));
        controller.set_search_presented(false);
        return Ok(());
    }

    let rows = results.into_iter().map(render::ResultRow).collect();
    match Select::new("Pick a city:", rows).prompt_skippable()? {
        Some(row) => controller.select(row.0),
        None => controller.set_search_presented(false),
    }

    println!("{}", render::view_state(&controller.view_state()));
    Ok(())
}
