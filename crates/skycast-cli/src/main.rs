use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use skycast_core::{AppError, Config};
use skycast_services::{Changed, Controller, FileStore, RecentLocationsStore};
use skycast_weather::{GeocodingClient, RetryConfig, WeatherProvider};
use tokio::io::{AsyncBufReadExt, BufReader};

mod command;
mod render;

use command::Command;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let config = match Config::load_validated() {
        Ok((config, _)) => config,
        Err(e) => {
            tracing::warn!("{}", e);
            eprintln!("{}", AppError::from(e).user_message());
            Config::default()
        }
    };

    let timeout = Duration::from_secs(config.api.timeout_secs);
    let places = GeocodingClient::new(&config.api.geocoding_url, timeout)
        .context("Failed to create geocoding client")?
        .with_max_results(config.search.max_results);
    let weather = WeatherProvider::new(&config.api.forecast_url, timeout)
        .context("Failed to create weather client")?
        .with_retry(RetryConfig::from(&config.retry));

    let store = FileStore::new(&config.storage.data_dir);
    tracing::info!("Recent searches stored in {}", store.dir().display());
    let recent = RecentLocationsStore::load(store);
    let mut controller = Controller::new(
        recent,
        Arc::new(places),
        Arc::new(weather),
        Duration::from_millis(config.search.debounce_ms),
    );

    tracing::info!("Skycast started");
    render::banner();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };

                match Command::parse(&line) {
                    Command::Quit => break,
                    Command::Help => render::help(),
                    Command::Query(text) => {
                        controller.set_query(&text);
                        render::dropdown(&controller.dropdown());
                    }
                    Command::Focus => {
                        controller.focus();
                        render::dropdown(&controller.dropdown());
                    }
                    Command::Select(index) => match controller.select(index) {
                        Some(location) => {
                            println!("{}", location.label());
                            render::screen(&controller.screen());
                        }
                        None => println!("  No entry {}", index + 1),
                    },
                    Command::Retry => {
                        if controller.retry() {
                            render::screen(&controller.screen());
                        } else {
                            println!("  Nothing to retry yet");
                        }
                    }
                }
            }
            Some(message) = controller.next_message() => {
                match controller.handle(message) {
                    Changed::Dropdown => render::dropdown(&controller.dropdown()),
                    Changed::Weather => render::screen(&controller.screen()),
                    Changed::Nothing => {}
                }
            }
        }
    }

    tracing::info!("Skycast shutting down");
    Ok(())
}
