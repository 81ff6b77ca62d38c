use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use crate::retry::{with_retry, RetryConfig};
use crate::types::{ForecastResponse, WeatherError, WeatherSnapshot};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m,wind_direction_10m";

/// Source of current conditions for a coordinate pair.
///
/// Unlike place search, failures here are returned to the caller.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError>;
}

/// Open-Meteo forecast client
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    retry: RetryConfig,
}

impl WeatherProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    /// Coordinates are passed through unchecked.
    #[instrument(skip(self), level = "info")]
    async fn fetch_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/forecast", self.base_url);
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();

        let response = with_retry(&self.retry, || {
            self.client
                .get(&url)
                .query(&[
                    ("latitude", latitude.as_str()),
                    ("longitude", longitude.as_str()),
                    ("current", CURRENT_FIELDS),
                    ("timezone", "auto"),
                ])
                .send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Forecast request failed with status {}", status);
            return Err(WeatherError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let snapshot = WeatherSnapshot::from(parsed.current);
        tracing::debug!(
            "Current conditions: {}°C, code {}",
            snapshot.temperature_c,
            snapshot.weather_code
        );
        Ok(snapshot)
    }
}
