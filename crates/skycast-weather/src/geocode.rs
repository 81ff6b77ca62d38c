//! Forward geocoding: turn a typed city name into candidate places.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use crate::types::{Location, SearchResponse, WeatherError};

/// Queries shorter than this (after trimming) never reach the network.
pub const MIN_QUERY_CHARS: usize = 2;

const MAX_CANDIDATES: usize = 5;

/// Anything that can turn a query into candidate locations.
///
/// Failures are never surfaced: an unreachable service looks the same as
/// "no matches".
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, query: &str) -> Vec<Location>;
}

/// True when `query` is long enough to be worth searching for.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl GeocodingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_results: MAX_CANDIDATES,
        })
    }

    /// Ask the provider for fewer candidates (clamped to 1..=5).
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.clamp(1, MAX_CANDIDATES);
        self
    }

    /// Search for places matching `query`, propagating failures.
    #[instrument(skip(self), level = "debug")]
    pub async fn try_search(&self, query: &str) -> Result<Vec<Location>, WeatherError> {
        let query = query.trim();
        if !is_searchable(query) {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.base_url);
        let count = self.max_results.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", query),
                ("count", count.as_str()),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let mut results = parsed.results.unwrap_or_default();
        results.truncate(self.max_results);
        tracing::debug!("Geocoding '{}' returned {} candidates", query, results.len());
        Ok(results)
    }
}

#[async_trait]
impl PlaceSearch for GeocodingClient {
    async fn search(&self, query: &str) -> Vec<Location> {
        match self.try_search(query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("City search for '{}' failed: {}", query.trim(), e);
                Vec::new()
            }
        }
    }
}
