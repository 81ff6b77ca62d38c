use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skycast_core::{NetworkError, ReqwestErrorExt};

use crate::condition::{describe, Condition};

/// Message shown whenever a weather fetch fails, whatever the cause.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch weather data. Please try again.";

/// A place returned by the geocoding service.
///
/// Field names follow the provider's records so the same shape is used on
/// the wire and in persisted recent searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Provider-assigned identifier; recent searches are deduplicated on it
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub country: String,
    /// First-level administrative area (state, province, region)
    #[serde(rename = "admin1", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// "London, United Kingdom", used as the search box text after selection.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }

    /// "England, United Kingdom": the secondary line under the place name.
    pub fn area(&self) -> String {
        match self.region.as_deref() {
            Some(region) if !region.is_empty() && !self.country.is_empty() => {
                format!("{}, {}", region, self.country)
            }
            Some(region) if !region.is_empty() => region.to_string(),
            _ => self.country.clone(),
        }
    }
}

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub apparent_temperature_c: f64,
    pub relative_humidity_pct: f64,
    /// WMO weather interpretation code
    pub weather_code: i32,
    pub wind_speed_kmh: f64,
    pub wind_direction_deg: f64,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn condition(&self) -> Condition {
        describe(self.weather_code)
    }
}

/// `current` block of a forecast response.
#[derive(Debug, Deserialize)]
pub(crate) struct CurrentConditions {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    weather_code: i32,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    pub(crate) current: CurrentConditions,
}

impl From<CurrentConditions> for WeatherSnapshot {
    fn from(c: CurrentConditions) -> Self {
        Self {
            temperature_c: c.temperature_2m,
            apparent_temperature_c: c.apparent_temperature,
            relative_humidity_pct: c.relative_humidity_2m,
            weather_code: c.weather_code,
            wind_speed_kmh: c.wind_speed_10m,
            wind_direction_deg: c.wind_direction_10m,
            fetched_at: Utc::now(),
        }
    }
}

/// Geocoding search response; `results` is absent when nothing matched.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) results: Option<Vec<Location>>,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    /// The fixed, non-technical message shown for any fetch failure.
    pub fn user_message(&self) -> &'static str {
        FETCH_ERROR_MESSAGE
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Network(e.into_network_error())
    }
}
