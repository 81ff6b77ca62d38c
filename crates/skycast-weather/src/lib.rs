//! Open-Meteo clients for Skycast
//!
//! Place search (geocoding), current conditions, and the WMO weather code
//! table used to describe them.

pub mod condition;
pub mod geocode;
pub mod provider;
pub mod retry;
pub mod types;

pub use condition::{describe, Condition, IconCategory};
pub use geocode::{is_searchable, GeocodingClient, PlaceSearch, MIN_QUERY_CHARS};
pub use provider::{WeatherProvider, WeatherSource};
pub use retry::RetryConfig;
pub use types::*;
