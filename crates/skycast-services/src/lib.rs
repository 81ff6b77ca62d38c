//! Search and fetch coordination for Skycast.
//!
//! Everything here runs on one control thread: the [`Controller`] owns the
//! search state, the weather session and the recent-locations store, and
//! applies completions of its spawned timers and requests as messages.

pub mod controller;
pub mod recent;
pub mod search;
pub mod session;
pub mod storage;
pub mod view;

pub use controller::{Changed, Controller, ControllerMessage};
pub use recent::{RecentLocationsStore, MAX_RECENT, RECENT_SEARCHES_KEY};
pub use search::{ApplyOutcome, Dropdown, SearchCoordinator, SearchPhase, SearchRequest};
pub use session::{FetchOutcome, WeatherSession};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use view::{compass_point, Screen, Theme, WeatherView};
