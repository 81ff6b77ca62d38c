use skycast_core::StorageError;
use skycast_weather::Location;

use crate::storage::KeyValueStore;

/// Namespace key the list is persisted under.
pub const RECENT_SEARCHES_KEY: &str = "weather-recent-searches";

/// Maximum number of remembered locations.
pub const MAX_RECENT: usize = 5;

/// Most-recent-first list of selected locations, unique by `id`.
///
/// Persistence problems never escape this type: unreadable state loads as an
/// empty list and failed writes are logged.
#[derive(Debug)]
pub struct RecentLocationsStore<S: KeyValueStore> {
    storage: S,
    entries: Vec<Location>,
}

impl<S: KeyValueStore> RecentLocationsStore<S> {
    /// Load persisted entries from `storage`, starting empty if they are
    /// missing or corrupt.
    pub fn load(storage: S) -> Self {
        let entries = match Self::read(&storage) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Discarding recent searches: {}", e);
                Vec::new()
            }
        };
        tracing::debug!("Loaded {} recent searches", entries.len());

        Self { storage, entries }
    }

    fn read(storage: &S) -> Result<Vec<Location>, StorageError> {
        let Some(raw) = storage.get(RECENT_SEARCHES_KEY)? else {
            return Ok(Vec::new());
        };

        let parsed: Vec<Location> =
            serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                key: RECENT_SEARCHES_KEY.to_string(),
                reason: e.to_string(),
            })?;

        // A hand-edited file may break the list invariants; restore them
        let mut entries: Vec<Location> = Vec::with_capacity(MAX_RECENT);
        for location in parsed {
            if entries.len() == MAX_RECENT {
                break;
            }
            if !entries.iter().any(|e| e.id == location.id) {
                entries.push(location);
            }
        }
        Ok(entries)
    }

    /// Write the current list to storage.
    pub fn save(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.entries).map_err(|e| StorageError::WriteFailed {
            key: RECENT_SEARCHES_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.storage.set(RECENT_SEARCHES_KEY, &json)
    }

    /// Move `location` to the front, replacing any entry with the same id,
    /// and persist.
    pub fn record(&mut self, location: Location) {
        self.entries.retain(|e| e.id != location.id);
        self.entries.insert(0, location);
        self.entries.truncate(MAX_RECENT);

        if let Err(e) = self.save() {
            tracing::warn!("Failed to persist recent searches: {}", e);
        }
    }

    pub fn list(&self) -> &[Location] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
