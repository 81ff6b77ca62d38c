//! City search state: debounce bookkeeping, last-query-wins sequencing and
//! what the dropdown should show.
//!
//! The coordinator never sleeps or performs I/O. Each query edit bumps a
//! generation counter; timers and responses are tagged with the generation
//! they were issued for and anything older than the current one is ignored.

use skycast_weather::{is_searchable, Location};

use crate::recent::{RecentLocationsStore, MAX_RECENT};
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Nothing typed since the coordinator was created or a selection was made
    Idle,
    /// Waiting for the query to settle
    Debouncing,
    /// Request issued, waiting for the response
    Searching,
    /// Showing results or the recency list
    Displaying,
}

/// A debounce timer the caller should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Response for a superseded query; dropped
    Stale,
}

/// What the dropdown under the search box should show.
#[derive(Debug, Clone, PartialEq)]
pub enum Dropdown {
    Closed,
    Searching { query: String },
    Results { query: String, locations: Vec<Location> },
    NoResults { query: String },
    Recent(Vec<Location>),
    /// No query and no history yet
    EmptyPrompt,
}

impl Dropdown {
    /// Selectable entries, in display order.
    pub fn entries(&self) -> &[Location] {
        match self {
            Dropdown::Results { locations, .. } => locations,
            Dropdown::Recent(locations) => locations,
            _ => &[],
        }
    }
}

pub struct SearchCoordinator<S: KeyValueStore> {
    recent: RecentLocationsStore<S>,
    query: String,
    results: Vec<Location>,
    phase: SearchPhase,
    open: bool,
    generation: u64,
}

impl<S: KeyValueStore> SearchCoordinator<S> {
    pub fn new(recent: RecentLocationsStore<S>) -> Self {
        Self {
            recent,
            query: String::new(),
            results: Vec::new(),
            phase: SearchPhase::Idle,
            open: false,
            generation: 0,
        }
    }

    /// The search box text changed.
    ///
    /// Any pending timer or in-flight search is superseded. Returns the
    /// timer to start, or `None` when the query is too short to search and
    /// the recency list is shown straight away.
    pub fn set_query(&mut self, text: &str) -> Option<SearchRequest> {
        self.query = text.to_string();
        self.open = true;
        self.generation += 1;

        if !is_searchable(text) {
            self.results.clear();
            self.phase = SearchPhase::Displaying;
            return None;
        }

        self.phase = SearchPhase::Debouncing;
        Some(SearchRequest {
            generation: self.generation,
            query: text.trim().to_string(),
        })
    }

    /// A debounce timer fired. Returns the query to search for if the timer
    /// still belongs to the latest edit.
    pub fn debounce_elapsed(&mut self, generation: u64) -> Option<String> {
        if generation != self.generation || self.phase != SearchPhase::Debouncing {
            return None;
        }

        self.phase = SearchPhase::Searching;
        Some(self.query.trim().to_string())
    }

    /// A search response arrived.
    pub fn apply_results(&mut self, generation: u64, results: Vec<Location>) -> ApplyOutcome {
        if generation != self.generation || self.phase != SearchPhase::Searching {
            tracing::debug!(
                "Dropping stale search results (generation {}, current {})",
                generation,
                self.generation
            );
            return ApplyOutcome::Stale;
        }

        self.results = results;
        self.phase = SearchPhase::Displaying;
        ApplyOutcome::Applied
    }

    /// A candidate was picked: close the dropdown and show its label.
    ///
    /// Also supersedes any pending search so the label text itself is never
    /// searched for.
    pub fn select(&mut self, location: &Location) {
        self.query = location.label();
        self.generation += 1;
        self.phase = SearchPhase::Idle;
        self.open = false;
    }

    /// Remember a location whose weather was fetched successfully.
    pub fn record_selection(&mut self, location: Location) {
        self.recent.record(location);
    }

    /// Search box gained focus.
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Focus moved elsewhere.
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn view(&self) -> Dropdown {
        if !self.open {
            return Dropdown::Closed;
        }

        if is_searchable(&self.query) {
            let query = self.query.trim().to_string();
            let has_results = !self.results.is_empty();
            let results = |query: String| Dropdown::Results {
                query,
                locations: self.results.clone(),
            };
            match self.phase {
                SearchPhase::Searching => return Dropdown::Searching { query },
                // Keep showing the previous answer until the new one lands
                SearchPhase::Debouncing if has_results => return results(query),
                SearchPhase::Debouncing => return Dropdown::Searching { query },
                SearchPhase::Displaying if has_results => return results(query),
                SearchPhase::Displaying => return Dropdown::NoResults { query },
                // Reopened after a selection: the list it was picked from
                SearchPhase::Idle if has_results => return results(query),
                SearchPhase::Idle => {}
            }
        }

        let recent = self.recent.list();
        if recent.is_empty() {
            Dropdown::EmptyPrompt
        } else {
            Dropdown::Recent(recent.iter().take(MAX_RECENT).cloned().collect())
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SearchPhase::Searching
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn recent(&self) -> &[Location] {
        self.recent.list()
    }
}
