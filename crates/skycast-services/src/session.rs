use skycast_weather::{Location, WeatherError, WeatherSnapshot, WeatherSource, FETCH_ERROR_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// New snapshot is now displayed
    Applied,
    /// Fetch failed; the error message is set and the old snapshot kept
    Failed,
    /// Superseded by a later fetch; ignored
    Stale,
}

/// The weather currently on screen, plus loading and error state.
///
/// Location and snapshot are stored together so one can never be shown
/// without the other.
#[derive(Debug, Default)]
pub struct WeatherSession {
    current: Option<(Location, WeatherSnapshot)>,
    loading: bool,
    error: Option<&'static str>,
    /// Target of the fetch in flight; not a retry target until applied
    pending: Option<Location>,
    generation: u64,
}

impl WeatherSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a fetch for `location` as started and return its generation.
    ///
    /// Starting a new fetch supersedes any that is still outstanding.
    pub fn begin_fetch(&mut self, location: Location) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        tracing::info!("Fetching weather for {}", location.label());
        self.pending = Some(location);
        self.generation
    }

    /// Apply the result of the fetch started as `generation`.
    pub fn complete_fetch(
        &mut self,
        generation: u64,
        result: Result<WeatherSnapshot, WeatherError>,
    ) -> FetchOutcome {
        if generation != self.generation {
            tracing::debug!(
                "Ignoring superseded weather result (generation {}, current {})",
                generation,
                self.generation
            );
            return FetchOutcome::Stale;
        }

        self.loading = false;
        match (result, self.pending.clone()) {
            (Ok(snapshot), Some(location)) => {
                tracing::info!(
                    "Weather for {}: {}°C, {}",
                    location.label(),
                    snapshot.temperature_c,
                    snapshot.condition().description
                );
                self.current = Some((location, snapshot));
                FetchOutcome::Applied
            }
            (Ok(_), None) => FetchOutcome::Stale,
            (Err(e), _) => {
                tracing::error!("Weather fetch error: {}", e);
                self.error = Some(FETCH_ERROR_MESSAGE);
                FetchOutcome::Failed
            }
        }
    }

    /// Fetch and apply in one step.
    pub async fn fetch(&mut self, source: &dyn WeatherSource, location: Location) -> FetchOutcome {
        let (latitude, longitude) = (location.latitude, location.longitude);
        let generation = self.begin_fetch(location);
        let result = source.fetch_current(latitude, longitude).await;
        self.complete_fetch(generation, result)
    }

    /// The location a retry would fetch: the last one whose weather was
    /// displayed. A failed fetch never changes it.
    pub fn retry_target(&self) -> Option<&Location> {
        self.location()
    }

    /// Re-fetch the last known location. `None` when no location has ever
    /// been set; no request is made and no state changes in that case.
    pub async fn retry(&mut self, source: &dyn WeatherSource) -> Option<FetchOutcome> {
        let location = self.retry_target()?.clone();
        Some(self.fetch(source, location).await)
    }

    pub fn location(&self) -> Option<&Location> {
        self.current.as_ref().map(|(l, _)| l)
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.current.as_ref().map(|(_, s)| s)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }
}
