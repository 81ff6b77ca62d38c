//! Event loop tying search, fetch and persistence together.
//!
//! Timers and network calls run as spawned tasks and report back over an
//! unbounded channel. Only [`Controller::handle`] mutates state, so every
//! completion is applied at a single well-defined point.

use std::sync::Arc;
use std::time::Duration;

use skycast_weather::{Location, PlaceSearch, WeatherError, WeatherSnapshot, WeatherSource};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::recent::RecentLocationsStore;
use crate::search::{ApplyOutcome, Dropdown, SearchCoordinator};
use crate::session::{FetchOutcome, WeatherSession};
use crate::storage::KeyValueStore;
use crate::view::Screen;

/// Completions sent from spawned tasks back to the controller
#[derive(Debug)]
pub enum ControllerMessage {
    DebounceElapsed {
        generation: u64,
    },
    SearchDone {
        generation: u64,
        results: Vec<Location>,
    },
    FetchDone {
        generation: u64,
        result: Result<WeatherSnapshot, WeatherError>,
    },
}

/// Which part of the display needs redrawing after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Changed {
    Nothing,
    Dropdown,
    Weather,
}

pub struct Controller<S: KeyValueStore> {
    search: SearchCoordinator<S>,
    session: WeatherSession,
    places: Arc<dyn PlaceSearch>,
    weather: Arc<dyn WeatherSource>,
    debounce: Duration,
    tx: UnboundedSender<ControllerMessage>,
    rx: UnboundedReceiver<ControllerMessage>,
    debounce_task: Option<JoinHandle<()>>,
    search_task: Option<JoinHandle<()>>,
    fetch_task: Option<JoinHandle<()>>,
}

impl<S: KeyValueStore> Controller<S> {
    pub fn new(
        recent: RecentLocationsStore<S>,
        places: Arc<dyn PlaceSearch>,
        weather: Arc<dyn WeatherSource>,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            search: SearchCoordinator::new(recent),
            session: WeatherSession::new(),
            places,
            weather,
            debounce,
            tx,
            rx,
            debounce_task: None,
            search_task: None,
            fetch_task: None,
        }
    }

    /// The search box text changed. Cancels any pending debounce timer and
    /// in-flight search, then starts a new timer if the query is long enough.
    pub fn set_query(&mut self, text: &str) -> Changed {
        abort(&mut self.debounce_task);
        abort(&mut self.search_task);

        if let Some(request) = self.search.set_query(text) {
            let tx = self.tx.clone();
            let delay = self.debounce;
            self.debounce_task = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(ControllerMessage::DebounceElapsed {
                    generation: request.generation,
                });
            }));
        }
        Changed::Dropdown
    }

    /// Pick the `index`-th entry of the dropdown as currently shown.
    pub fn select(&mut self, index: usize) -> Option<Location> {
        let location = self.search.view().entries().get(index).cloned()?;
        self.select_location(location.clone());
        Some(location)
    }

    /// Show `location` in the search box and fetch its weather.
    ///
    /// Any fetch still in flight is abandoned; the location is remembered
    /// only once its weather arrives.
    pub fn select_location(&mut self, location: Location) {
        abort(&mut self.debounce_task);
        abort(&mut self.search_task);
        self.search.select(&location);
        self.start_fetch(location);
    }

    /// Re-fetch the last location whose weather was shown. Returns `false`,
    /// doing nothing, when no location has ever been set.
    pub fn retry(&mut self) -> bool {
        match self.session.retry_target().cloned() {
            Some(location) => {
                tracing::info!("Retrying weather for {}", location.label());
                self.start_fetch(location);
                true
            }
            None => false,
        }
    }

    pub fn focus(&mut self) -> Changed {
        self.search.open();
        Changed::Dropdown
    }

    pub fn blur(&mut self) -> Changed {
        self.search.close();
        Changed::Dropdown
    }

    fn start_fetch(&mut self, location: Location) {
        abort(&mut self.fetch_task);

        let (latitude, longitude) = (location.latitude, location.longitude);
        let generation = self.session.begin_fetch(location);
        let weather = Arc::clone(&self.weather);
        let tx = self.tx.clone();

        self.fetch_task = Some(tokio::spawn(async move {
            let result = weather.fetch_current(latitude, longitude).await;
            let _ = tx.send(ControllerMessage::FetchDone { generation, result });
        }));
    }

    fn start_search(&mut self, generation: u64, query: String) {
        abort(&mut self.search_task);

        let places = Arc::clone(&self.places);
        let tx = self.tx.clone();
        self.search_task = Some(tokio::spawn(async move {
            let results = places.search(&query).await;
            let _ = tx.send(ControllerMessage::SearchDone {
                generation,
                results,
            });
        }));
    }

    /// Wait for the next completion from a spawned task.
    pub async fn next_message(&mut self) -> Option<ControllerMessage> {
        self.rx.recv().await
    }

    /// Apply one completion.
    pub fn handle(&mut self, message: ControllerMessage) -> Changed {
        match message {
            ControllerMessage::DebounceElapsed { generation } => {
                match self.search.debounce_elapsed(generation) {
                    Some(query) => {
                        tracing::debug!("Searching for '{}'", query);
                        self.start_search(generation, query);
                        Changed::Dropdown
                    }
                    None => Changed::Nothing,
                }
            }
            ControllerMessage::SearchDone {
                generation,
                results,
            } => match self.search.apply_results(generation, results) {
                ApplyOutcome::Applied => Changed::Dropdown,
                ApplyOutcome::Stale => Changed::Nothing,
            },
            ControllerMessage::FetchDone { generation, result } => {
                match self.session.complete_fetch(generation, result) {
                    FetchOutcome::Applied => {
                        if let Some(location) = self.session.location().cloned() {
                            self.search.record_selection(location);
                        }
                        Changed::Weather
                    }
                    FetchOutcome::Failed => Changed::Weather,
                    FetchOutcome::Stale => Changed::Nothing,
                }
            }
        }
    }

    fn has_pending_work(&self) -> bool {
        [&self.debounce_task, &self.search_task, &self.fetch_task]
            .into_iter()
            .flatten()
            .any(|task| !task.is_finished())
    }

    /// Handle messages until no timer or request is outstanding.
    pub async fn run_until_idle(&mut self) {
        loop {
            while let Ok(message) = self.rx.try_recv() {
                self.handle(message);
            }

            if !self.has_pending_work() {
                // A task may have sent its message just before finishing
                match self.rx.try_recv() {
                    Ok(message) => {
                        self.handle(message);
                        continue;
                    }
                    Err(_) => break,
                }
            }

            if let Some(message) = self.rx.recv().await {
                self.handle(message);
            }
        }
    }

    pub fn dropdown(&self) -> Dropdown {
        self.search.view()
    }

    pub fn screen(&self) -> Screen {
        Screen::from_session(&self.session)
    }

    pub fn session(&self) -> &WeatherSession {
        &self.session
    }

    pub fn search(&self) -> &SearchCoordinator<S> {
        &self.search
    }
}

impl<S: KeyValueStore> Drop for Controller<S> {
    fn drop(&mut self) {
        abort(&mut self.debounce_task);
        abort(&mut self.search_task);
        abort(&mut self.fetch_task);
    }
}

fn abort(task: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = task.take() {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchPhase;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use skycast_core::NetworkError;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn loc(id: i64, name: &str, latitude: f64) -> Location {
        Location {
            id,
            name: name.to_string(),
            country: "UK".to_string(),
            region: None,
            latitude,
            longitude: 0.0,
        }
    }

    /// Prefix-matching place search over a fixed catalogue.
    struct FakePlaces {
        catalogue: Vec<Location>,
        delay: Duration,
        calls: Mutex<Vec<String>>,
    }

    impl FakePlaces {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                catalogue: vec![
                    loc(1, "London", 51.5),
                    loc(2, "Londonderry", 55.0),
                    loc(3, "Leeds", 53.8),
                    loc(4, "Springfield", 39.8),
                ],
                delay,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl PlaceSearch for FakePlaces {
        async fn search(&self, query: &str) -> Vec<Location> {
            self.calls.lock().push(query.to_string());
            tokio::time::sleep(self.delay).await;
            let needle = query.to_lowercase();
            self.catalogue
                .iter()
                .filter(|l| l.name.to_lowercase().starts_with(&needle))
                .cloned()
                .collect()
        }
    }

    /// Weather source with per-latitude delays and a failure switch.
    struct FakeWeather {
        delays: Vec<(f64, Duration)>,
        failing: Mutex<bool>,
        calls: Mutex<Vec<f64>>,
    }

    impl FakeWeather {
        fn new() -> Arc<Self> {
            Self::with_delays(Vec::new())
        }

        fn with_delays(delays: Vec<(f64, Duration)>) -> Arc<Self> {
            Arc::new(Self {
                delays,
                failing: Mutex::new(false),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn set_failing(&self, failing: bool) {
            *self.failing.lock() = failing;
        }

        fn calls(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl WeatherSource for FakeWeather {
        async fn fetch_current(
            &self,
            latitude: f64,
            _longitude: f64,
        ) -> Result<WeatherSnapshot, WeatherError> {
            self.calls.lock().push(latitude);
            let delay = self
                .delays
                .iter()
                .find(|(lat, _)| *lat == latitude)
                .map(|(_, d)| *d)
                .unwrap_or(Duration::from_millis(10));
            tokio::time::sleep(delay).await;

            if *self.failing.lock() {
                return Err(WeatherError::Network(NetworkError::Timeout));
            }
            Ok(WeatherSnapshot {
                temperature_c: latitude / 3.0,
                apparent_temperature_c: 15.0,
                relative_humidity_pct: 70.0,
                weather_code: 61,
                wind_speed_kmh: 12.0,
                wind_direction_deg: 90.0,
                fetched_at: Utc::now(),
            })
        }
    }

    fn controller(
        places: &Arc<FakePlaces>,
        weather: &Arc<FakeWeather>,
        store: MemoryStore,
    ) -> Controller<MemoryStore> {
        Controller::new(
            RecentLocationsStore::load(store),
            places.clone(),
            weather.clone(),
            DEBOUNCE,
        )
    }

    fn entry_ids(c: &Controller<MemoryStore>) -> Vec<i64> {
        c.dropdown().entries().iter().map(|l| l.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_issues_one_search() {
        let places = FakePlaces::new(Duration::from_millis(50));
        let weather = FakeWeather::new();
        let mut c = controller(&places, &weather, MemoryStore::new());

        for text in ["L", "Lo", "Lon", "Lond"] {
            c.set_query(text);
        }
        c.run_until_idle().await;

        assert_eq!(places.calls(), vec!["Lond"]);
        assert_eq!(entry_ids(&c), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_shorter_than_debounce_does_not_search() {
        let places = FakePlaces::new(Duration::from_millis(50));
        let weather = FakeWeather::new();
        let mut c = controller(&places, &weather, MemoryStore::new());

        c.set_query("Le");
        tokio::time::sleep(Duration::from_millis(200)).await;
        c.set_query("Lee");
        c.run_until_idle().await;

        assert_eq!(places.calls(), vec!["Lee"]);
        assert_eq!(entry_ids(&c), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_waits_for_debounce() {
        let places = FakePlaces::new(Duration::ZERO);
        let weather = FakeWeather::new();
        let mut c = controller(&places, &weather, MemoryStore::new());

        c.set_query("Lond");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(places.calls().is_empty());

        let message = c.next_message().await.unwrap();
        assert!(matches!(message, ControllerMessage::DebounceElapsed { .. }));
        assert_eq!(c.handle(message), Changed::Dropdown);
        assert_eq!(c.search().phase(), SearchPhase::Searching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystroke_cancels_in_flight_search() {
        let places = FakePlaces::new(Duration::from_millis(500));
        let weather = FakeWeather::new();
        let mut c = controller(&places, &weather, MemoryStore::new());

        c.set_query("Spring");
        let message = c.next_message().await.unwrap();
        c.handle(message);
        let stale_generation = c.search().generation();
        // Let the search task start its request
        tokio::time::sleep(Duration::from_millis(10)).await;

        c.set_query("Springf");
        c.run_until_idle().await;

        assert_eq!(places.calls(), vec!["Spring", "Springf"]);
        assert_eq!(entry_ids(&c), vec![4]);

        // A late response for the older query changes nothing
        let changed = c.handle(ControllerMessage::SearchDone {
            generation: stale_generation,
            results: vec![loc(9, "Spring Hill", 1.0)],
        });
        assert_eq!(changed, Changed::Nothing);
        assert_eq!(entry_ids(&c), vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_shows_recents_without_searching() {
        let places = FakePlaces::new(Duration::ZERO);
        let weather = FakeWeather::new();
        let store = MemoryStore::new();
        {
            let mut recent = RecentLocationsStore::load(store.clone());
            recent.record(loc(3, "Leeds", 53.8));
        }
        let mut c = controller(&places, &weather, store);

        c.set_query("L");
        c.run_until_idle().await;

        assert!(places.calls().is_empty());
        assert_eq!(c.dropdown(), Dropdown::Recent(vec![loc(3, "Leeds", 53.8)]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_fetches_and_records_on_success() {
        let places = FakePlaces::new(Duration::ZERO);
        let weather = FakeWeather::new();
        let store = MemoryStore::new();
        let mut c = controller(&places, &weather, store.clone());

        c.set_query("Lond");
        c.run_until_idle().await;

        let picked = c.select(0).unwrap();
        assert_eq!(picked.id, 1);
        assert_eq!(c.dropdown(), Dropdown::Closed);
        assert_eq!(c.search().query(), "London, UK");
        assert_eq!(c.screen(), Screen::Loading);
        assert!(c.search().recent().is_empty());

        c.run_until_idle().await;

        match c.screen() {
            Screen::Weather(view) => {
                assert_eq!(view.place, "London");
                assert_eq!(view.description, "Slight rain");
            }
            other => panic!("expected weather, got {:?}", other),
        }
        assert_eq!(c.search().recent()[0].id, 1);
        assert_eq!(RecentLocationsStore::load(store).list()[0].id, 1);
        // The label placed in the box is not searched for
        assert_eq!(places.calls(), vec!["Lond"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_shows_error_and_skips_recents() {
        let places = FakePlaces::new(Duration::ZERO);
        let weather = FakeWeather::new();
        let mut c = controller(&places, &weather, MemoryStore::new());

        c.select_location(loc(1, "London", 51.5));
        c.run_until_idle().await;

        weather.set_failing(true);
        c.select_location(loc(3, "Leeds", 53.8));
        c.run_until_idle().await;

        assert_eq!(
            c.screen(),
            Screen::Error {
                message: "Failed to fetch weather data. Please try again."
            }
        );
        assert_eq!(
            c.search().recent().iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![1]
        );

        // Retry goes back to the last location that loaded
        weather.set_failing(false);
        assert!(c.retry());
        c.run_until_idle().await;

        assert!(matches!(c.screen(), Screen::Weather(_)));
        assert_eq!(c.session().location().map(|l| l.id), Some(1));
        assert_eq!(*weather.calls.lock(), vec![51.5, 53.8, 51.5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_failed_first_fetch_does_nothing() {
        let places = FakePlaces::new(Duration::ZERO);
        let weather = FakeWeather::new();
        weather.set_failing(true);
        let mut c = controller(&places, &weather, MemoryStore::new());

        c.select_location(loc(3, "Leeds", 53.8));
        c.run_until_idle().await;
        assert!(matches!(c.screen(), Screen::Error { .. }));

        weather.set_failing(false);
        assert!(!c.retry());
        c.run_until_idle().await;

        assert_eq!(weather.calls(), 1);
        assert!(matches!(c.screen(), Screen::Error { .. }));
        assert!(c.search().recent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_without_location_does_nothing() {
        let places = FakePlaces::new(Duration::ZERO);
        let weather = FakeWeather::new();
        let mut c = controller(&places, &weather, MemoryStore::new());

        assert!(!c.retry());
        c.run_until_idle().await;

        assert_eq!(weather.calls(), 0);
        assert_eq!(c.screen(), Screen::Welcome);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_selection_wins_over_slow_fetch() {
        let places = FakePlaces::new(Duration::ZERO);
        let weather = FakeWeather::with_delays(vec![
            (51.5, Duration::from_secs(2)),
            (53.8, Duration::from_millis(10)),
        ]);
        let mut c = controller(&places, &weather, MemoryStore::new());

        c.select_location(loc(1, "London", 51.5));
        let stale_generation = 1;
        tokio::time::sleep(Duration::from_millis(5)).await;
        c.select_location(loc(3, "Leeds", 53.8));
        c.run_until_idle().await;

        assert_eq!(c.session().location().map(|l| l.id), Some(3));
        assert_eq!(
            c.search().recent().iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![3]
        );

        let changed = c.handle(ControllerMessage::FetchDone {
            generation: stale_generation,
            result: Err(WeatherError::Network(NetworkError::Timeout)),
        });
        assert_eq!(changed, Changed::Nothing);
        assert!(matches!(c.screen(), Screen::Weather(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_and_blur() {
        let places = FakePlaces::new(Duration::ZERO);
        let weather = FakeWeather::new();
        let mut c = controller(&places, &weather, MemoryStore::new());

        c.focus();
        assert_eq!(c.dropdown(), Dropdown::EmptyPrompt);
        c.blur();
        assert_eq!(c.dropdown(), Dropdown::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_pending_work() {
        let places = FakePlaces::new(Duration::ZERO);
        let weather = FakeWeather::new();
        let mut c = controller(&places, &weather, MemoryStore::new());

        c.set_query("Lond");
        drop(c);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(places.calls().is_empty());
    }
}
