//! Presentation state derived from the session: what the main area shows and
//! how a weather card is formatted.

use chrono::Local;
use skycast_weather::{IconCategory, Location, WeatherSnapshot};

use crate::session::WeatherSession;

/// Ambient background chosen from the condition and temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// No weather loaded yet
    Neutral,
    Stormy,
    Snowy,
    Rainy,
    Foggy,
    CloudyCold,
    CloudyMild,
    ClearFreezing,
    ClearCool,
    ClearPleasant,
    ClearWarm,
    ClearHot,
    /// Unrecognised code: temperature only
    Freezing,
    Cold,
    Mild,
    Warm,
    Hot,
}

impl Theme {
    /// Category decides first; temperature bands refine cloudy, clear and
    /// unknown conditions. Band edges are inclusive upper bounds.
    pub fn select(category: IconCategory, temperature_c: f64) -> Self {
        match category {
            IconCategory::Thunderstorm => Theme::Stormy,
            IconCategory::Snow => Theme::Snowy,
            IconCategory::Drizzle | IconCategory::Rain => Theme::Rainy,
            IconCategory::Fog => Theme::Foggy,
            IconCategory::Cloudy if temperature_c <= 10.0 => Theme::CloudyCold,
            IconCategory::Cloudy => Theme::CloudyMild,
            IconCategory::Clear => match temperature_c {
                t if t <= 0.0 => Theme::ClearFreezing,
                t if t <= 10.0 => Theme::ClearCool,
                t if t <= 20.0 => Theme::ClearPleasant,
                t if t <= 30.0 => Theme::ClearWarm,
                _ => Theme::ClearHot,
            },
            IconCategory::GenericCloud => match temperature_c {
                t if t <= 0.0 => Theme::Freezing,
                t if t <= 10.0 => Theme::Cold,
                t if t <= 20.0 => Theme::Mild,
                t if t <= 30.0 => Theme::Warm,
                _ => Theme::Hot,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Neutral => "neutral",
            Theme::Stormy => "stormy",
            Theme::Snowy => "snowy",
            Theme::Rainy => "rainy",
            Theme::Foggy => "foggy",
            Theme::CloudyCold => "cloudy-cold",
            Theme::CloudyMild => "cloudy-mild",
            Theme::ClearFreezing => "clear-freezing",
            Theme::ClearCool => "clear-cool",
            Theme::ClearPleasant => "clear-pleasant",
            Theme::ClearWarm => "clear-warm",
            Theme::ClearHot => "clear-hot",
            Theme::Freezing => "freezing",
            Theme::Cold => "cold",
            Theme::Mild => "mild",
            Theme::Warm => "warm",
            Theme::Hot => "hot",
        }
    }
}

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass name for a bearing in degrees. Any finite value is
/// accepted and wrapped.
pub fn compass_point(degrees: f64) -> &'static str {
    let normalized = degrees.rem_euclid(360.0);
    let index = (normalized / 22.5).round() as usize % COMPASS.len();
    COMPASS[index]
}

fn celsius(value: f64) -> String {
    format!("{}°C", value.round() as i64)
}

/// A weather card, fully formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub place: String,
    pub area: String,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub description: &'static str,
    pub category: IconCategory,
    pub icon: &'static str,
    pub theme: Theme,
    /// Local wall-clock time the snapshot was fetched
    pub last_updated: String,
}

impl WeatherView {
    pub fn new(location: &Location, snapshot: &WeatherSnapshot) -> Self {
        let condition = snapshot.condition();

        Self {
            place: location.name.clone(),
            area: location.area(),
            temperature: celsius(snapshot.temperature_c),
            feels_like: celsius(snapshot.apparent_temperature_c),
            humidity: format!("{}%", snapshot.relative_humidity_pct.round() as i64),
            wind: format!(
                "{} km/h {}",
                snapshot.wind_speed_kmh.round() as i64,
                compass_point(snapshot.wind_direction_deg)
            ),
            description: condition.description,
            category: condition.category,
            icon: condition.category.icon_name(),
            theme: Theme::select(condition.category, snapshot.temperature_c),
            last_updated: snapshot
                .fetched_at
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string(),
        }
    }
}

/// What the main area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Loading,
    Error { message: &'static str },
    Weather(WeatherView),
    Welcome,
}

impl Screen {
    /// Loading wins over an error, an error over stale weather, and weather
    /// over the welcome screen.
    pub fn from_session(session: &WeatherSession) -> Self {
        if session.is_loading() {
            return Screen::Loading;
        }
        if let Some(message) = session.error() {
            return Screen::Error { message };
        }
        match (session.location(), session.snapshot()) {
            (Some(location), Some(snapshot)) => {
                Screen::Weather(WeatherView::new(location, snapshot))
            }
            _ => Screen::Welcome,
        }
    }

    pub fn theme(&self) -> Theme {
        match self {
            Screen::Weather(view) => view.theme,
            _ => Theme::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use skycast_core::NetworkError;
    use skycast_weather::WeatherError;

    fn london() -> Location {
        Location {
            id: 2643743,
            name: "London".into(),
            country: "United Kingdom".into(),
            region: Some("England".into()),
            latitude: 51.5,
            longitude: -0.12,
        }
    }

    fn snapshot(temp: f64, code: i32) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature_c: temp,
            apparent_temperature_c: 16.6,
            relative_humidity_pct: 71.6,
            weather_code: code,
            wind_speed_kmh: 14.5,
            wind_direction_deg: 250.0,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_weather_view_formatting() {
        let view = WeatherView::new(&london(), &snapshot(18.4, 61));

        assert_eq!(view.place, "London");
        assert_eq!(view.area, "England, United Kingdom");
        assert_eq!(view.temperature, "18°C");
        assert_eq!(view.feels_like, "17°C");
        assert_eq!(view.humidity, "72%");
        assert_eq!(view.wind, "15 km/h WSW");
        assert_eq!(view.description, "Slight rain");
        assert_eq!(view.category, IconCategory::Rain);
        assert_eq!(view.icon, "cloud_rain");
        assert_eq!(view.theme, Theme::Rainy);
        assert_eq!(view.last_updated.len(), 8);
    }

    #[test]
    fn test_negative_temperature_rounds() {
        let view = WeatherView::new(&london(), &snapshot(-3.6, 71));
        assert_eq!(view.temperature, "-4°C");
    }

    #[test]
    fn test_compass_points() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(11.0), "N");
        assert_eq!(compass_point(12.0), "NNE");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(180.0), "S");
        assert_eq!(compass_point(270.0), "W");
        assert_eq!(compass_point(350.0), "N");
        assert_eq!(compass_point(360.0), "N");
        assert_eq!(compass_point(-90.0), "W");
    }

    #[test]
    fn test_theme_category_takes_precedence() {
        assert_eq!(Theme::select(IconCategory::Thunderstorm, 35.0), Theme::Stormy);
        assert_eq!(Theme::select(IconCategory::Snow, 35.0), Theme::Snowy);
        assert_eq!(Theme::select(IconCategory::Drizzle, 5.0), Theme::Rainy);
        assert_eq!(Theme::select(IconCategory::Fog, -5.0), Theme::Foggy);
    }

    #[test]
    fn test_theme_temperature_bands() {
        assert_eq!(Theme::select(IconCategory::Cloudy, 10.0), Theme::CloudyCold);
        assert_eq!(Theme::select(IconCategory::Cloudy, 10.1), Theme::CloudyMild);

        assert_eq!(Theme::select(IconCategory::Clear, 0.0), Theme::ClearFreezing);
        assert_eq!(Theme::select(IconCategory::Clear, 5.0), Theme::ClearCool);
        assert_eq!(Theme::select(IconCategory::Clear, 20.0), Theme::ClearPleasant);
        assert_eq!(Theme::select(IconCategory::Clear, 30.0), Theme::ClearWarm);
        assert_eq!(Theme::select(IconCategory::Clear, 30.5), Theme::ClearHot);

        assert_eq!(Theme::select(IconCategory::GenericCloud, -1.0), Theme::Freezing);
        assert_eq!(Theme::select(IconCategory::GenericCloud, 25.0), Theme::Warm);
        assert_eq!(Theme::select(IconCategory::GenericCloud, 40.0), Theme::Hot);
    }

    #[test]
    fn test_screen_precedence() {
        let mut session = WeatherSession::new();
        assert_eq!(Screen::from_session(&session), Screen::Welcome);
        assert_eq!(Screen::from_session(&session).theme(), Theme::Neutral);

        let g = session.begin_fetch(london());
        assert_eq!(Screen::from_session(&session), Screen::Loading);

        session.complete_fetch(g, Ok(snapshot(25.0, 0)));
        let screen = Screen::from_session(&session);
        assert!(matches!(screen, Screen::Weather(_)));
        assert_eq!(screen.theme(), Theme::ClearWarm);

        let g = session.begin_fetch(london());
        session.complete_fetch(g, Err(WeatherError::Network(NetworkError::Timeout)));
        // Error wins over the still-stored snapshot
        assert_eq!(
            Screen::from_session(&session),
            Screen::Error {
                message: "Failed to fetch weather data. Please try again."
            }
        );
    }
}
