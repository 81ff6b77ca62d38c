use serde::{Deserialize, Serialize};

/// Broad weather category derived from a WMO code.
///
/// Callers branch on this (icons, ambient themes) rather than on raw codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Clear,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    /// Codes outside the known table
    GenericCloud,
}

impl IconCategory {
    /// Icon name for the presentation layer
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::Cloudy | Self::Fog | Self::GenericCloud => "cloud",
            Self::Drizzle => "cloud_drizzle",
            Self::Rain => "cloud_rain",
            Self::Snow => "cloud_snow",
            Self::Thunderstorm => "zap",
        }
    }
}

/// Human description plus category for a weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub description: &'static str,
    pub category: IconCategory,
}

impl Condition {
    const fn new(description: &'static str, category: IconCategory) -> Self {
        Self {
            description,
            category,
        }
    }

    pub const UNKNOWN: Condition = Condition::new("Unknown", IconCategory::GenericCloud);
}

/// Describe a WMO weather code.
///
/// Total over `i32`: anything outside the table is [`Condition::UNKNOWN`].
/// See: https://open-meteo.com/en/docs#weathervariables
pub fn describe(code: i32) -> Condition {
    use IconCategory::*;

    match code {
        0 => Condition::new("Clear sky", Clear),
        1 => Condition::new("Mainly clear", Clear),
        2 => Condition::new("Partly cloudy", Cloudy),
        3 => Condition::new("Overcast", Cloudy),
        45 => Condition::new("Foggy", Fog),
        48 => Condition::new("Depositing rime fog", Fog),
        51 => Condition::new("Light drizzle", Drizzle),
        53 => Condition::new("Moderate drizzle", Drizzle),
        55 => Condition::new("Dense drizzle", Drizzle),
        61 => Condition::new("Slight rain", Rain),
        63 => Condition::new("Moderate rain", Rain),
        65 => Condition::new("Heavy rain", Rain),
        71 => Condition::new("Slight snow fall", Snow),
        73 => Condition::new("Moderate snow fall", Snow),
        75 => Condition::new("Heavy snow fall", Snow),
        80 => Condition::new("Slight rain showers", Rain),
        81 => Condition::new("Moderate rain showers", Rain),
        82 => Condition::new("Violent rain showers", Rain),
        95 => Condition::new("Thunderstorm", Thunderstorm),
        96 => Condition::new("Thunderstorm with hail", Thunderstorm),
        99 => Condition::new("Thunderstorm with heavy hail", Thunderstorm),
        _ => Condition::UNKNOWN,
    }
}
