// src/atmosphere/condition.rs

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    #[default]
    Clear,
    Cloudy,
    Rain,
    Snow,
    Fog,
}

impl ConditionKind {
    /// Maps a condition tag to a kind. Accepts the canonical tags as well as
    /// weather-provider labels (`Clouds`, `Drizzle`, `Mist`, ...), ignoring
    /// case. Anything unrecognized is `Clear`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "cloudy" | "clouds" | "overcast" => Self::Cloudy,
            "rain" | "drizzle" | "thunderstorm" | "squall" | "tornado" => Self::Rain,
            "snow" => Self::Snow,
            "fog" | "mist" | "haze" | "smoke" | "dust" | "sand" | "ash" => Self::Fog,
            _ => Self::Clear,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Fog => "fog",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weather to render. `intensity` is always within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherCondition {
    pub condition: ConditionKind,
    intensity: f64,
    pub is_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
}

impl WeatherCondition {
    pub fn new(condition: &str, intensity: f64, is_day: bool) -> Self {
        Self::from_kind(ConditionKind::from_tag(condition), intensity, is_day)
    }

    pub fn from_kind(condition: ConditionKind, intensity: f64, is_day: bool) -> Self {
        let intensity = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };
        Self {
            condition,
            intensity,
            is_day,
            temperature: None,
            humidity: None,
            wind_speed: None,
        }
    }

    pub fn with_readings(
        mut self,
        temperature: Option<f64>,
        humidity: Option<f64>,
        wind_speed: Option<f64>,
    ) -> Self {
        self.temperature = temperature;
        self.humidity = humidity;
        self.wind_speed = wind_speed;
        self
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }
}
