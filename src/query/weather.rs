// src/query/weather.rs

use serde::{Deserialize, Serialize};

use crate::atmosphere::{ConditionKind, WeatherCondition};
use crate::protocol::action::GetWeatherParams;
use crate::query::{QueryClient, QueryError, Response, WEATHER_PATH, push_opt};

/// Intensity applied when syncing the atmosphere to a live report, which
/// carries no intensity of its own.
pub const REPORT_INTENSITY: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherReport {
    pub city: Option<String>,
    pub condition: Option<String>,
    pub cesium_condition: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub is_day: Option<bool>,
    pub description: Option<String>,
}

impl WeatherReport {
    /// Renderable condition for this report. The backend's pre-mapped
    /// `cesium_condition` wins over the raw provider label.
    pub fn to_condition(&self) -> WeatherCondition {
        let kind = self
            .cesium_condition
            .as_deref()
            .or(self.condition.as_deref())
            .map(ConditionKind::from_tag)
            .unwrap_or_default();
        let intensity = match kind {
            ConditionKind::Clear => 0.0,
            _ => REPORT_INTENSITY,
        };

        WeatherCondition::from_kind(kind, intensity, self.is_day.unwrap_or(true)).with_readings(
            self.temperature,
            self.humidity,
            self.wind_speed,
        )
    }

    pub fn headline(&self) -> String {
        let place = self.city.as_deref().unwrap_or("current location");
        let label = self
            .description
            .as_deref()
            .or(self.condition.as_deref())
            .unwrap_or("unknown");
        match self.temperature {
            Some(temperature) => format!("{place}: {label}, {temperature:.1}°C"),
            None => format!("{place}: {label}"),
        }
    }
}

impl QueryClient {
    pub async fn current_weather(
        &self,
        params: &GetWeatherParams,
    ) -> Result<Response<WeatherReport>, QueryError> {
        let mut query = Vec::new();
        push_opt(&mut query, "city", params.city.as_ref());
        push_opt(&mut query, "latitude", params.point.map(|p| p.latitude));
        push_opt(&mut query, "longitude", params.point.map(|p| p.longitude));
        self.get(WEATHER_PATH, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cesium_condition_wins_over_provider_label() {
        let report: WeatherReport = serde_json::from_value(json!({
            "city": "上海",
            "condition": "Drizzle",
            "cesium_condition": "fog",
            "is_day": false
        }))
        .unwrap();

        let condition = report.to_condition();
        assert_eq!(condition.condition, ConditionKind::Fog);
        assert_eq!(condition.intensity(), REPORT_INTENSITY);
        assert!(!condition.is_day);
    }

    #[test]
    fn provider_label_is_mapped_when_alone() {
        let report = WeatherReport {
            condition: Some("Clouds".into()),
            temperature: Some(21.5),
            ..WeatherReport::default()
        };
        let condition = report.to_condition();
        assert_eq!(condition.condition, ConditionKind::Cloudy);
        assert_eq!(condition.temperature, Some(21.5));
        assert!(condition.is_day);
    }

    #[test]
    fn clear_report_has_no_intensity() {
        let report = WeatherReport {
            condition: Some("Clear".into()),
            ..WeatherReport::default()
        };
        assert_eq!(report.to_condition().intensity(), 0.0);
    }

    #[test]
    fn headline_uses_description_and_temperature() {
        let report = WeatherReport {
            city: Some("北京".into()),
            description: Some("小雨".into()),
            temperature: Some(12.0),
            ..WeatherReport::default()
        };
        assert_eq!(report.headline(), "北京: 小雨, 12.0°C");
    }
}
