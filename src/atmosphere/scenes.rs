// src/atmosphere/scenes.rs

use serde_json::json;

use crate::atmosphere::{ConditionKind, WeatherCondition};
use crate::geo::LocationResolver;
use crate::protocol::ActionDescriptor;

/// A named weather preset the assistant can refer to instead of raw values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherScene {
    pub name: &'static str,
    pub condition: ConditionKind,
    pub intensity: f64,
    pub is_day: bool,
    pub description: &'static str,
}

impl WeatherScene {
    pub fn to_condition(&self) -> WeatherCondition {
        WeatherCondition::from_kind(self.condition, self.intensity, self.is_day)
    }
}

const SCENES: &[WeatherScene] = &[
    WeatherScene {
        name: "雨天",
        condition: ConditionKind::Rain,
        intensity: 0.7,
        is_day: false,
        description: "雨夜场景",
    },
    WeatherScene {
        name: "雪天",
        condition: ConditionKind::Snow,
        intensity: 0.5,
        is_day: true,
        description: "雪天场景",
    },
    WeatherScene {
        name: "雾天",
        condition: ConditionKind::Fog,
        intensity: 0.8,
        is_day: false,
        description: "雾夜场景",
    },
    WeatherScene {
        name: "晴天",
        condition: ConditionKind::Clear,
        intensity: 0.0,
        is_day: true,
        description: "晴天场景",
    },
    WeatherScene {
        name: "雷雨",
        condition: ConditionKind::Rain,
        intensity: 1.0,
        is_day: false,
        description: "雷雨夜场景",
    },
];

pub fn weather_scene(name: &str) -> Option<&'static WeatherScene> {
    SCENES.iter().find(|scene| scene.name == name.trim())
}

/// Builds the "fly there, then show the live weather" batch for a city.
pub fn weather_scene_actions(
    city: &str,
    resolver: &LocationResolver,
) -> Option<Vec<ActionDescriptor>> {
    let place = resolver.resolve(city)?;

    Some(vec![
        ActionDescriptor::new("camera_flyTo")
            .param("longitude", json!(place.point.longitude))
            .param("latitude", json!(place.point.latitude))
            .param("height", json!(5000))
            .param("duration", json!(3.0))
            .param("pitch", json!(-30))
            .wait_for_completion()
            .describe(&format!("飞往{}", place.name)),
        ActionDescriptor::new("get_weather")
            .param("city", json!(place.name))
            .param("latitude", json!(place.point.latitude))
            .param("longitude", json!(place.point.longitude))
            .delay_ms(1000)
            .describe(&format!("获取{}天气并应用效果", place.name)),
    ])
}
