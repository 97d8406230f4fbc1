// src/atmosphere/mod.rs

//! Maps weather conditions onto viewport fog, sky and light parameters.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::viewport::{AtmosphereParams, LightParams, Viewport, ViewportError};

pub mod condition;
pub mod scenes;

pub use condition::{ConditionKind, WeatherCondition};
pub use scenes::{WeatherScene, weather_scene, weather_scene_actions};

pub const BASE_FOG_DENSITY: f64 = 2.0e-4;
pub const RAIN_FOG_FACTOR: f64 = 6.0e-4;
pub const SNOW_FOG_FACTOR: f64 = 9.0e-4;
pub const FOG_FOG_FACTOR: f64 = 2.5e-3;
const BASE_FOG_MIN_BRIGHTNESS: f64 = 0.03;

const DAY_LIGHT: LightParams = LightParams {
    direction: [0.0, 0.0, -1.0],
    intensity: 2.0,
    global_lighting: true,
};

const NIGHT_LIGHT: LightParams = LightParams {
    direction: [0.8, 0.0, -0.3],
    intensity: 0.3,
    global_lighting: true,
};

impl AtmosphereParams {
    pub const BASELINE: AtmosphereParams = AtmosphereParams {
        fog_density: BASE_FOG_DENSITY,
        fog_minimum_brightness: BASE_FOG_MIN_BRIGHTNESS,
        sky_hue_shift: 0.0,
        sky_saturation_shift: 0.0,
        sky_brightness_shift: 0.0,
    };
}

/// What the controller pushed to the viewport for one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAtmosphere {
    pub condition: ConditionKind,
    pub intensity: f64,
    pub is_day: bool,
    pub atmosphere: AtmosphereParams,
    pub light: LightParams,
}

/// Computes the fog/sky parameters for a condition. Fog density grows
/// monotonically with intensity for the precipitation and fog kinds.
pub fn atmosphere_for(weather: &WeatherCondition) -> AtmosphereParams {
    let intensity = weather.intensity();
    let mut params = AtmosphereParams::BASELINE;

    match weather.condition {
        ConditionKind::Rain => {
            params.fog_density = BASE_FOG_DENSITY + intensity * RAIN_FOG_FACTOR;
            params.sky_brightness_shift = -0.3 * intensity;
        }
        ConditionKind::Snow => {
            params.fog_density = BASE_FOG_DENSITY + intensity * SNOW_FOG_FACTOR;
            params.sky_saturation_shift = -0.1 * intensity;
            params.sky_brightness_shift = -0.2 * intensity;
        }
        ConditionKind::Fog => {
            params.fog_density = BASE_FOG_DENSITY + intensity * FOG_FOG_FACTOR;
        }
        ConditionKind::Cloudy => {
            params.sky_saturation_shift = -0.2;
            params.sky_brightness_shift = -0.1;
        }
        ConditionKind::Clear => {}
    }

    params
}

pub fn light_for(is_day: bool) -> LightParams {
    if is_day { DAY_LIGHT } else { NIGHT_LIGHT }
}

/// Owns the "currently applied weather" for one viewport.
///
/// Every [`apply`](Self::apply) first reverts the previous effect, so
/// repeated applications never accumulate.
pub struct AtmosphereController {
    viewport: Arc<dyn Viewport>,
    current: Option<ConditionKind>,
    last_applied: Option<AppliedAtmosphere>,
}

impl AtmosphereController {
    pub fn new(viewport: Arc<dyn Viewport>) -> Self {
        Self {
            viewport,
            current: None,
            last_applied: None,
        }
    }

    pub fn current(&self) -> Option<ConditionKind> {
        self.current
    }

    pub fn last_applied(&self) -> Option<&AppliedAtmosphere> {
        self.last_applied.as_ref()
    }

    /// Resets fog and sky to the baseline and forgets the tracked condition.
    pub async fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            debug!("clearing previous weather effect: {}", previous);
        }
        self.last_applied = None;
        self.push_atmosphere(AtmosphereParams::BASELINE).await;
    }

    pub async fn apply(&mut self, weather: &WeatherCondition) -> AppliedAtmosphere {
        self.clear().await;
        self.current = Some(weather.condition);

        let atmosphere = atmosphere_for(weather);
        let light = light_for(weather.is_day);

        self.push_atmosphere(atmosphere).await;
        if let Err(err) = self.viewport.set_light(light).await {
            log_cosmetic_failure("light", &err);
        }

        info!(
            "🌦️ applied weather {} (intensity {:.2}, {})",
            weather.condition,
            weather.intensity(),
            if weather.is_day { "day" } else { "night" }
        );

        let applied = AppliedAtmosphere {
            condition: weather.condition,
            intensity: weather.intensity(),
            is_day: weather.is_day,
            atmosphere,
            light,
        };
        self.last_applied = Some(applied.clone());
        applied
    }

    async fn push_atmosphere(&self, params: AtmosphereParams) {
        if let Err(err) = self.viewport.set_atmosphere(params).await {
            log_cosmetic_failure("atmosphere", &err);
        }
    }
}

fn log_cosmetic_failure(what: &str, err: &ViewportError) {
    match err {
        ViewportError::AtmosphereUnavailable => debug!("{} unavailable, skipping", what),
        other => warn!("⚠️ failed to update {}: {}", what, other),
    }
}
