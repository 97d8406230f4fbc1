// src/validation/action.rs

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::atmosphere::{WeatherCondition, weather_scene};
use crate::geo::GeoPoint;
use crate::protocol::action::{
    AccessibilityParams, BufferParams, BuildingQuery, CameraParams, GetWeatherParams,
    HighlightParams, HighlightTarget, SetWeatherParams, ViewshedParams,
};
use crate::protocol::{Action, ActionDescriptor, ActionKind, Target};
use crate::validation::params::{
    RawAccessibility, RawBuffer, RawBuildingQuery, RawCamera, RawHighlight, RawHighlightTarget,
    RawLayerSwitch, RawLocation, RawSetWeather, RawViewshed,
};

pub const DEFAULT_BUFFER_RADIUS: f64 = 1000.0;
pub const DEFAULT_OBSERVER_HEIGHT: f64 = 50.0;
pub const DEFAULT_VIEWSHED_RADIUS: f64 = 1000.0;
pub const DEFAULT_TRAVEL_MODE: &str = "driving";
pub const DEFAULT_TIME_LIMIT_MIN: u32 = 15;
pub const MAX_TIME_LIMIT_MIN: u32 = 120;
pub const DEFAULT_WEATHER_INTENSITY: f64 = 0.5;
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#FFD700";
const MAX_RISK_LEVEL: u32 = 4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionValidationError {
    #[error("unsupported action type: {0}")]
    UnsupportedType(String),
    #[error("{action}: missing required parameter `{field}`")]
    MissingField {
        action: ActionKind,
        field: &'static str,
    },
    #[error("{action}: invalid `{field}`: {reason}")]
    InvalidField {
        action: ActionKind,
        field: &'static str,
        reason: String,
    },
    #[error("{action}: malformed parameters: {reason}")]
    Malformed { action: ActionKind, reason: String },
    #[error("malformed action `{action_type}`: {reason}")]
    Undecodable { action_type: String, reason: String },
}

impl ActionValidationError {
    /// A short explanation plus, where useful, an example of a valid shape.
    pub fn hint(&self) -> (String, Option<Value>) {
        match self {
            ActionValidationError::UnsupportedType(_) => (
                "Unknown action type. Use one of the supported map actions.".to_string(),
                Some(json!({ "type": "camera_flyTo", "parameters": { "city": "北京" } })),
            ),
            ActionValidationError::MissingField { field, .. } => (
                "Missing required parameter.".to_string(),
                Some(json!({ field.to_string(): "<required>" })),
            ),
            ActionValidationError::InvalidField { field, reason, .. } => (
                format!("Parameter `{field}` is out of range or has the wrong type."),
                Some(json!({ "field": field, "reason": reason })),
            ),
            ActionValidationError::Malformed { reason, .. } => (reason.clone(), None),
            ActionValidationError::Undecodable { .. } => (
                "Action entry does not match the descriptor shape.".to_string(),
                Some(json!({ "type": "reset", "parameters": {}, "delay": 0 })),
            ),
        }
    }
}

fn read<T: DeserializeOwned>(
    kind: ActionKind,
    params: &Map<String, Value>,
) -> Result<T, ActionValidationError> {
    serde_json::from_value(Value::Object(params.clone())).map_err(|err| {
        ActionValidationError::Malformed {
            action: kind,
            reason: err.to_string(),
        }
    })
}

fn invalid(kind: ActionKind, field: &'static str, reason: &str) -> ActionValidationError {
    ActionValidationError::InvalidField {
        action: kind,
        field,
        reason: reason.to_string(),
    }
}

fn checked_point(
    kind: ActionKind,
    longitude: f64,
    latitude: f64,
) -> Result<GeoPoint, ActionValidationError> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid(kind, "longitude", "must be within [-180, 180]"));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(invalid(kind, "latitude", "must be within [-90, 90]"));
    }
    Ok(GeoPoint::new(longitude, latitude))
}

/// Coordinates win over a place name when both are present.
fn optional_target(
    kind: ActionKind,
    location: RawLocation,
) -> Result<Option<Target>, ActionValidationError> {
    match (location.longitude, location.latitude, location.city) {
        (Some(lon), Some(lat), _) => Ok(Some(Target::Coordinates(checked_point(kind, lon, lat)?))),
        (_, _, Some(city)) => Ok(Some(Target::Place(city))),
        (Some(_), None, None) => Err(ActionValidationError::MissingField {
            action: kind,
            field: "latitude",
        }),
        (None, Some(_), None) => Err(ActionValidationError::MissingField {
            action: kind,
            field: "longitude",
        }),
        (None, None, None) => Ok(None),
    }
}

fn required_point(
    kind: ActionKind,
    location: &RawLocation,
) -> Result<GeoPoint, ActionValidationError> {
    let longitude = location.longitude.ok_or(ActionValidationError::MissingField {
        action: kind,
        field: "longitude",
    })?;
    let latitude = location.latitude.ok_or(ActionValidationError::MissingField {
        action: kind,
        field: "latitude",
    })?;
    checked_point(kind, longitude, latitude)
}

fn positive(
    kind: ActionKind,
    field: &'static str,
    value: Option<f64>,
    default: f64,
) -> Result<f64, ActionValidationError> {
    let value = value.unwrap_or(default);
    if value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(kind, field, "must be greater than zero"))
    }
}

fn camera(kind: ActionKind, params: &Map<String, Value>) -> Result<CameraParams, ActionValidationError> {
    let target = optional_target(kind, read(kind, params)?)?.ok_or(
        ActionValidationError::MissingField {
            action: kind,
            field: "city",
        },
    )?;
    let raw: RawCamera = read(kind, params)?;

    if raw.height.is_some_and(|h| h <= 0.0) {
        return Err(invalid(kind, "height", "must be greater than zero"));
    }
    if raw.duration.is_some_and(|d| !(d.is_finite() && d >= 0.0)) {
        return Err(invalid(kind, "duration", "must be a finite, non-negative number of seconds"));
    }

    Ok(CameraParams {
        target,
        height: raw.height,
        duration_secs: raw.duration,
        heading_deg: raw.heading,
        pitch_deg: raw.pitch,
    })
}

fn building_query(params: &Map<String, Value>) -> Result<BuildingQuery, ActionValidationError> {
    let kind = ActionKind::QueryBuildings;
    let raw: RawBuildingQuery = read(kind, params)?;

    if let (Some(min), Some(max)) = (raw.min_height, raw.max_height) {
        if max < min {
            return Err(invalid(kind, "max_height", "must not be below min_height"));
        }
    }
    if raw.risk_level.is_some_and(|level| level > MAX_RISK_LEVEL) {
        return Err(invalid(kind, "risk_level", "must be within [0, 4]"));
    }

    Ok(BuildingQuery {
        city: raw.city,
        min_height: raw.min_height,
        max_height: raw.max_height,
        category: raw.category,
        risk_level: raw.risk_level,
        district: raw.district,
        keyword: raw.keyword,
    })
}

fn highlight(params: &Map<String, Value>) -> Result<HighlightParams, ActionValidationError> {
    let kind = ActionKind::HighlightBuildings;
    let raw: RawHighlight = read(kind, params)?;

    let buildings = raw
        .buildings
        .iter()
        .map(|entry| -> Result<HighlightTarget, ActionValidationError> {
            let location: RawLocation = read(kind, entry)?;
            let target: RawHighlightTarget = read(kind, entry)?;
            let position = required_point(kind, &location)
                .map_err(|_| invalid(kind, "buildings", "every building needs longitude and latitude"))?;
            Ok(HighlightTarget {
                position,
                name: target.name,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HighlightParams {
        buildings,
        color: raw.color.unwrap_or_else(|| DEFAULT_HIGHLIGHT_COLOR.to_string()),
    })
}

fn set_weather(params: &Map<String, Value>) -> Result<SetWeatherParams, ActionValidationError> {
    let kind = ActionKind::SetWeather;
    let raw: RawSetWeather = read(kind, params)?;

    let weather = match (raw.condition.as_deref(), raw.scene.as_deref()) {
        (Some(condition), _) => WeatherCondition::new(
            condition,
            raw.intensity.unwrap_or(DEFAULT_WEATHER_INTENSITY),
            raw.is_day.unwrap_or(true),
        ),
        (None, Some(scene)) => {
            let preset = weather_scene(scene).ok_or_else(|| invalid(kind, "scene", "unknown weather scene"))?;
            WeatherCondition::from_kind(
                preset.condition,
                raw.intensity.unwrap_or(preset.intensity),
                raw.is_day.unwrap_or(preset.is_day),
            )
        }
        (None, None) => {
            return Err(ActionValidationError::MissingField {
                action: kind,
                field: "condition",
            });
        }
    };

    if raw.height.is_some_and(|h| h <= 0.0) {
        return Err(invalid(kind, "height", "must be greater than zero"));
    }

    Ok(SetWeatherParams {
        weather,
        target: optional_target(kind, read(kind, params)?)?,
        height: raw.height,
    })
}

fn get_weather(params: &Map<String, Value>) -> Result<GetWeatherParams, ActionValidationError> {
    let kind = ActionKind::GetWeather;
    let location: RawLocation = read(kind, params)?;

    let point = match (location.longitude, location.latitude) {
        (Some(lon), Some(lat)) => Some(checked_point(kind, lon, lat)?),
        _ => None,
    };
    if point.is_none() && location.city.is_none() {
        return Err(ActionValidationError::MissingField {
            action: kind,
            field: "city",
        });
    }

    Ok(GetWeatherParams {
        city: location.city,
        point,
    })
}

/// Turns a loosely-typed descriptor into a typed [`Action`].
pub fn validate_action(descriptor: &ActionDescriptor) -> Result<Action, ActionValidationError> {
    if let Some(reason) = &descriptor.rejection {
        return Err(ActionValidationError::Undecodable {
            action_type: descriptor.action_type.clone(),
            reason: reason.clone(),
        });
    }

    let kind = ActionKind::from_type(&descriptor.action_type)
        .ok_or_else(|| ActionValidationError::UnsupportedType(descriptor.action_type.clone()))?;
    let params = &descriptor.parameters;

    let action = match kind {
        ActionKind::FlyTo => Action::FlyTo(camera(kind, params)?),
        ActionKind::SetView => Action::SetView(camera(kind, params)?),
        ActionKind::Reset => Action::Reset,
        ActionKind::QueryBuildings => Action::QueryBuildings(building_query(params)?),
        ActionKind::HighlightBuildings => Action::HighlightBuildings(highlight(params)?),
        ActionKind::LayerSwitch => {
            let raw: RawLayerSwitch = read(kind, params)?;
            let layer_type = raw.layer_type.ok_or(ActionValidationError::MissingField {
                action: kind,
                field: "layerType",
            })?;
            Action::LayerSwitch { layer_type }
        }
        ActionKind::SpatialBuffer => {
            let raw: RawBuffer = read(kind, params)?;
            Action::SpatialBuffer(BufferParams {
                center: required_point(kind, &read(kind, params)?)?,
                radius: positive(kind, "radius", raw.radius, DEFAULT_BUFFER_RADIUS)?,
            })
        }
        ActionKind::SpatialViewshed => {
            let raw: RawViewshed = read(kind, params)?;
            let observer_height = raw.observer_height.unwrap_or(DEFAULT_OBSERVER_HEIGHT);
            if observer_height < 0.0 {
                return Err(invalid(kind, "observerHeight", "must not be negative"));
            }
            Action::SpatialViewshed(ViewshedParams {
                observer: required_point(kind, &read(kind, params)?)?,
                observer_height,
                radius: positive(kind, "radius", raw.radius, DEFAULT_VIEWSHED_RADIUS)?,
            })
        }
        ActionKind::SpatialAccessibility => {
            let raw: RawAccessibility = read(kind, params)?;
            let time_limit = raw.time_limit.unwrap_or(DEFAULT_TIME_LIMIT_MIN);
            if !(1..=MAX_TIME_LIMIT_MIN).contains(&time_limit) {
                return Err(invalid(kind, "timeLimit", "must be within [1, 120] minutes"));
            }
            Action::SpatialAccessibility(AccessibilityParams {
                origin: required_point(kind, &read(kind, params)?)?,
                mode: raw.mode.unwrap_or_else(|| DEFAULT_TRAVEL_MODE.to_string()),
                time_limit,
            })
        }
        ActionKind::SetWeather => Action::SetWeather(set_weather(params)?),
        ActionKind::GetWeather => Action::GetWeather(get_weather(params)?),
    };

    Ok(action)
}
