// src/validation/params.rs

//! Wire shapes of each action's parameter map, before validation. The
//! location fields live in [`RawLocation`] and are read from the same map
//! in a separate pass.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::protocol::lenient;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawLocation {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub city: Option<String>,
    #[serde(
        default,
        alias = "lon",
        alias = "lng",
        deserialize_with = "lenient::opt_f64"
    )]
    pub longitude: Option<f64>,
    #[serde(default, alias = "lat", deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCamera {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub heading: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub pitch: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawBuildingQuery {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub city: Option<String>,
    #[serde(default, alias = "minHeight", deserialize_with = "lenient::opt_f64")]
    pub min_height: Option<f64>,
    #[serde(default, alias = "maxHeight", deserialize_with = "lenient::opt_f64")]
    pub max_height: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub category: Option<String>,
    #[serde(default, alias = "riskLevel", deserialize_with = "lenient::opt_u32")]
    pub risk_level: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHighlightTarget {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawHighlight {
    #[serde(default)]
    pub buildings: Vec<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawLayerSwitch {
    #[serde(
        default,
        rename = "layerType",
        alias = "layer_type",
        alias = "layer",
        deserialize_with = "lenient::opt_string"
    )]
    pub layer_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawBuffer {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub radius: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawViewshed {
    #[serde(
        default,
        rename = "observerHeight",
        alias = "observer_height",
        deserialize_with = "lenient::opt_f64"
    )]
    pub observer_height: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub radius: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAccessibility {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub mode: Option<String>,
    #[serde(
        default,
        rename = "timeLimit",
        alias = "time_limit",
        deserialize_with = "lenient::opt_u32"
    )]
    pub time_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawSetWeather {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub scene: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub intensity: Option<f64>,
    #[serde(default, alias = "isDay", deserialize_with = "lenient::opt_bool")]
    pub is_day: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub height: Option<f64>,
}
