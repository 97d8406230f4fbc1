// src/protocol/action.rs

use std::fmt;

use crate::atmosphere::WeatherCondition;
use crate::geo::GeoPoint;

/// The closed set of action types the engine dispatches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    FlyTo,
    SetView,
    Reset,
    QueryBuildings,
    HighlightBuildings,
    LayerSwitch,
    SpatialBuffer,
    SpatialViewshed,
    SpatialAccessibility,
    SetWeather,
    GetWeather,
}

impl ActionKind {
    pub fn from_type(action_type: &str) -> Option<Self> {
        let kind = match action_type {
            "camera_flyTo" => Self::FlyTo,
            "camera_setView" => Self::SetView,
            "reset" => Self::Reset,
            "building_query" | "query_buildings" => Self::QueryBuildings,
            "highlight_buildings" => Self::HighlightBuildings,
            "layer_switch" => Self::LayerSwitch,
            "spatial_buffer" => Self::SpatialBuffer,
            "spatial_viewshed" => Self::SpatialViewshed,
            "spatial_accessibility" => Self::SpatialAccessibility,
            "set_weather" => Self::SetWeather,
            "get_weather" => Self::GetWeather,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether executing this kind mutates the viewport.
    pub fn touches_viewport(&self) -> bool {
        !matches!(self, Self::QueryBuildings | Self::LayerSwitch)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FlyTo => "camera_flyTo",
            Self::SetView => "camera_setView",
            Self::Reset => "reset",
            Self::QueryBuildings => "building_query",
            Self::HighlightBuildings => "highlight_buildings",
            Self::LayerSwitch => "layer_switch",
            Self::SpatialBuffer => "spatial_buffer",
            Self::SpatialViewshed => "spatial_viewshed",
            Self::SpatialAccessibility => "spatial_accessibility",
            Self::SetWeather => "set_weather",
            Self::GetWeather => "get_weather",
        };
        f.write_str(name)
    }
}

/// A location given either by name or by coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    Place(String),
    Coordinates(GeoPoint),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub target: Target,
    pub height: Option<f64>,
    pub duration_secs: Option<f64>,
    pub heading_deg: Option<f64>,
    pub pitch_deg: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildingQuery {
    pub city: Option<String>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
    pub category: Option<String>,
    pub risk_level: Option<u32>,
    pub district: Option<String>,
    pub keyword: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HighlightTarget {
    pub position: GeoPoint,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HighlightParams {
    pub buildings: Vec<HighlightTarget>,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BufferParams {
    pub center: GeoPoint,
    pub radius: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewshedParams {
    pub observer: GeoPoint,
    pub observer_height: f64,
    pub radius: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccessibilityParams {
    pub origin: GeoPoint,
    pub mode: String,
    pub time_limit: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetWeatherParams {
    pub weather: WeatherCondition,
    pub target: Option<Target>,
    pub height: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetWeatherParams {
    pub city: Option<String>,
    pub point: Option<GeoPoint>,
}

/// A validated action: one variant per type, each with typed parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    FlyTo(CameraParams),
    SetView(CameraParams),
    Reset,
    QueryBuildings(BuildingQuery),
    HighlightBuildings(HighlightParams),
    LayerSwitch { layer_type: String },
    SpatialBuffer(BufferParams),
    SpatialViewshed(ViewshedParams),
    SpatialAccessibility(AccessibilityParams),
    SetWeather(SetWeatherParams),
    GetWeather(GetWeatherParams),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::FlyTo(_) => ActionKind::FlyTo,
            Self::SetView(_) => ActionKind::SetView,
            Self::Reset => ActionKind::Reset,
            Self::QueryBuildings(_) => ActionKind::QueryBuildings,
            Self::HighlightBuildings(_) => ActionKind::HighlightBuildings,
            Self::LayerSwitch { .. } => ActionKind::LayerSwitch,
            Self::SpatialBuffer(_) => ActionKind::SpatialBuffer,
            Self::SpatialViewshed(_) => ActionKind::SpatialViewshed,
            Self::SpatialAccessibility(_) => ActionKind::SpatialAccessibility,
            Self::SetWeather(_) => ActionKind::SetWeather,
            Self::GetWeather(_) => ActionKind::GetWeather,
        }
    }
}
