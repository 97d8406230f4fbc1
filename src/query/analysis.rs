// src/query/analysis.rs

use serde::Deserialize;

use crate::geo::GeoPoint;
use crate::protocol::action::{AccessibilityParams, BufferParams, ViewshedParams};
use crate::query::{
    ACCESSIBILITY_PATH, BUFFER_PATH, QueryClient, QueryError, Response, VIEWSHED_PATH,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BufferResponse {
    pub total: Option<u64>,
}

/// A sampled point. Coordinates are required; an area without them is a
/// decode error rather than a marker at (0, 0).
#[derive(Debug, Clone, Deserialize)]
pub struct VisibleArea {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub name: Option<String>,
}

impl VisibleArea {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.longitude, self.latitude)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewshedResponse {
    pub visible_areas: Vec<VisibleArea>,
    pub coverage_percent: Option<f64>,
    pub visible_count: Option<u64>,
    pub total_analyzed: Option<u64>,
}

impl ViewshedResponse {
    pub fn visible(&self) -> impl Iterator<Item = &VisibleArea> {
        self.visible_areas.iter().filter(|area| area.visible)
    }

    pub fn visible_total(&self) -> u64 {
        self.visible_count.unwrap_or_else(|| self.visible().count() as u64)
    }
}

/// One reachability ring. `coordinates` is a flat lon/lat sequence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Isochrone {
    pub time: Option<f64>,
    pub distance: Option<f64>,
    pub coordinates: Vec<f64>,
}

impl Isochrone {
    pub fn ring(&self) -> Vec<GeoPoint> {
        GeoPoint::from_flat(&self.coordinates)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessibilityResponse {
    pub isochrones: Vec<Isochrone>,
    pub reachable_pois: Option<u64>,
    pub coverage_area: Option<f64>,
}

impl QueryClient {
    pub async fn buffer(&self, params: &BufferParams) -> Result<Response<BufferResponse>, QueryError> {
        let query = vec![
            ("center_lon", params.center.longitude.to_string()),
            ("center_lat", params.center.latitude.to_string()),
            ("radius", params.radius.to_string()),
        ];
        self.get(BUFFER_PATH, &query).await
    }

    pub async fn viewshed(
        &self,
        params: &ViewshedParams,
    ) -> Result<Response<ViewshedResponse>, QueryError> {
        let query = vec![
            ("longitude", params.observer.longitude.to_string()),
            ("latitude", params.observer.latitude.to_string()),
            ("observer_height", params.observer_height.to_string()),
            ("radius", params.radius.to_string()),
        ];
        self.get(VIEWSHED_PATH, &query).await
    }

    pub async fn accessibility(
        &self,
        params: &AccessibilityParams,
    ) -> Result<Response<AccessibilityResponse>, QueryError> {
        let query = vec![
            ("origin_lon", params.origin.longitude.to_string()),
            ("origin_lat", params.origin.latitude.to_string()),
            ("mode", params.mode.clone()),
            ("time_limit", params.time_limit.to_string()),
        ];
        self.get(ACCESSIBILITY_PATH, &query).await
    }
}
