// src/viewport/mod.rs

//! Capability interface over the external 3D renderer.
//!
//! The engine only ever talks to the scene through [`Viewport`]. Methods are
//! async because a renderer commonly lives across a bridge (a browser-hosted
//! globe driven over a socket, a separate render thread) where every call is a
//! round trip.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::geo::GeoPoint;

pub mod recording;
pub use recording::{Overlay, RecordingViewport, ViewportSnapshot};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewportError {
    #[error("viewport not ready")]
    NotReady,
    #[error("atmosphere is unavailable on this viewport")]
    AtmosphereUnavailable,
    #[error("camera flight was interrupted before completion")]
    FlightInterrupted,
    #[error("renderer rejected command: {0}")]
    Rejected(String),
}

/// Where the camera should end up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraDestination {
    pub point: GeoPoint,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightOptions {
    pub duration: Duration,
    pub heading_deg: f64,
    pub pitch_deg: f64,
}

/// Fires once the renderer reports that a camera transition finished.
#[derive(Debug)]
pub struct FlightCompletion {
    rx: oneshot::Receiver<()>,
}

impl FlightCompletion {
    /// Returns a completion signal and the sender the renderer fires.
    pub fn channel() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A transition that has already finished.
    pub fn completed() -> Self {
        let (tx, completion) = Self::channel();
        let _ = tx.send(());
        completion
    }

    pub async fn wait(self) -> Result<(), ViewportError> {
        self.rx.await.map_err(|_| ViewportError::FlightInterrupted)
    }
}

/// Opaque handle to an entity the runtime added to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    pub position: GeoPoint,
    pub label: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub color: String,
    pub alpha: f64,
    pub outline_width: f64,
}

impl OverlayStyle {
    pub fn new(color: &str, alpha: f64) -> Self {
        Self {
            color: color.to_string(),
            alpha,
            outline_width: 2.0,
        }
    }
}

/// Fog and sky parameters, expressed as deltas from the renderer defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereParams {
    pub fog_density: f64,
    pub fog_minimum_brightness: f64,
    pub sky_hue_shift: f64,
    pub sky_saturation_shift: f64,
    pub sky_brightness_shift: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightParams {
    pub direction: [f64; 3],
    pub intensity: f64,
    pub global_lighting: bool,
}

/// Tile source for the base imagery layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageryProvider {
    pub name: String,
    pub url_template: String,
    pub credit: String,
    pub minimum_level: u8,
    pub maximum_level: u8,
}

#[async_trait]
pub trait Viewport: Send + Sync {
    async fn is_ready(&self) -> bool;

    /// Starts an animated transition. The returned signal fires on arrival.
    async fn fly_camera(
        &self,
        destination: CameraDestination,
        flight: FlightOptions,
    ) -> Result<FlightCompletion, ViewportError>;

    async fn set_camera_instant(&self, destination: CameraDestination) -> Result<(), ViewportError>;

    async fn add_point_marker(&self, marker: PointMarker) -> Result<MarkerHandle, ViewportError>;

    async fn add_circle(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        style: OverlayStyle,
    ) -> Result<MarkerHandle, ViewportError>;

    async fn add_polyline(
        &self,
        points: Vec<GeoPoint>,
        style: OverlayStyle,
    ) -> Result<MarkerHandle, ViewportError>;

    async fn add_polygon(
        &self,
        points: Vec<GeoPoint>,
        style: OverlayStyle,
    ) -> Result<MarkerHandle, ViewportError>;

    /// Returns `false` when the handle was unknown.
    async fn remove_marker(&self, handle: MarkerHandle) -> Result<bool, ViewportError>;

    /// Removes everything added through this interface; returns the count.
    async fn remove_all_managed_markers(&self) -> Result<usize, ViewportError>;

    async fn set_atmosphere(&self, params: AtmosphereParams) -> Result<(), ViewportError>;

    async fn set_light(&self, light: LightParams) -> Result<(), ViewportError>;

    async fn switch_base_imagery(&self, provider: &ImageryProvider) -> Result<(), ViewportError>;
}
