// src/viewport/recording.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use crate::geo::GeoPoint;
use crate::viewport::{
    AtmosphereParams, CameraDestination, FlightCompletion, FlightOptions, ImageryProvider,
    LightParams, MarkerHandle, OverlayStyle, PointMarker, Viewport, ViewportError,
};

/// An entity added to the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    Point(PointMarker),
    Circle {
        center: GeoPoint,
        radius_meters: f64,
        style: OverlayStyle,
    },
    Polyline {
        points: Vec<GeoPoint>,
        style: OverlayStyle,
    },
    Polygon {
        points: Vec<GeoPoint>,
        style: OverlayStyle,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightRecord {
    pub destination: CameraDestination,
    pub duration_secs: f64,
    pub heading_deg: f64,
    pub pitch_deg: f64,
}

/// Point-in-time copy of everything the recording viewport holds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewportSnapshot {
    pub camera: Option<CameraDestination>,
    pub flights: Vec<FlightRecord>,
    pub overlays: BTreeMap<MarkerHandle, Overlay>,
    pub atmosphere: Option<AtmosphereParams>,
    pub light: Option<LightParams>,
    pub imagery: Option<ImageryProvider>,
}

impl ViewportSnapshot {
    pub fn circles(&self) -> Vec<(GeoPoint, f64)> {
        self.overlays
            .values()
            .filter_map(|overlay| match overlay {
                Overlay::Circle {
                    center,
                    radius_meters,
                    ..
                } => Some((*center, *radius_meters)),
                _ => None,
            })
            .collect()
    }

    pub fn points(&self) -> Vec<&PointMarker> {
        self.overlays
            .values()
            .filter_map(|overlay| match overlay {
                Overlay::Point(marker) => Some(marker),
                _ => None,
            })
            .collect()
    }

    /// Vertex lists of every polyline, in insertion order.
    pub fn polylines(&self) -> Vec<&[GeoPoint]> {
        self.overlays
            .values()
            .filter_map(|overlay| match overlay {
                Overlay::Polyline { points, .. } => Some(points.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn polygons(&self) -> usize {
        self.overlays
            .values()
            .filter(|overlay| matches!(overlay, Overlay::Polygon { .. }))
            .count()
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    snapshot: ViewportSnapshot,
    next_handle: u64,
}

/// In-memory viewport that records every command it receives.
///
/// Backs the demo binary and the test suite. Flights complete immediately
/// unless [`RecordingViewport::with_flight_timing`] is set, in which case the
/// completion signal fires after the requested duration.
#[derive(Debug, Clone)]
pub struct RecordingViewport {
    state: Arc<Mutex<RecordingState>>,
    ready: Arc<AtomicBool>,
    reject_removals: Arc<AtomicBool>,
    atmosphere_available: bool,
    flight_timing: bool,
}

impl RecordingViewport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RecordingState::default())),
            ready: Arc::new(AtomicBool::new(true)),
            reject_removals: Arc::new(AtomicBool::new(false)),
            atmosphere_available: true,
            flight_timing: false,
        }
    }

    pub fn with_flight_timing(mut self) -> Self {
        self.flight_timing = true;
        self
    }

    pub fn without_atmosphere(mut self) -> Self {
        self.atmosphere_available = false;
        self
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Makes `remove_marker` fail until switched back, as a renderer that
    /// lost its entity collection would.
    pub fn set_reject_removals(&self, reject: bool) {
        self.reject_removals.store(reject, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ViewportSnapshot {
        self.state.lock().snapshot.clone()
    }

    fn insert(&self, overlay: Overlay) -> MarkerHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = MarkerHandle(state.next_handle);
        state.snapshot.overlays.insert(handle, overlay);
        handle
    }

    fn check_ready(&self) -> Result<(), ViewportError> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ViewportError::NotReady)
        }
    }
}

impl Default for RecordingViewport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Viewport for RecordingViewport {
    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn fly_camera(
        &self,
        destination: CameraDestination,
        flight: FlightOptions,
    ) -> Result<FlightCompletion, ViewportError> {
        self.check_ready()?;
        self.state.lock().snapshot.flights.push(FlightRecord {
            destination,
            duration_secs: flight.duration.as_secs_f64(),
            heading_deg: flight.heading_deg,
            pitch_deg: flight.pitch_deg,
        });

        if !self.flight_timing || flight.duration.is_zero() {
            self.state.lock().snapshot.camera = Some(destination);
            return Ok(FlightCompletion::completed());
        }

        let (tx, completion) = FlightCompletion::channel();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(flight.duration).await;
            state.lock().snapshot.camera = Some(destination);
            let _ = tx.send(());
        });
        Ok(completion)
    }

    async fn set_camera_instant(&self, destination: CameraDestination) -> Result<(), ViewportError> {
        self.check_ready()?;
        self.state.lock().snapshot.camera = Some(destination);
        Ok(())
    }

    async fn add_point_marker(&self, marker: PointMarker) -> Result<MarkerHandle, ViewportError> {
        self.check_ready()?;
        Ok(self.insert(Overlay::Point(marker)))
    }

    async fn add_circle(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        style: OverlayStyle,
    ) -> Result<MarkerHandle, ViewportError> {
        self.check_ready()?;
        Ok(self.insert(Overlay::Circle {
            center,
            radius_meters,
            style,
        }))
    }

    async fn add_polyline(
        &self,
        points: Vec<GeoPoint>,
        style: OverlayStyle,
    ) -> Result<MarkerHandle, ViewportError> {
        self.check_ready()?;
        Ok(self.insert(Overlay::Polyline { points, style }))
    }

    async fn add_polygon(
        &self,
        points: Vec<GeoPoint>,
        style: OverlayStyle,
    ) -> Result<MarkerHandle, ViewportError> {
        self.check_ready()?;
        Ok(self.insert(Overlay::Polygon { points, style }))
    }

    async fn remove_marker(&self, handle: MarkerHandle) -> Result<bool, ViewportError> {
        if self.reject_removals.load(Ordering::SeqCst) {
            return Err(ViewportError::Rejected(format!("cannot remove entity {}", handle.0)));
        }
        Ok(self.state.lock().snapshot.overlays.remove(&handle).is_some())
    }

    async fn remove_all_managed_markers(&self) -> Result<usize, ViewportError> {
        let mut state = self.state.lock();
        let removed = state.snapshot.overlays.len();
        state.snapshot.overlays.clear();
        Ok(removed)
    }

    async fn set_atmosphere(&self, params: AtmosphereParams) -> Result<(), ViewportError> {
        if !self.atmosphere_available {
            return Err(ViewportError::AtmosphereUnavailable);
        }
        self.state.lock().snapshot.atmosphere = Some(params);
        Ok(())
    }

    async fn set_light(&self, light: LightParams) -> Result<(), ViewportError> {
        if !self.atmosphere_available {
            return Err(ViewportError::AtmosphereUnavailable);
        }
        self.state.lock().snapshot.light = Some(light);
        Ok(())
    }

    async fn switch_base_imagery(&self, provider: &ImageryProvider) -> Result<(), ViewportError> {
        self.check_ready()?;
        self.state.lock().snapshot.imagery = Some(provider.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn beijing() -> CameraDestination {
        CameraDestination {
            point: GeoPoint::new(116.4074, 39.9042),
            height: 5000.0,
        }
    }

    fn flight(secs: u64) -> FlightOptions {
        FlightOptions {
            duration: Duration::from_secs(secs),
            heading_deg: 0.0,
            pitch_deg: -30.0,
        }
    }

    #[tokio::test]
    async fn instant_flight_moves_camera_right_away() {
        let viewport = RecordingViewport::new();
        let completion = viewport.fly_camera(beijing(), flight(3)).await.unwrap();
        completion.wait().await.unwrap();
        assert_eq!(viewport.snapshot().camera, Some(beijing()));
        assert_eq!(viewport.snapshot().flights.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_flight_arrives_after_duration() {
        let viewport = RecordingViewport::new().with_flight_timing();
        let completion = viewport.fly_camera(beijing(), flight(3)).await.unwrap();
        assert_eq!(viewport.snapshot().camera, None);

        let started = tokio::time::Instant::now();
        completion.wait().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(viewport.snapshot().camera, Some(beijing()));
    }

    #[tokio::test]
    async fn markers_can_be_removed_individually_and_in_bulk() {
        let viewport = RecordingViewport::new();
        let style = OverlayStyle::new("#3388ff", 0.3);
        let circle = viewport
            .add_circle(GeoPoint::new(116.4, 39.9), 500.0, style.clone())
            .await
            .unwrap();
        viewport
            .add_polygon(vec![GeoPoint::new(0.0, 0.0)], style)
            .await
            .unwrap();

        assert!(viewport.remove_marker(circle).await.unwrap());
        assert!(!viewport.remove_marker(circle).await.unwrap());
        assert_eq!(viewport.remove_all_managed_markers().await.unwrap(), 1);
        assert!(viewport.snapshot().overlays.is_empty());
    }

    #[tokio::test]
    async fn not_ready_viewport_rejects_mutations() {
        let viewport = RecordingViewport::new();
        viewport.set_ready(false);
        assert!(!viewport.is_ready().await);
        assert_eq!(
            viewport.set_camera_instant(beijing()).await,
            Err(ViewportError::NotReady)
        );
    }
}
