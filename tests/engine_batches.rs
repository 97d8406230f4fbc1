use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;

use map_agent_runtime::ActionEngine;
use map_agent_runtime::atmosphere::{ConditionKind, WeatherCondition, atmosphere_for};
use map_agent_runtime::config::RuntimeConfig;
use map_agent_runtime::geo::GeoPoint;
use map_agent_runtime::protocol::{ActionDescriptor, ToolCall};
use map_agent_runtime::viewport::{
    AtmosphereParams, CameraDestination, FlightCompletion, FlightOptions, ImageryProvider,
    LightParams, MarkerHandle, OverlayStyle, PointMarker, RecordingViewport, Viewport,
    ViewportError,
};

fn engine_with(viewport: &RecordingViewport, config: RuntimeConfig) -> ActionEngine {
    ActionEngine::builder()
        .viewport(Arc::new(viewport.clone()))
        .config(config)
        .build()
        .unwrap()
}

fn engine(viewport: &RecordingViewport) -> ActionEngine {
    engine_with(viewport, RuntimeConfig::default())
}

fn set_weather(condition: &str, intensity: f64) -> ActionDescriptor {
    ActionDescriptor::new("set_weather")
        .param("condition", json!(condition))
        .param("intensity", json!(intensity))
        .param("is_day", json!(true))
}

#[tokio::test]
async fn fly_then_rain_scenario() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);

    let summary = engine
        .execute_actions(&[
            ActionDescriptor::new("camera_flyTo").param("city", json!("北京")),
            set_weather("rain", 0.8),
        ])
        .await;

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failed_count, 0);
    assert!(summary.overall_success);

    let applied = engine.atmosphere().last_applied().unwrap();
    assert_eq!(applied.condition, ConditionKind::Rain);
    assert_eq!(applied.intensity, 0.8);
    assert_eq!(engine.atmosphere().current(), Some(ConditionKind::Rain));

    let snapshot = viewport.snapshot();
    assert_eq!(
        snapshot.atmosphere,
        Some(atmosphere_for(&WeatherCondition::new("rain", 0.8, true)))
    );
    assert_eq!(
        snapshot.camera.map(|camera| camera.point),
        Some(GeoPoint::new(116.4074, 39.9042))
    );
}

#[tokio::test]
async fn counts_and_messages_follow_input_order() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);
    let batch = vec![
        ActionDescriptor::new("reset"),
        ActionDescriptor::new("camera_flyTo"),
        ActionDescriptor::new("summon_dragon"),
        ActionDescriptor::new("camera_setView")
            .param("longitude", json!(121.47))
            .param("latitude", json!(31.23)),
        ActionDescriptor::new("layer_switch").param("layerType", json!("osm")),
    ];

    let summary = engine.execute_actions(&batch).await;

    assert_eq!(summary.success_count + summary.failed_count, batch.len());
    assert_eq!(summary.per_action_messages.len(), batch.len());
    assert_eq!(summary.results.len(), batch.len());
    assert_eq!(
        summary
            .per_action_messages
            .iter()
            .map(|message| message.starts_with("✅"))
            .collect::<Vec<_>>(),
        vec![true, false, false, true, true]
    );
    assert_eq!(
        summary.per_action_messages[2],
        "❌ unsupported action type: summon_dragon"
    );
}

#[tokio::test]
async fn intensity_is_clamped_when_applied() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);

    engine.execute_actions(&[set_weather("snow", 1.5)]).await;
    assert_eq!(engine.atmosphere().last_applied().unwrap().intensity, 1.0);

    engine.execute_actions(&[set_weather("snow", -0.2)]).await;
    assert_eq!(engine.atmosphere().last_applied().unwrap().intensity, 0.0);
}

#[tokio::test]
async fn clear_weather_twice_does_not_drift() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);

    engine
        .execute_actions(&[set_weather("fog", 1.0), set_weather("clear", 0.0)])
        .await;
    let first = viewport.snapshot();

    engine.execute_actions(&[set_weather("clear", 0.0)]).await;
    let second = viewport.snapshot();

    assert_eq!(first.atmosphere, Some(AtmosphereParams::BASELINE));
    assert_eq!(first.atmosphere, second.atmosphere);
    assert_eq!(first.light, second.light);
}

#[tokio::test]
async fn missing_atmosphere_is_a_silent_no_op() {
    let viewport = RecordingViewport::new().without_atmosphere();
    let mut engine = engine(&viewport);

    let summary = engine.execute_actions(&[set_weather("rain", 0.5)]).await;

    assert_eq!(summary.success_count, 1);
    assert_eq!(viewport.snapshot().atmosphere, None);
}

#[tokio::test(start_paused = true)]
async fn not_ready_viewport_fails_only_viewport_actions() {
    let viewport = RecordingViewport::new();
    viewport.set_ready(false);
    let mut engine = engine(&viewport);

    let summary = engine
        .execute_actions(&[
            ActionDescriptor::new("camera_flyTo").param("city", json!("上海")),
            ActionDescriptor::new("layer_switch").param("layerType", json!("street")),
        ])
        .await;

    assert_eq!(summary.per_action_messages[0], "❌ viewport not ready");
    assert_eq!(summary.success_count, 1);
    assert!(viewport.snapshot().flights.is_empty());
}

#[tokio::test(start_paused = true)]
async fn delays_are_waited_out_in_order() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);

    let started = tokio::time::Instant::now();
    let summary = engine
        .execute_actions(&[
            ActionDescriptor::new("reset").delay_ms(1000),
            ActionDescriptor::new("camera_setView")
                .param("city", json!("广州"))
                .delay_ms(1500),
        ])
        .await;

    assert_eq!(summary.success_count, 2);
    assert!(started.elapsed() >= Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn weather_at_a_city_waits_for_flight_and_settle_buffer() {
    let viewport = RecordingViewport::new().with_flight_timing();
    let mut engine = engine(&viewport);

    let started = tokio::time::Instant::now();
    let summary = engine
        .execute_actions(&[set_weather("snow", 0.6).param("city", json!("上海"))])
        .await;

    assert_eq!(summary.success_count, 1);
    assert!(summary.per_action_messages[0].contains("上海"));
    assert!(started.elapsed() >= Duration::from_millis(3500));

    let snapshot = viewport.snapshot();
    assert_eq!(
        snapshot.camera,
        Some(CameraDestination {
            point: GeoPoint::new(121.4737, 31.2304),
            height: 5000.0,
        })
    );
    assert!(snapshot.atmosphere.is_some());
}

#[tokio::test(start_paused = true)]
async fn fly_to_waits_only_when_asked() {
    let viewport = RecordingViewport::new().with_flight_timing();
    let mut engine = engine(&viewport);

    let started = tokio::time::Instant::now();
    engine
        .execute_actions(&[ActionDescriptor::new("camera_flyTo")
            .param("city", json!("成都"))
            .param("duration", json!(1))])
        .await;
    assert!(started.elapsed() < Duration::from_secs(1));

    let started = tokio::time::Instant::now();
    engine
        .execute_actions(&[ActionDescriptor::new("camera_flyTo")
            .param("city", json!("杭州"))
            .param("duration", json!(2))
            .wait_for_completion()])
        .await;
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(
        viewport.snapshot().camera.map(|camera| camera.point),
        Some(GeoPoint::new(120.1551, 30.2741))
    );
}

#[tokio::test]
async fn unknown_city_is_a_failed_precondition() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);

    let summary = engine
        .execute_actions(&[set_weather("rain", 0.5).param("city", json!("Atlantis"))])
        .await;

    assert_eq!(summary.per_action_messages[0], "❌ unknown place: Atlantis");
    assert_eq!(engine.atmosphere().current(), None);
}

#[tokio::test]
async fn highlights_replace_each_other() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);

    let highlight = |buildings: serde_json::Value| {
        ActionDescriptor::new("highlight_buildings").param("buildings", buildings)
    };
    let summary = engine
        .execute_actions(&[
            highlight(json!([
                { "longitude": 116.40, "latitude": 39.90, "name": "A" },
                { "longitude": 116.41, "latitude": 39.91, "name": "B" }
            ])),
            highlight(json!([{ "longitude": 121.47, "latitude": 31.23, "name": "C" }])),
        ])
        .await;

    assert_eq!(summary.success_count, 2);
    let snapshot = viewport.snapshot();
    let labels: Vec<_> = snapshot
        .points()
        .into_iter()
        .map(|marker| marker.label.clone())
        .collect();
    assert_eq!(labels, vec![Some("C".to_string())]);

    let cleared = engine.execute_actions(&[highlight(json!([]))]).await;
    assert_eq!(cleared.per_action_messages[0], "✅ no buildings to highlight");
    assert!(viewport.snapshot().overlays.is_empty());
}

#[tokio::test]
async fn failed_highlight_removal_keeps_old_handles() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);

    let highlight = |name: &str| {
        ActionDescriptor::new("highlight_buildings").param(
            "buildings",
            json!([{ "longitude": 116.40, "latitude": 39.90, "name": name }]),
        )
    };

    engine.execute_actions(&[highlight("A")]).await;
    viewport.set_reject_removals(true);
    let failed = engine.execute_actions(&[highlight("B")]).await;
    assert_eq!(failed.failed_count, 1);

    viewport.set_reject_removals(false);
    let summary = engine.execute_actions(&[highlight("C")]).await;
    assert_eq!(summary.success_count, 1);

    let snapshot = viewport.snapshot();
    let labels: Vec<_> = snapshot
        .points()
        .into_iter()
        .map(|marker| marker.label.clone())
        .collect();
    assert_eq!(labels, vec![Some("C".to_string())]);
}

#[tokio::test]
async fn layer_switch_broadcasts_to_subscribers() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);
    let mut changes = engine.subscribe_layers();

    let summary = engine
        .execute_actions(&[
            ActionDescriptor::new("layer_switch").param("layerType", json!("satellite")),
            ActionDescriptor::new("layer_switch").param("layerType", json!("terrain")),
        ])
        .await;

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.per_action_messages[1], "❌ unknown layer type: terrain");

    let change = changes.recv().await.unwrap();
    assert_eq!(change.layer_type, "satellite");
    assert!(change.provider.url_template.contains("style=6"));
    assert!(changes.try_recv().is_err());
}

#[tokio::test]
async fn clear_overlays_removes_everything() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);

    engine
        .execute_actions(&[ActionDescriptor::new("highlight_buildings").param(
            "buildings",
            json!([{ "longitude": 116.40, "latitude": 39.90 }]),
        )])
        .await;

    assert_eq!(engine.clear_overlays().await.unwrap(), 1);
    assert_eq!(engine.clear_overlays().await.unwrap(), 0);
}

#[tokio::test]
async fn tool_calls_run_like_descriptors() {
    let viewport = RecordingViewport::new();
    let mut engine = engine(&viewport);

    let calls: Vec<ToolCall> = serde_json::from_value(json!([
        { "id": "call_1", "function": { "name": "camera_setView", "arguments": "{\"city\": \"深圳\"}" } },
        { "id": "call_2", "function": { "name": "camera_setView", "arguments": "{not json" } }
    ]))
    .unwrap();

    let summary = engine.execute_tool_calls(&calls).await;

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failed_count, 1);
    assert!(summary.per_action_messages[1].contains("city"));
}

/// Viewport whose camera panics, standing in for a misbehaving renderer.
struct PanickingCamera(RecordingViewport);

#[async_trait]
impl Viewport for PanickingCamera {
    async fn is_ready(&self) -> bool {
        true
    }

    async fn fly_camera(
        &self,
        _destination: CameraDestination,
        _flight: FlightOptions,
    ) -> Result<FlightCompletion, ViewportError> {
        panic!("camera rig exploded");
    }

    async fn set_camera_instant(&self, destination: CameraDestination) -> Result<(), ViewportError> {
        self.0.set_camera_instant(destination).await
    }

    async fn add_point_marker(&self, marker: PointMarker) -> Result<MarkerHandle, ViewportError> {
        self.0.add_point_marker(marker).await
    }

    async fn add_circle(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        style: OverlayStyle,
    ) -> Result<MarkerHandle, ViewportError> {
        self.0.add_circle(center, radius_meters, style).await
    }

    async fn add_polyline(
        &self,
        points: Vec<GeoPoint>,
        style: OverlayStyle,
    ) -> Result<MarkerHandle, ViewportError> {
        self.0.add_polyline(points, style).await
    }

    async fn add_polygon(
        &self,
        points: Vec<GeoPoint>,
        style: OverlayStyle,
    ) -> Result<MarkerHandle, ViewportError> {
        self.0.add_polygon(points, style).await
    }

    async fn remove_marker(&self, handle: MarkerHandle) -> Result<bool, ViewportError> {
        self.0.remove_marker(handle).await
    }

    async fn remove_all_managed_markers(&self) -> Result<usize, ViewportError> {
        self.0.remove_all_managed_markers().await
    }

    async fn set_atmosphere(&self, params: AtmosphereParams) -> Result<(), ViewportError> {
        self.0.set_atmosphere(params).await
    }

    async fn set_light(&self, light: LightParams) -> Result<(), ViewportError> {
        self.0.set_light(light).await
    }

    async fn switch_base_imagery(&self, provider: &ImageryProvider) -> Result<(), ViewportError> {
        self.0.switch_base_imagery(provider).await
    }
}

#[tokio::test]
async fn handler_panic_becomes_a_failed_result() {
    let recording = RecordingViewport::new();
    let mut engine = ActionEngine::new(Arc::new(PanickingCamera(recording.clone()))).unwrap();

    let summary = engine
        .execute_actions(&[
            ActionDescriptor::new("camera_flyTo").param("city", json!("西安")),
            ActionDescriptor::new("camera_setView").param("city", json!("西安")),
        ])
        .await;

    assert_eq!(
        summary.per_action_messages[0],
        "❌ handler panicked: camera rig exploded"
    );
    assert_eq!(summary.success_count, 1);
    assert!(recording.snapshot().camera.is_some());
}
