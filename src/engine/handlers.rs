// src/engine/handlers.rs

use std::time::Duration;

use serde_json::json;
use tracing::{debug, info};

use crate::engine::{ActionEngine, ActionError};
use crate::events::{LayerChange, imagery_provider};
use crate::geo::GeoPoint;
use crate::protocol::ActionResult;
use crate::protocol::action::{
    AccessibilityParams, BufferParams, BuildingQuery, CameraParams, GetWeatherParams,
    HighlightParams, SetWeatherParams, Target, ViewshedParams,
};
use crate::viewport::{CameraDestination, FlightOptions, OverlayStyle, PointMarker};

const DEFAULT_FLY_HEIGHT: f64 = 10_000.0;
const DEFAULT_WEATHER_HEIGHT: f64 = 5_000.0;
const DEFAULT_HEADING_DEG: f64 = 0.0;
const DEFAULT_PITCH_DEG: f64 = -45.0;

const BUFFER_COLOR: &str = "#3388FF";
const VISIBLE_COLOR: &str = "#00C853";
const HIDDEN_COLOR: &str = "#D50000";
const ISOCHRONE_COLOR: &str = "#FF8C00";
const OBSERVER_COLOR: &str = "#FFFFFF";

fn describe_point(point: GeoPoint) -> String {
    format!("({:.4}, {:.4})", point.longitude, point.latitude)
}

/// Negative or non-finite durations collapse to an instant move.
fn flight_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}

impl ActionEngine {
    fn locate(&self, target: &Target) -> Result<(String, GeoPoint), ActionError> {
        match target {
            Target::Coordinates(point) => Ok((describe_point(*point), *point)),
            Target::Place(name) => self
                .resolver
                .resolve(name)
                .map(|place| (place.name, place.point))
                .ok_or_else(|| ActionError::UnknownPlace(name.clone())),
        }
    }

    fn flight_options(&self, params: &CameraParams) -> FlightOptions {
        let seconds = params
            .duration_secs
            .unwrap_or(self.config.default_flight_seconds);
        FlightOptions {
            duration: flight_duration(seconds),
            heading_deg: params.heading_deg.unwrap_or(DEFAULT_HEADING_DEG),
            pitch_deg: params.pitch_deg.unwrap_or(DEFAULT_PITCH_DEG),
        }
    }

    pub(super) async fn fly_to(
        &mut self,
        params: &CameraParams,
        wait: bool,
    ) -> Result<ActionResult, ActionError> {
        let (name, point) = self.locate(&params.target)?;
        let destination = CameraDestination {
            point,
            height: params.height.unwrap_or(DEFAULT_FLY_HEIGHT),
        };

        let completion = self
            .viewport
            .fly_camera(destination, self.flight_options(params))
            .await?;
        if wait {
            completion.wait().await?;
            debug!("camera arrived at {}", name);
        }

        Ok(ActionResult::success(format!("flew to {name}")))
    }

    pub(super) async fn set_view(&mut self, params: &CameraParams) -> Result<ActionResult, ActionError> {
        let (name, point) = self.locate(&params.target)?;
        self.viewport
            .set_camera_instant(CameraDestination {
                point,
                height: params.height.unwrap_or(DEFAULT_FLY_HEIGHT),
            })
            .await?;
        Ok(ActionResult::success(format!("view set to {name}")))
    }

    pub(super) async fn reset(&mut self, wait: bool) -> Result<ActionResult, ActionError> {
        let view = self.config.default_view;
        let flight = FlightOptions {
            duration: flight_duration(self.config.default_flight_seconds),
            heading_deg: view.heading_deg,
            pitch_deg: view.pitch_deg,
        };

        let completion = self.viewport.fly_camera(view.destination, flight).await?;
        if wait {
            completion.wait().await?;
        }
        Ok(ActionResult::success("view reset"))
    }

    pub(super) async fn query_buildings(
        &mut self,
        query: &BuildingQuery,
    ) -> Result<ActionResult, ActionError> {
        let outcome = self
            .query
            .search_buildings_or_placeholder(query, &self.resolver)
            .await;

        if outcome.synthesized {
            return Ok(ActionResult::success(format!(
                "found {} buildings (placeholder data, backend unavailable)",
                outcome.count
            ))
            .with_data(outcome.payload)
            .synthesized());
        }

        Ok(ActionResult::success(format!("found {} buildings", outcome.count)).with_data(outcome.payload))
    }

    pub(super) async fn highlight_buildings(
        &mut self,
        params: &HighlightParams,
    ) -> Result<ActionResult, ActionError> {
        let mut previous = std::mem::take(&mut self.highlights).into_iter();
        while let Some(handle) = previous.next() {
            if let Err(err) = self.viewport.remove_marker(handle).await {
                self.highlights.push(handle);
                self.highlights.extend(previous);
                return Err(err.into());
            }
        }

        if params.buildings.is_empty() {
            return Ok(ActionResult::success("no buildings to highlight"));
        }

        for building in &params.buildings {
            let handle = self
                .viewport
                .add_point_marker(PointMarker {
                    position: building.position,
                    label: building.name.clone(),
                    color: Some(params.color.clone()),
                })
                .await?;
            self.highlights.push(handle);
        }

        Ok(ActionResult::success(format!(
            "highlighted {} buildings",
            params.buildings.len()
        )))
    }

    pub(super) fn switch_layer(&mut self, layer_type: &str) -> Result<ActionResult, ActionError> {
        let provider =
            imagery_provider(layer_type).ok_or_else(|| ActionError::UnknownLayer(layer_type.to_string()))?;
        let descriptor = serde_json::to_value(&provider)?;
        let data = json!({ "layerType": provider.name, "provider": descriptor });

        let delivered = self.layers.emit(LayerChange {
            layer_type: provider.name.clone(),
            provider,
        });
        if delivered == 0 {
            debug!("no layer picker is listening");
        }

        Ok(ActionResult::success(format!("switched base layer to {layer_type}")).with_data(data))
    }

    pub(super) async fn spatial_buffer(&mut self, params: &BufferParams) -> Result<ActionResult, ActionError> {
        let response = self.query.buffer(params).await?;
        self.viewport
            .add_circle(params.center, params.radius, OverlayStyle::new(BUFFER_COLOR, 0.3))
            .await?;

        let message = match response.summary.total {
            Some(total) => format!(
                "{} m buffer around {}: {} features",
                params.radius,
                describe_point(params.center),
                total
            ),
            None => format!("{} m buffer around {}", params.radius, describe_point(params.center)),
        };
        Ok(ActionResult::success(message).with_data(response.raw))
    }

    pub(super) async fn spatial_viewshed(
        &mut self,
        params: &ViewshedParams,
    ) -> Result<ActionResult, ActionError> {
        let response = self.query.viewshed(params).await?;

        if response.summary.visible_areas.is_empty() {
            self.viewport
                .add_point_marker(PointMarker {
                    position: params.observer,
                    label: Some("observer".to_string()),
                    color: Some(OBSERVER_COLOR.to_string()),
                })
                .await?;
        }

        for area in &response.summary.visible_areas {
            let color = if area.visible { VISIBLE_COLOR } else { HIDDEN_COLOR };
            self.viewport
                .add_point_marker(PointMarker {
                    position: area.point(),
                    label: area.name.clone(),
                    color: Some(color.to_string()),
                })
                .await?;
        }

        let summary = &response.summary;
        let analyzed = summary
            .total_analyzed
            .unwrap_or(summary.visible_areas.len() as u64);
        let mut message = format!(
            "viewshed from {}: {}/{} points visible",
            describe_point(params.observer),
            summary.visible_total(),
            analyzed
        );
        if let Some(coverage) = summary.coverage_percent {
            message.push_str(&format!(" ({coverage:.1}% coverage)"));
        }

        Ok(ActionResult::success(message).with_data(response.raw))
    }

    pub(super) async fn spatial_accessibility(
        &mut self,
        params: &AccessibilityParams,
    ) -> Result<ActionResult, ActionError> {
        let response = self.query.accessibility(params).await?;

        let mut drawn = 0;
        for isochrone in &response.summary.isochrones {
            let ring = isochrone.ring();
            if ring.len() < 3 {
                debug!("skipping degenerate isochrone with {} vertices", ring.len());
                continue;
            }
            let mut outline = ring.clone();
            outline.push(ring[0]);
            self.viewport
                .add_polygon(ring, OverlayStyle::new(ISOCHRONE_COLOR, 0.25))
                .await?;
            self.viewport
                .add_polyline(outline, OverlayStyle::new(ISOCHRONE_COLOR, 1.0))
                .await?;
            drawn += 1;
        }

        let mut message = format!(
            "{} isochrones within {} min by {}",
            drawn, params.time_limit, params.mode
        );
        if let Some(pois) = response.summary.reachable_pois {
            message.push_str(&format!(", {pois} reachable POIs"));
        }

        Ok(ActionResult::success(message).with_data(response.raw))
    }

    /// Flies to the target first when one is given, waiting out the flight
    /// plus the settle buffer before touching the atmosphere.
    pub(super) async fn set_weather(
        &mut self,
        params: &SetWeatherParams,
    ) -> Result<ActionResult, ActionError> {
        let mut place = None;

        if let Some(target) = &params.target {
            let (name, point) = self.locate(target)?;
            let flight = FlightOptions {
                duration: flight_duration(self.config.default_flight_seconds),
                heading_deg: DEFAULT_HEADING_DEG,
                pitch_deg: DEFAULT_PITCH_DEG,
            };
            let destination = CameraDestination {
                point,
                height: params.height.unwrap_or(DEFAULT_WEATHER_HEIGHT),
            };

            self.viewport.fly_camera(destination, flight).await?.wait().await?;
            tokio::time::sleep(self.config.weather_settle_buffer).await;
            place = Some(name);
        }

        let applied = self.atmosphere.apply(&params.weather).await;
        let message = match place {
            Some(name) => format!(
                "weather at {} set to {} (intensity {:.2})",
                name, applied.condition, applied.intensity
            ),
            None => format!(
                "weather set to {} (intensity {:.2})",
                applied.condition, applied.intensity
            ),
        };

        Ok(ActionResult::success(message).with_data(serde_json::to_value(&applied)?))
    }

    pub(super) async fn get_weather(
        &mut self,
        params: &GetWeatherParams,
    ) -> Result<ActionResult, ActionError> {
        let response = self.query.current_weather(params).await?;
        let condition = response.summary.to_condition();
        let applied = self.atmosphere.apply(&condition).await;
        info!("🌡️ live weather synced: {}", applied.condition);

        Ok(ActionResult::success(response.summary.headline()).with_data(response.raw))
    }
}
