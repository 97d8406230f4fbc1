// src/engine/mod.rs

//! Sequential executor for assistant-produced action lists.
//!
//! [`ActionEngine::execute_actions`] runs each descriptor in input order:
//! optional delay, validation into a typed [`Action`], the execution policy
//! (with an [`Approver`] asked for held-back types), a readiness check for
//! actions that touch the viewport, then the handler. Whatever a handler
//! does (error, panic, remote outage) ends up as one failed
//! [`ActionResult`] and the batch carries on.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::atmosphere::AtmosphereController;
use crate::config::RuntimeConfig;
use crate::events::{LayerBus, LayerChange};
use crate::geo::LocationResolver;
use crate::protocol::{
    Action, ActionDescriptor, ActionKind, ActionResult, ExecutionSummary, ExtractError, ToolCall,
    actions_from_tool_calls, parse_action_list,
};
use crate::query::QueryClient;
use crate::validation::validate_action;
use crate::viewport::{MarkerHandle, Viewport};

pub mod approval;
pub mod error;
mod handlers;
mod readiness;

pub use approval::{Approver, FixedApproval};
pub use error::{ActionError, EngineError};

pub struct ActionEngine {
    viewport: Arc<dyn Viewport>,
    resolver: LocationResolver,
    atmosphere: AtmosphereController,
    query: QueryClient,
    layers: LayerBus,
    config: RuntimeConfig,
    approver: Option<Arc<dyn Approver>>,
    highlights: Vec<MarkerHandle>,
}

#[derive(Default)]
pub struct ActionEngineBuilder {
    viewport: Option<Arc<dyn Viewport>>,
    resolver: Option<LocationResolver>,
    config: Option<RuntimeConfig>,
    layers: Option<LayerBus>,
    approver: Option<Arc<dyn Approver>>,
}

impl ActionEngineBuilder {
    pub fn viewport(mut self, viewport: Arc<dyn Viewport>) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn resolver(mut self, resolver: LocationResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn layer_bus(mut self, layers: LayerBus) -> Self {
        self.layers = Some(layers);
        self
    }

    /// Without an approver, held-back actions fail as awaiting confirmation.
    pub fn approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = Some(approver);
        self
    }

    pub fn build(self) -> Result<ActionEngine, EngineError> {
        let viewport = self.viewport.ok_or(EngineError::MissingViewport)?;
        let config = self.config.unwrap_or_default();
        let query = QueryClient::new(&config)?;

        Ok(ActionEngine {
            atmosphere: AtmosphereController::new(Arc::clone(&viewport)),
            viewport,
            resolver: self.resolver.unwrap_or_default(),
            query,
            layers: self.layers.unwrap_or_default(),
            config,
            approver: self.approver,
            highlights: Vec::new(),
        })
    }
}

impl ActionEngine {
    pub fn builder() -> ActionEngineBuilder {
        ActionEngineBuilder::default()
    }

    /// Engine with default configuration and gazetteer.
    pub fn new(viewport: Arc<dyn Viewport>) -> Result<Self, EngineError> {
        Self::builder().viewport(viewport).build()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn atmosphere(&self) -> &AtmosphereController {
        &self.atmosphere
    }

    /// Receives every layer change emitted by `layer_switch` actions.
    pub fn subscribe_layers(&self) -> broadcast::Receiver<LayerChange> {
        self.layers.subscribe()
    }

    /// Runs a batch to completion. Never fails: every problem is reported
    /// through the returned summary.
    pub async fn execute_actions(&mut self, descriptors: &[ActionDescriptor]) -> ExecutionSummary {
        let total = descriptors.len();
        let mut summary = ExecutionSummary::new();
        info!("🚀 executing {} actions", total);

        for (index, descriptor) in descriptors.iter().enumerate() {
            if descriptor.delay_ms > 0 {
                debug!("⏳ waiting {} ms before {}", descriptor.delay_ms, descriptor.label());
                tokio::time::sleep(Duration::from_millis(descriptor.delay_ms)).await;
            }

            info!("▶️ [{}/{}] {}", index + 1, total, descriptor.label());
            let result = self.run_guarded(descriptor).await;

            if result.success {
                info!("✅ {}", result.message);
            } else {
                warn!("❌ {} failed: {}", descriptor.action_type, result.message);
            }

            let side_channel =
                ActionKind::from_type(&descriptor.action_type) == Some(ActionKind::GetWeather);
            summary.record(result, side_channel);
        }

        info!(
            "🏁 batch finished: {} succeeded, {} failed",
            summary.success_count, summary.failed_count
        );
        summary
    }

    /// Extracts an action list from a raw assistant reply and runs it.
    pub async fn execute_reply(&mut self, reply: &str) -> Result<ExecutionSummary, ExtractError> {
        let descriptors = parse_action_list(reply)?;
        Ok(self.execute_actions(&descriptors).await)
    }

    pub async fn execute_tool_calls(&mut self, calls: &[ToolCall]) -> ExecutionSummary {
        let descriptors = actions_from_tool_calls(calls);
        self.execute_actions(&descriptors).await
    }

    /// Removes every marker and overlay the engine has added.
    pub async fn clear_overlays(&mut self) -> Result<usize, ActionError> {
        self.highlights.clear();
        let removed = self.viewport.remove_all_managed_markers().await?;
        info!("🧹 removed {} overlays", removed);
        Ok(removed)
    }

    async fn run_guarded(&mut self, descriptor: &ActionDescriptor) -> ActionResult {
        match AssertUnwindSafe(self.dispatch(descriptor)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => ActionResult::failure(err.to_string()),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("💥 handler for {} panicked: {}", descriptor.action_type, message);
                ActionResult::failure(format!("handler panicked: {message}"))
            }
        }
    }

    async fn dispatch(&mut self, descriptor: &ActionDescriptor) -> Result<ActionResult, ActionError> {
        let action = validate_action(descriptor)?;
        self.check_policy(descriptor, &action).await?;

        if action.kind().touches_viewport() {
            readiness::wait_until_ready(
                self.viewport.as_ref(),
                self.config.readiness_attempts,
                self.config.readiness_backoff,
            )
            .await?;
        }

        let wait = descriptor.wait_for_completion;
        match action {
            Action::FlyTo(params) => self.fly_to(&params, wait).await,
            Action::SetView(params) => self.set_view(&params).await,
            Action::Reset => self.reset(wait).await,
            Action::QueryBuildings(query) => self.query_buildings(&query).await,
            Action::HighlightBuildings(params) => self.highlight_buildings(&params).await,
            Action::LayerSwitch { layer_type } => self.switch_layer(&layer_type),
            Action::SpatialBuffer(params) => self.spatial_buffer(&params).await,
            Action::SpatialViewshed(params) => self.spatial_viewshed(&params).await,
            Action::SpatialAccessibility(params) => self.spatial_accessibility(&params).await,
            Action::SetWeather(params) => self.set_weather(&params).await,
            Action::GetWeather(params) => self.get_weather(&params).await,
        }
    }
}

impl ActionEngine {
    async fn check_policy(
        &self,
        descriptor: &ActionDescriptor,
        action: &Action,
    ) -> Result<(), ActionError> {
        let kind = action.kind();
        if !self.config.execution.requires_approval(kind) {
            return Ok(());
        }

        let Some(approver) = &self.approver else {
            info!("✋ {} awaits confirmation", kind);
            return Err(ActionError::AwaitingConfirmation(kind.to_string()));
        };

        if approver.approve(descriptor, action).await {
            debug!("👍 {} approved", kind);
            Ok(())
        } else {
            info!("🚫 {} declined", kind);
            Err(ActionError::Declined(kind.to_string()))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
