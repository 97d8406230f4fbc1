// src/events/mod.rs

//! Layer-change notifications and the picker that applies them.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::viewport::{ImageryProvider, Viewport, ViewportError};

const AMAP_CREDIT: &str = "高德地图";

/// Layer types a `layer_switch` action may name.
pub const LAYER_TYPES: [&str; 3] = ["satellite", "street", "osm"];

/// Resolves a layer type to its imagery provider. Case-insensitive.
pub fn imagery_provider(layer_type: &str) -> Option<ImageryProvider> {
    let provider = match layer_type.trim().to_ascii_lowercase().as_str() {
        "satellite" => ImageryProvider {
            name: "satellite".to_string(),
            url_template: "https://webst02.is.autonavi.com/appmaptile?style=6&x={x}&y={y}&z={z}&scale=1"
                .to_string(),
            credit: AMAP_CREDIT.to_string(),
            minimum_level: 3,
            maximum_level: 18,
        },
        "street" => ImageryProvider {
            name: "street".to_string(),
            url_template: "https://webrd02.is.autonavi.com/appmaptile?style=7&x={x}&y={y}&z={z}&scale=1"
                .to_string(),
            credit: AMAP_CREDIT.to_string(),
            minimum_level: 3,
            maximum_level: 18,
        },
        "osm" => ImageryProvider {
            name: "osm".to_string(),
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            credit: "© OpenStreetMap contributors".to_string(),
            minimum_level: 0,
            maximum_level: 19,
        },
        _ => return None,
    };
    Some(provider)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerChange {
    pub layer_type: String,
    pub provider: ImageryProvider,
}

/// Broadcast channel for layer changes. Emission never blocks; changes sent
/// while nobody listens are dropped.
pub struct LayerBus {
    sender: broadcast::Sender<LayerChange>,
}

impl LayerBus {
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Returns how many subscribers received the change.
    pub fn emit(&self, change: LayerChange) -> usize {
        self.sender.send(change).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LayerChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LayerBus {
    fn default() -> Self {
        Self::new(16)
    }
}

impl std::fmt::Debug for LayerBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}

/// Swaps the viewport's base imagery whenever a layer change arrives.
pub struct LayerPicker {
    viewport: Arc<dyn Viewport>,
}

impl LayerPicker {
    pub fn new(viewport: Arc<dyn Viewport>) -> Self {
        Self { viewport }
    }

    pub async fn apply(&self, change: &LayerChange) -> Result<(), ViewportError> {
        self.viewport.switch_base_imagery(&change.provider).await?;
        info!("🗺️ base imagery switched to {}", change.layer_type);
        Ok(())
    }

    /// Consumes changes until every sender is gone.
    pub async fn run(self, mut changes: broadcast::Receiver<LayerChange>) {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if let Err(err) = self.apply(&change).await {
                        warn!("⚠️ could not switch imagery to {}: {}", change.layer_type, err);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("layer picker skipped {} stale changes", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    pub fn spawn(self, changes: broadcast::Receiver<LayerChange>) -> JoinHandle<()> {
        tokio::spawn(self.run(changes))
    }
}
