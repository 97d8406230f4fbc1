// src/lib.rs

pub mod atmosphere;
pub mod config;
pub mod engine;
pub mod events;
pub mod geo;
pub mod logging;
pub mod protocol;
pub mod query;
pub mod validation;
pub mod viewport;

pub use engine::{ActionEngine, ActionError, EngineError};
pub use protocol::{ActionDescriptor, ActionResult, ExecutionSummary};
