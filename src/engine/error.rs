// src/engine/error.rs

use crate::query::QueryError;
use crate::validation::ActionValidationError;
use crate::viewport::ViewportError;

/// Why a single action failed. Never escapes the engine; it becomes the
/// message of a failed result.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ActionValidationError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("unknown place: {0}")]
    UnknownPlace(String),
    #[error("unknown layer type: {0}")]
    UnknownLayer(String),
    #[error("awaiting confirmation: {0}")]
    AwaitingConfirmation(String),
    #[error("declined: {0}")]
    Declined(String),
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Faults that prevent an engine from being built at all.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no viewport was provided")]
    MissingViewport,
    #[error(transparent)]
    Query(#[from] QueryError),
}
