// src/validation/mod.rs

pub mod action;
pub(crate) mod params;

pub use action::{ActionValidationError, validate_action};
