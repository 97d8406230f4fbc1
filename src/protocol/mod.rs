// src/protocol/mod.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod action;
pub mod extract;
pub mod lenient;
pub mod tool_calls;

pub use action::{Action, ActionKind, Target};
pub use extract::{ExtractError, parse_action_list};
pub use tool_calls::{ToolCall, actions_from_tool_calls};

/// One instruction emitted by the assistant.
///
/// Arrives from an untrusted producer, so every field is optional on the
/// wire except `type`, and the parameter map stays loosely typed until
/// validation turns it into an [`Action`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, deserialize_with = "lenient::object")]
    pub parameters: Map<String, Value>,
    #[serde(
        default,
        alias = "wait_for_completion",
        deserialize_with = "lenient::flag"
    )]
    pub wait_for_completion: bool,
    #[serde(
        default,
        alias = "delay",
        alias = "delay_ms",
        deserialize_with = "lenient::millis"
    )]
    pub delay_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Why the descriptor could not be decoded from the reply, if it could not.
    #[serde(skip)]
    pub rejection: Option<String>,
}

impl ActionDescriptor {
    pub fn new(action_type: &str) -> Self {
        Self {
            action_type: action_type.to_string(),
            parameters: Map::new(),
            wait_for_completion: false,
            delay_ms: 0,
            description: None,
            rejection: None,
        }
    }

    /// Stand-in for a list element that did not decode. It keeps its place in
    /// the batch and fails validation with `reason`.
    pub fn rejected(action_type: &str, reason: impl Into<String>) -> Self {
        Self {
            rejection: Some(reason.into()),
            ..Self::new(action_type)
        }
    }

    pub fn param(mut self, name: &str, value: Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }

    pub fn wait_for_completion(mut self) -> Self {
        self.wait_for_completion = true;
        self
    }

    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Label used in logs: the description when present, else the type.
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.action_type)
    }
}

/// Outcome of a single action.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Set when `data` was synthesized locally instead of coming from the
    /// backend.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthesized: bool,
}

impl ActionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            synthesized: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            synthesized: false,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn synthesized(mut self) -> Self {
        self.synthesized = true;
        self
    }
}

pub const SUCCESS_PREFIX: &str = "✅ ";
pub const FAILURE_PREFIX: &str = "❌ ";

/// Aggregated report for one batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub overall_success: bool,
    pub success_count: usize,
    pub failed_count: usize,
    pub per_action_messages: Vec<String>,
    /// Latest payload a caller needs synchronously (weather lookups).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_channel_data: Option<Value>,
    pub results: Vec<ActionResult>,
}

impl ExecutionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: ActionResult, side_channel: bool) {
        if result.success {
            self.success_count += 1;
            self.per_action_messages
                .push(format!("{SUCCESS_PREFIX}{}", result.message));
        } else {
            self.failed_count += 1;
            self.per_action_messages
                .push(format!("{FAILURE_PREFIX}{}", result.message));
        }

        if side_channel {
            if let Some(data) = &result.data {
                self.side_channel_data = Some(data.clone());
            }
        }

        self.overall_success = self.success_count > 0;
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.success_count + self.failed_count
    }
}
