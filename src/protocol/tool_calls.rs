// src/protocol/tool_calls.rs

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::protocol::ActionDescriptor;

/// A function call as returned by chat-completion APIs.
#[derive(Clone, Debug, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub function: FunctionCall,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Usually a JSON-encoded string; some providers send an object.
    #[serde(default)]
    pub arguments: Value,
}

/// Converts tool calls into descriptors, one per call, in order.
///
/// Arguments that fail to parse become an empty parameter map so the action
/// still reaches the engine and fails validation there with a precise reason.
pub fn actions_from_tool_calls(calls: &[ToolCall]) -> Vec<ActionDescriptor> {
    calls
        .iter()
        .map(|call| {
            let mut descriptor = ActionDescriptor::new(&call.function.name);
            descriptor.parameters = parse_arguments(&call.function.name, &call.function.arguments);
            descriptor
        })
        .collect()
}

fn parse_arguments(name: &str, arguments: &Value) -> Map<String, Value> {
    match arguments {
        Value::Object(map) => map.clone(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!("⚠️ unparseable arguments for tool call {}: {}", name, raw);
                Map::new()
            }
        },
        _ => Map::new(),
    }
}
