use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;

use map_agent_runtime::ActionEngine;
use map_agent_runtime::config::{ExecutionMode, ExecutionPolicy, RuntimeConfig};
use map_agent_runtime::engine::{Approver, FixedApproval};
use map_agent_runtime::protocol::{Action, ActionDescriptor};
use map_agent_runtime::viewport::RecordingViewport;

fn batch() -> Vec<ActionDescriptor> {
    vec![
        ActionDescriptor::new("camera_flyTo").param("city", json!("北京")),
        ActionDescriptor::new("set_weather").param("condition", json!("rain")),
        ActionDescriptor::new("reset"),
    ]
}

fn engine_with(policy: ExecutionPolicy, approver: Option<Arc<dyn Approver>>) -> ActionEngine {
    let mut builder = ActionEngine::builder()
        .viewport(Arc::new(RecordingViewport::new()))
        .config(RuntimeConfig {
            execution: policy,
            ..RuntimeConfig::default()
        });
    if let Some(approver) = approver {
        builder = builder.approver(approver);
    }
    builder.build().unwrap()
}

/// Records what it was asked and approves only the listed types.
struct Approves {
    types: Vec<&'static str>,
    asked: Mutex<Vec<String>>,
}

#[async_trait]
impl Approver for Approves {
    async fn approve(&self, descriptor: &ActionDescriptor, action: &Action) -> bool {
        let kind = action.kind().to_string();
        self.asked.lock().push(descriptor.action_type.clone());
        self.types.contains(&kind.as_str())
    }
}

#[tokio::test]
async fn auto_mode_holds_back_only_listed_types() {
    let mut engine = engine_with(
        ExecutionPolicy {
            mode: ExecutionMode::Auto,
            confirm_required_actions: vec!["set_weather".to_string()],
            auto_approve_actions: Vec::new(),
        },
        None,
    );

    let summary = engine.execute_actions(&batch()).await;

    assert_eq!(
        summary.per_action_messages,
        vec![
            "✅ flew to 北京".to_string(),
            "❌ awaiting confirmation: set_weather".to_string(),
            "✅ view reset".to_string(),
        ]
    );
    assert_eq!(engine.atmosphere().current(), None);
}

#[tokio::test]
async fn confirm_mode_asks_for_everything_not_auto_approved() {
    let approver = Arc::new(Approves {
        types: vec!["set_weather"],
        asked: Mutex::new(Vec::new()),
    });
    let mut engine = engine_with(
        ExecutionPolicy {
            mode: ExecutionMode::Confirm,
            confirm_required_actions: Vec::new(),
            auto_approve_actions: vec!["camera_flyTo".to_string()],
        },
        Some(approver.clone()),
    );

    let summary = engine.execute_actions(&batch()).await;

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.per_action_messages[2], "❌ declined: reset");
    assert_eq!(
        *approver.asked.lock(),
        vec!["set_weather".to_string(), "reset".to_string()]
    );
}

#[tokio::test]
async fn manual_mode_runs_nothing_unapproved() {
    let viewport = RecordingViewport::new();
    let mut engine = ActionEngine::builder()
        .viewport(Arc::new(viewport.clone()))
        .config(RuntimeConfig {
            execution: ExecutionPolicy {
                mode: ExecutionMode::Manual,
                confirm_required_actions: Vec::new(),
                auto_approve_actions: vec!["camera_flyTo".to_string()],
            },
            ..RuntimeConfig::default()
        })
        .build()
        .unwrap();

    let summary = engine.execute_actions(&batch()).await;

    assert_eq!(summary.failed_count, 3);
    assert!(!summary.overall_success);
    assert!(
        summary
            .per_action_messages
            .iter()
            .all(|message| message.starts_with("❌ awaiting confirmation"))
    );
    assert!(viewport.snapshot().flights.is_empty());
}

#[tokio::test]
async fn manual_mode_runs_what_the_approver_accepts() {
    let mut engine = engine_with(
        ExecutionPolicy {
            mode: ExecutionMode::Manual,
            ..ExecutionPolicy::default()
        },
        Some(Arc::new(FixedApproval(true))),
    );

    let summary = engine.execute_actions(&batch()).await;
    assert_eq!(summary.success_count, 3);
}

#[tokio::test]
async fn invalid_actions_fail_before_anyone_is_asked() {
    let approver = Arc::new(Approves {
        types: Vec::new(),
        asked: Mutex::new(Vec::new()),
    });
    let mut engine = engine_with(
        ExecutionPolicy {
            mode: ExecutionMode::Manual,
            ..ExecutionPolicy::default()
        },
        Some(approver.clone()),
    );

    let summary = engine
        .execute_actions(&[
            ActionDescriptor::new("teleport"),
            ActionDescriptor::new("camera_flyTo"),
        ])
        .await;

    assert_eq!(summary.failed_count, 2);
    assert!(approver.asked.lock().is_empty());
}
