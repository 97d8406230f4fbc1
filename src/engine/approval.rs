// src/engine/approval.rs

use async_trait::async_trait;

use crate::protocol::{Action, ActionDescriptor};

/// Asked before running any action the execution policy holds back.
///
/// Implementations typically forward the request to a UI and wait for the
/// user's answer. Returning `false` declines the action; the batch continues.
#[async_trait]
pub trait Approver: Send + Sync {
    async fn approve(&self, descriptor: &ActionDescriptor, action: &Action) -> bool;
}

/// Approves or declines everything. Useful for scripted runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedApproval(pub bool);

#[async_trait]
impl Approver for FixedApproval {
    async fn approve(&self, _descriptor: &ActionDescriptor, _action: &Action) -> bool {
        self.0
    }
}
