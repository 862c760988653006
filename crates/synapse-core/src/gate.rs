//! Permission gate collaborator interface.
//!
//! The engine never prompts; it consults a caller-supplied predicate for
//! the fixed set of gated actions. Unknown actions are auto-approved and
//! decisions are never cached here.

use std::sync::Arc;

/// Side-effect actions that require gate approval.
pub const GATED_ACTIONS: &[&str] = &[
    "file:write",
    "file:delete",
    "file:rename",
    "file:move",
    "process:execute",
    "network:request",
    "deploy:trigger",
    "config:modify",
    "system:install",
];

/// The gate predicate. Implemented by the host (interactive prompt, policy
/// file, test stub); the engine treats it as opaque.
pub trait PermissionGate: Send + Sync {
    fn may_perform(&self, action: &str, details: &str) -> bool;
}

/// Whether an action is in the gated set at all.
pub fn is_gated(action: &str) -> bool {
    GATED_ACTIONS.contains(&action)
}

/// Gate check with the auto-approval rule applied: actions outside the
/// gated set never reach the collaborator.
pub fn check(gate: &Arc<dyn PermissionGate>, action: &str, details: &str) -> bool {
    if !is_gated(action) {
        return true;
    }
    gate.may_perform(action, details)
}

/// Approves everything. Default for embedding contexts without a prompt.
pub struct AllowAll;

impl PermissionGate for AllowAll {
    fn may_perform(&self, _action: &str, _details: &str) -> bool {
        true
    }
}

/// Denies every gated action. Useful in tests.
pub struct DenyAll;

impl PermissionGate for DenyAll {
    fn may_perform(&self, _action: &str, _details: &str) -> bool {
        false
    }
}
