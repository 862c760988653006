//! Shared vocabulary types for the pipeline.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a task inside one request.
///
/// Transitions: `Pending -> (Running -> {Completed, Failed}) | Scheduled |
/// Skipped`. `Scheduled` is assigned during wave extraction; `Skipped` when
/// a transitive dependency failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Scheduled,
    Running,
    Completed,
    Failed,
    Skipped,
}

/// Complexity band for a decomposed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Simple,
    Medium,
    Complex,
}

impl ComplexityLevel {
    /// Inclusive agent-count range for this band.
    pub fn agent_range(&self) -> (usize, usize) {
        match self {
            ComplexityLevel::Simple => (1, 2),
            ComplexityLevel::Medium => (3, 5),
            ComplexityLevel::Complex => (5, 10),
        }
    }

    /// Execution strategy associated with this band.
    pub fn strategy(&self) -> Strategy {
        match self {
            ComplexityLevel::Simple => Strategy::DirectExecution,
            ComplexityLevel::Medium => Strategy::ParallelPool,
            ComplexityLevel::Complex => Strategy::DagStagedWaves,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLevel::Simple => "simple",
            ComplexityLevel::Medium => "medium",
            ComplexityLevel::Complex => "complex",
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an allocation intends the DAG to be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    DirectExecution,
    ParallelPool,
    DagStagedWaves,
}

/// Current time as epoch milliseconds.
pub fn now_ms() -> u64 {
    use std::time::SystemTime;
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Generate a fresh 8-hex-character identifier.
///
/// Collisions within a single decomposition are improbable but still
/// checked by callers, which regenerate on a hit.
pub fn short_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}
