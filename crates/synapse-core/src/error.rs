//! Error types for the Synapse engine.
//!
//! All engine errors are defined here with `thiserror`. The injected worker
//! boundary uses `anyhow` instead; worker failures are absorbed into failed
//! task results by the wave scheduler and never surface as `EngineError`.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the orchestration engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Raw input was empty or whitespace only. Raised before intent
    /// classification; nothing downstream runs.
    #[error("cannot parse request: input is empty")]
    ParseError,

    /// The spawner's deduplicated candidate pool came up empty. Fatal for
    /// the request.
    #[error("no eligible agents for cluster '{cluster}' at {level} complexity")]
    NoEligibleAgents { cluster: String, level: String },

    /// The DAG builder stalled with nodes remaining. The decomposer cannot
    /// produce cycles, so this is a defensive check.
    #[error("cycle detected in task graph; unschedulable tasks: {0:?}")]
    CycleDetected(Vec<String>),

    /// A task referenced an id that is not present in the graph.
    #[error("unknown task id: {0}")]
    UnknownTask(String),

    /// Snapshot save/load failure. Logged by callers and never propagated
    /// past the persistence boundary; memory continues in-process.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Serialization errors (snapshot encode/decode).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors (snapshot file access).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the error aborts the whole pipeline (as opposed to being
    /// absorbed into per-task results).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = EngineError::NoEligibleAgents {
            cluster: "coding".to_string(),
            level: "complex".to_string(),
        };
        assert!(err.to_string().contains("coding"));

        let err = EngineError::CycleDetected(vec!["a1b2c3d4".to_string()]);
        assert!(err.to_string().contains("a1b2c3d4"));
    }

    #[test]
    fn test_persistence_is_not_fatal() {
        assert!(!EngineError::Persistence("disk full".to_string()).is_fatal());
        assert!(EngineError::ParseError.is_fatal());
    }
}
