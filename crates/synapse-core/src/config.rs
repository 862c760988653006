//! Engine configuration.

use std::path::PathBuf;

/// Tunable knobs for one engine instance.
///
/// The defaults reproduce the reference behaviour; tests override
/// individual fields rather than constructing from scratch.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum workers in flight at once, regardless of wave size.
    pub max_workers: usize,

    /// Simulated worker latency range (ms), used only by the default
    /// worker body.
    pub simulated_delay_ms: (u64, u64),

    /// Performance log hard cap.
    pub performance_log_cap: usize,

    /// Entries retained (newest) when the cap is exceeded.
    pub performance_log_retain: usize,

    /// Where `save_memory` writes the JSON snapshot.
    pub snapshot_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            simulated_delay_ms: (50, 250),
            performance_log_cap: 1000,
            performance_log_retain: 500,
            snapshot_path: PathBuf::from(".synapse/memory.json"),
        }
    }
}
