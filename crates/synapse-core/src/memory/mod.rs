//! Layered memory store.
//!
//! Four layers back the engine's learning loop:
//!
//! 1. **Session**: per-session key/value scratch space, never persisted
//! 2. **Performance log**: append-only execution records, capped
//! 3. **Pattern ledger**: deduplicated optimization patterns
//! 4. **Solution index**: serialized summaries of high-quality requests
//!
//! Everything except the session layer round-trips through a single JSON
//! snapshot. A missing snapshot on load is not an error; the store starts
//! fresh.

use crate::error::{EngineError, Result};
use crate::types::{now_ms, ComplexityLevel};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One task execution, as remembered across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub timestamp: u64,
    pub agent_id: String,
    pub task_id: String,
    pub duration_ms: u64,
    pub success: bool,
    pub complexity: ComplexityLevel,
    pub cluster: String,
}

/// A mined optimization pattern, keyed and deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternEntry {
    pub key: String,
    pub optimization: String,
    pub discovered_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_applied: Option<u64>,
    pub applied_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_duration: Option<f64>,
}

/// A stored outcome of a high-quality request.
///
/// `embedding` is reserved for a future vector index and stays empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSolution {
    pub task_description: String,
    pub solution: String,
    pub stored_at: u64,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// On-disk snapshot format. Session memory is deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemorySnapshot {
    #[serde(rename = "performanceMemory")]
    performance_memory: Vec<PerformanceRecord>,
    #[serde(rename = "skillEvolution")]
    skill_evolution: Vec<PatternEntry>,
    #[serde(rename = "vectorMemory")]
    vector_memory: Vec<TaskSolution>,
    #[serde(rename = "savedAt")]
    saved_at: u64,
}

/// Entry counts per layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStats {
    pub session_entries: usize,
    pub performance_records: usize,
    pub patterns: usize,
    pub solutions: usize,
}

/// The four-layer store. All methods take `&self`; the log layers are
/// guarded so that truncation is atomic with respect to readers.
pub struct MemoryStore {
    session: DashMap<String, serde_json::Value>,
    performance: RwLock<Vec<PerformanceRecord>>,
    patterns: RwLock<Vec<PatternEntry>>,
    solutions: RwLock<Vec<TaskSolution>>,
    cap: usize,
    retain: usize,
}

impl MemoryStore {
    pub fn new(cap: usize, retain: usize) -> Self {
        Self {
            session: DashMap::new(),
            performance: RwLock::new(Vec::new()),
            patterns: RwLock::new(Vec::new()),
            solutions: RwLock::new(Vec::new()),
            cap,
            retain,
        }
    }

    // --- session layer ---

    pub fn session_set(&self, key: impl Into<String>, value: serde_json::Value) {
        self.session.insert(key.into(), value);
    }

    pub fn session_get(&self, key: &str) -> Option<serde_json::Value> {
        self.session.get(key).map(|v| v.clone())
    }

    pub fn session_clear(&self) {
        self.session.clear();
    }

    // --- performance log ---

    /// Append a record, truncating to the newest `retain` entries once the
    /// cap is exceeded.
    pub fn record_performance(&self, record: PerformanceRecord) {
        let mut log = self.performance.write();
        log.push(record);
        if log.len() > self.cap {
            let cut = log.len() - self.retain;
            log.drain(..cut);
            tracing::debug!(retained = self.retain, "performance log truncated");
        }
    }

    pub fn performance_log(&self) -> Vec<PerformanceRecord> {
        self.performance.read().clone()
    }

    /// Mean duration of recorded executions for one cluster, if any exist.
    pub fn cluster_avg_duration(&self, cluster: &str) -> Option<f64> {
        let log = self.performance.read();
        let durations: Vec<u64> = log
            .iter()
            .filter(|r| r.cluster == cluster)
            .map(|r| r.duration_ms)
            .collect();
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<u64>() as f64 / durations.len() as f64)
    }

    // --- pattern ledger ---

    /// Record a pattern. A repeated key increments `applied_count` and
    /// refreshes `last_applied` instead of creating a duplicate entry.
    pub fn record_pattern(
        &self,
        key: impl Into<String>,
        optimization: impl Into<String>,
        quality: Option<f64>,
        avg_duration: Option<f64>,
    ) {
        let key = key.into();
        let mut ledger = self.patterns.write();
        if let Some(existing) = ledger.iter_mut().find(|p| p.key == key) {
            existing.applied_count += 1;
            existing.last_applied = Some(now_ms());
            if quality.is_some() {
                existing.quality = quality;
            }
            if avg_duration.is_some() {
                existing.avg_duration = avg_duration;
            }
            return;
        }
        ledger.push(PatternEntry {
            key,
            optimization: optimization.into(),
            discovered_at: now_ms(),
            last_applied: None,
            applied_count: 1,
            quality,
            avg_duration,
        });
    }

    pub fn patterns(&self) -> Vec<PatternEntry> {
        self.patterns.read().clone()
    }

    // --- solution index ---

    pub fn store_solution(&self, solution: TaskSolution) {
        self.solutions.write().push(solution);
    }

    pub fn solutions(&self) -> Vec<TaskSolution> {
        self.solutions.read().clone()
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            session_entries: self.session.len(),
            performance_records: self.performance.read().len(),
            patterns: self.patterns.read().len(),
            solutions: self.solutions.read().len(),
        }
    }

    // --- persistence ---

    /// Write the snapshot JSON. Session memory is never included.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = MemorySnapshot {
            performance_memory: self.performance.read().clone(),
            skill_evolution: self.patterns.read().clone(),
            vector_memory: self.solutions.read().clone(),
            saved_at: now_ms(),
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "memory snapshot saved");
        Ok(())
    }

    /// Load a snapshot, replacing the persisted layers. A missing file is
    /// not an error; the store simply starts fresh.
    pub fn load(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no memory snapshot; starting fresh");
            return Ok(());
        }
        let json = std::fs::read_to_string(path)?;
        let snapshot: MemorySnapshot = serde_json::from_str(&json)
            .map_err(|e| EngineError::Persistence(format!("malformed snapshot: {e}")))?;
        *self.performance.write() = snapshot.performance_memory;
        *self.patterns.write() = snapshot.skill_evolution;
        *self.solutions.write() = snapshot.vector_memory;
        tracing::info!(path = %path.display(), "memory snapshot loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cluster: &str, duration_ms: u64) -> PerformanceRecord {
        PerformanceRecord {
            timestamp: now_ms(),
            agent_id: "code_agent_v2".to_string(),
            task_id: "a1b2c3d4".to_string(),
            duration_ms,
            success: true,
            complexity: ComplexityLevel::Simple,
            cluster: cluster.to_string(),
        }
    }

    #[test]
    fn test_performance_log_truncates_to_tail() {
        let store = MemoryStore::new(1000, 500);
        for i in 0..1001 {
            store.record_performance(record("coding", i));
        }
        let log = store.performance_log();
        assert_eq!(log.len(), 500);
        // Newest entries survive.
        assert_eq!(log.last().unwrap().duration_ms, 1000);
        assert_eq!(log.first().unwrap().duration_ms, 501);
    }

    #[test]
    fn test_log_never_exceeds_cap() {
        let store = MemoryStore::new(10, 5);
        for i in 0..100 {
            store.record_performance(record("coding", i));
            assert!(store.performance_log().len() <= 10);
        }
    }

    #[test]
    fn test_cluster_avg_duration() {
        let store = MemoryStore::new(1000, 500);
        assert!(store.cluster_avg_duration("coding").is_none());

        store.record_performance(record("coding", 100));
        store.record_performance(record("coding", 300));
        store.record_performance(record("research", 900));

        assert_eq!(store.cluster_avg_duration("coding"), Some(200.0));
        assert_eq!(store.cluster_avg_duration("research"), Some(900.0));
    }

    #[test]
    fn test_pattern_recording_deduplicates() {
        let store = MemoryStore::new(1000, 500);
        for _ in 0..5 {
            store.record_pattern("code:simple", "prefer this pairing", Some(0.9), None);
        }
        let patterns = store.patterns();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].applied_count, 5);
        assert!(patterns[0].last_applied.is_some());
    }

    #[test]
    fn test_first_recording_has_no_last_applied() {
        let store = MemoryStore::new(1000, 500);
        store.record_pattern("fast_execution:code", "fast path", None, Some(42.0));
        let patterns = store.patterns();
        assert_eq!(patterns[0].applied_count, 1);
        assert!(patterns[0].last_applied.is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        let store = MemoryStore::new(1000, 500);
        store.record_performance(record("coding", 120));
        store.record_pattern("code:simple", "pairing", Some(0.85), None);
        store.store_solution(TaskSolution {
            task_description: "list files".to_string(),
            solution: "{\"quality\":0.9}".to_string(),
            stored_at: now_ms(),
            embedding: Vec::new(),
        });
        store.session_set("scratch", serde_json::json!({"k": 1}));
        store.save(&path).unwrap();

        let fresh = MemoryStore::new(1000, 500);
        fresh.load(&path).unwrap();
        assert_eq!(fresh.performance_log(), store.performance_log());
        assert_eq!(fresh.patterns(), store.patterns());
        assert_eq!(fresh.solutions(), store.solutions());
        // Session memory is never persisted.
        assert!(fresh.session_get("scratch").is_none());
    }

    #[test]
    fn test_load_missing_file_is_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(1000, 500);
        store.load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.stats().performance_records, 0);
    }

    #[test]
    fn test_snapshot_wire_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        let store = MemoryStore::new(1000, 500);
        store.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get("performanceMemory").is_some());
        assert!(raw.get("skillEvolution").is_some());
        assert!(raw.get("vectorMemory").is_some());
        assert!(raw.get("savedAt").is_some());
    }
}
