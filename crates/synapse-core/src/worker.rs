//! The injected worker seam.
//!
//! A worker executes one task and returns an output record or an error.
//! This trait is the only injection point for a real LLM backend; the
//! engine validates the contract at this boundary and nowhere else. The
//! default body is a deterministic-shape simulator.

use crate::gate::PermissionGate;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Everything a worker gets to see about its task.
#[derive(Clone)]
pub struct WorkerJob {
    pub task_id: String,
    pub description: String,
    /// Assigned agent ids, strongest first.
    pub agent_ids: Vec<String>,
    pub context: WorkerContext,
}

/// Collaborator handles threaded through to the worker body.
#[derive(Clone)]
pub struct WorkerContext {
    pub session: String,
    pub gate: Arc<dyn PermissionGate>,
}

/// What a worker hands back on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerOutput {
    pub output: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// An opaque task executor. Implementations may call out to anything; the
/// engine only sees success or failure.
#[async_trait]
pub trait Worker: Send + Sync {
    async fn execute(&self, job: &WorkerJob) -> anyhow::Result<WorkerOutput>;
}

/// Default worker body: sleeps a bounded random latency and echoes the
/// lead agent and the task description.
pub struct SimulatedWorker {
    delay_ms: (u64, u64),
}

impl SimulatedWorker {
    pub fn new(delay_ms: (u64, u64)) -> Self {
        Self { delay_ms }
    }
}

impl Default for SimulatedWorker {
    fn default() -> Self {
        Self::new((50, 250))
    }
}

#[async_trait]
impl Worker for SimulatedWorker {
    async fn execute(&self, job: &WorkerJob) -> anyhow::Result<WorkerOutput> {
        let (lo, hi) = self.delay_ms;
        let delay = rand::thread_rng().gen_range(lo..=hi);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let agent = job.agent_ids.first().map(String::as_str).unwrap_or("unassigned");
        Ok(WorkerOutput {
            output: format!("[{agent}] completed: {}", job.description),
            metadata: HashMap::from([(
                "simulatedDelayMs".to_string(),
                serde_json::json!(delay),
            )]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::AllowAll;

    fn job(description: &str) -> WorkerJob {
        WorkerJob {
            task_id: "a1b2c3d4".to_string(),
            description: description.to_string(),
            agent_ids: vec!["code_agent_v2".to_string()],
            context: WorkerContext {
                session: "test".to_string(),
                gate: Arc::new(AllowAll),
            },
        }
    }

    #[tokio::test]
    async fn test_simulator_echoes_agent_and_description() {
        let worker = SimulatedWorker::new((1, 2));
        let output = worker.execute(&job("list files")).await.unwrap();
        assert!(output.output.contains("code_agent_v2"));
        assert!(output.output.contains("list files"));
        assert!(output.metadata.contains_key("simulatedDelayMs"));
    }

    #[tokio::test]
    async fn test_simulator_latency_within_bounds() {
        let worker = SimulatedWorker::new((10, 20));
        let start = std::time::Instant::now();
        worker.execute(&job("anything")).await.unwrap();
        let elapsed = start.elapsed().as_millis();
        assert!(elapsed >= 10);
    }
}
