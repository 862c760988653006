//! Wave-by-wave DAG execution.
//!
//! Every node of a wave is dispatched to the worker pool concurrently, and
//! the next wave does not start until the current one has fully settled.
//! The barrier is strict even when some tasks finish early. A failed task
//! pulls its transitive dependents out of later waves as skips.

use crate::allocation::Allocation;
use crate::dag::TaskDag;
use crate::observer::{PipelineEvent, PipelineObserver};
use crate::pool::WorkerPool;
use crate::types::TaskStatus;
use crate::worker::{WorkerContext, WorkerJob};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Outcome of one task, as reported to the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub task_id: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub wave: usize,
}

/// All task results, in settle order per wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub results: Vec<TaskResult>,
    pub waves: usize,
    pub total_tasks: usize,
}

/// Stage 6 driver.
pub struct WaveScheduler {
    pool: Arc<WorkerPool>,
}

impl WaveScheduler {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self { pool }
    }

    pub async fn execute(
        &self,
        dag: &mut TaskDag,
        allocation: &Allocation,
        context: &WorkerContext,
        observer: Option<&dyn PipelineObserver>,
    ) -> ExecutionResult {
        let mut results: Vec<TaskResult> = Vec::new();
        let wave_plan: Vec<Vec<String>> = dag.waves().to_vec();
        let total_waves = wave_plan.len();

        for (wave, ids) in wave_plan.into_iter().enumerate() {
            // Nodes skipped by an earlier failure surface here, without
            // ever reaching the pool.
            let mut runnable: Vec<String> = Vec::new();
            for id in ids {
                let node = dag.node(&id).expect("wave id exists");
                if node.status == TaskStatus::Skipped {
                    let result = TaskResult {
                        task_id: id.clone(),
                        description: node.task.description.clone(),
                        status: TaskStatus::Skipped,
                        output: None,
                        error: None,
                        duration_ms: 0,
                        agent_id: None,
                        wave,
                    };
                    if let Some(node) = dag.node_mut(&id) {
                        node.result = Some(result.clone());
                    }
                    results.push(result);
                } else {
                    runnable.push(id);
                }
            }

            if let Some(obs) = observer {
                obs.on_event(&PipelineEvent::WaveStarted {
                    wave,
                    tasks: runnable.len(),
                });
            }
            tracing::debug!(wave, tasks = runnable.len(), "dispatching wave");

            // Dispatch in task-index order; settle order is whatever the
            // pool produces.
            type Settled = (
                String,
                String,
                Option<String>,
                u64,
                anyhow::Result<crate::worker::WorkerOutput>,
            );
            let mut join_set: JoinSet<Settled> = JoinSet::new();
            for id in runnable {
                let node = dag.node_mut(&id).expect("runnable id exists");
                node.status = TaskStatus::Running;
                let description = node.task.description.clone();

                let agent_ids = allocation
                    .assignments
                    .get(&id)
                    .cloned()
                    .unwrap_or_default();
                let lead_agent = agent_ids.first().cloned();

                if let (Some(obs), Some(agent)) = (observer, &lead_agent) {
                    obs.on_event(&PipelineEvent::TaskDispatched {
                        wave,
                        task_id: id.clone(),
                        agent_id: agent.clone(),
                    });
                }

                let job = WorkerJob {
                    task_id: id.clone(),
                    description: description.clone(),
                    agent_ids,
                    context: context.clone(),
                };
                let pool = self.pool.clone();
                join_set.spawn(async move {
                    let started = Instant::now();
                    let outcome = pool.execute(job).await;
                    (
                        id,
                        description,
                        lead_agent,
                        started.elapsed().as_millis() as u64,
                        outcome,
                    )
                });
            }

            // Strict barrier: everything settles before the wave closes.
            let mut wave_failures: Vec<String> = Vec::new();
            let mut wave_completed = 0usize;
            while let Some(joined) = join_set.join_next().await {
                let result = match joined {
                    Ok((task_id, description, agent_id, duration_ms, Ok(output))) => {
                        wave_completed += 1;
                        TaskResult {
                            task_id,
                            description,
                            status: TaskStatus::Completed,
                            output: Some(output.output),
                            error: None,
                            duration_ms,
                            agent_id,
                            wave,
                        }
                    }
                    Ok((task_id, description, agent_id, duration_ms, Err(err))) => {
                        wave_failures.push(task_id.clone());
                        TaskResult {
                            task_id,
                            description,
                            status: TaskStatus::Failed,
                            output: None,
                            error: Some(err.to_string()),
                            duration_ms,
                            agent_id,
                            wave,
                        }
                    }
                    // The harness itself blew up; there is no task identity
                    // left to report.
                    Err(join_err) => TaskResult {
                        task_id: String::new(),
                        description: String::new(),
                        status: TaskStatus::Failed,
                        output: None,
                        error: Some(join_err.to_string()),
                        duration_ms: 0,
                        agent_id: None,
                        wave,
                    },
                };
                if let Some(node) = dag.node_mut(&result.task_id) {
                    node.status = result.status;
                    node.result = Some(result.clone());
                }
                results.push(result);
            }

            // Skip propagation happens between waves, never mid-wave.
            let mut skipped = 0usize;
            for failed in &wave_failures {
                skipped += dag.skip_dependents(failed).len();
            }
            if !wave_failures.is_empty() {
                tracing::warn!(
                    wave,
                    failed = wave_failures.len(),
                    skipped,
                    "wave settled with failures"
                );
            }

            if let Some(obs) = observer {
                obs.on_event(&PipelineEvent::WaveCompleted {
                    wave,
                    completed: wave_completed,
                    failed: wave_failures.len(),
                    skipped,
                });
            }
        }

        ExecutionResult {
            results,
            waves: total_waves,
            total_tasks: dag.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::AgentSpawner;
    use crate::cognition::{ComplexityScorer, IntentClassifier, TaskDecomposer};
    use crate::gate::AllowAll;
    use crate::registry::AgentRegistry;
    use crate::worker::{SimulatedWorker, Worker, WorkerOutput};
    use async_trait::async_trait;

    struct FailOn(&'static str);

    #[async_trait]
    impl Worker for FailOn {
        async fn execute(&self, job: &WorkerJob) -> anyhow::Result<WorkerOutput> {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            if job.description.contains(self.0) {
                anyhow::bail!("worker refused: {}", job.description);
            }
            Ok(WorkerOutput {
                output: format!("done: {}", job.description),
                metadata: Default::default(),
            })
        }
    }

    async fn run(input: &str, worker: Arc<dyn Worker>) -> (TaskDag, ExecutionResult) {
        let registry = AgentRegistry::with_builtins();
        let intent = IntentClassifier::new().classify(input);
        let decomposition = TaskDecomposer::new().decompose(input, &intent);
        let complexity = ComplexityScorer::new().score(&decomposition);
        let allocation = AgentSpawner::new()
            .allocate(&registry, &decomposition, &complexity, &intent)
            .unwrap();
        let mut dag = TaskDag::build(&decomposition).unwrap();
        let scheduler = WaveScheduler::new(Arc::new(WorkerPool::new(worker, 8)));
        let context = WorkerContext {
            session: "test".to_string(),
            gate: Arc::new(AllowAll),
        };
        let result = scheduler.execute(&mut dag, &allocation, &context, None).await;
        (dag, result)
    }

    #[tokio::test]
    async fn test_all_tasks_complete() {
        let (_, result) = run(
            "build API and write tests and ship docs",
            Arc::new(SimulatedWorker::new((1, 5))),
        )
        .await;
        assert_eq!(result.total_tasks, 3);
        assert_eq!(result.waves, 1);
        assert!(result
            .results
            .iter()
            .all(|r| r.status == TaskStatus::Completed));
        assert!(result.results.iter().all(|r| r.agent_id.is_some()));
    }

    #[tokio::test]
    async fn test_results_tagged_with_wave() {
        let (_, result) = run(
            "research OAuth then build API then deploy to production",
            Arc::new(SimulatedWorker::new((1, 5))),
        )
        .await;
        assert_eq!(result.waves, 3);
        let waves: Vec<usize> = result.results.iter().map(|r| r.wave).collect();
        assert_eq!(waves, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_terminal_failure_skips_nothing() {
        let (_, result) = run(
            "research OAuth then build API then deploy to production",
            Arc::new(FailOn("deploy")),
        )
        .await;
        let completed = result
            .results
            .iter()
            .filter(|r| r.status == TaskStatus::Completed)
            .count();
        let failed = result
            .results
            .iter()
            .filter(|r| r.status == TaskStatus::Failed)
            .count();
        let skipped = result
            .results
            .iter()
            .filter(|r| r.status == TaskStatus::Skipped)
            .count();
        assert_eq!((completed, failed, skipped), (2, 1, 0));
    }

    #[tokio::test]
    async fn test_root_failure_skips_dependents() {
        let (dag, result) = run(
            "research OAuth then build API then deploy to production",
            Arc::new(FailOn("research")),
        )
        .await;
        let failed: Vec<&TaskResult> = result
            .results
            .iter()
            .filter(|r| r.status == TaskStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].error.as_ref().unwrap().contains("worker refused"));

        let skipped: Vec<&TaskResult> = result
            .results
            .iter()
            .filter(|r| r.status == TaskStatus::Skipped)
            .collect();
        assert_eq!(skipped.len(), 2);
        for r in &skipped {
            assert_eq!(r.duration_ms, 0);
            assert!(r.output.is_none());
            assert_eq!(dag.node(&r.task_id).unwrap().status, TaskStatus::Skipped);
        }
        // Skips surface at their own waves; every result is still reported.
        assert_eq!(result.results.len(), result.total_tasks);
    }

    #[tokio::test]
    async fn test_barrier_orders_waves() {
        let observer = crate::observer::tests_support::RecordingObserver::default();
        let registry = AgentRegistry::with_builtins();
        let input = "build the api then write the tests";
        let intent = IntentClassifier::new().classify(input);
        let decomposition = TaskDecomposer::new().decompose(input, &intent);
        let complexity = ComplexityScorer::new().score(&decomposition);
        let allocation = AgentSpawner::new()
            .allocate(&registry, &decomposition, &complexity, &intent)
            .unwrap();
        let mut dag = TaskDag::build(&decomposition).unwrap();
        let scheduler = WaveScheduler::new(Arc::new(WorkerPool::new(
            Arc::new(SimulatedWorker::new((1, 5))),
            8,
        )));
        let context = WorkerContext {
            session: "test".to_string(),
            gate: Arc::new(AllowAll),
        };
        scheduler
            .execute(&mut dag, &allocation, &context, Some(&observer))
            .await;

        // WaveStarted(0) .. WaveCompleted(0) .. WaveStarted(1): strictly
        // sequential wave lifecycles.
        let events = observer.events();
        let lifecycle: Vec<(bool, usize)> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::WaveStarted { wave, .. } => Some((true, *wave)),
                PipelineEvent::WaveCompleted { wave, .. } => Some((false, *wave)),
                _ => None,
            })
            .collect();
        assert_eq!(
            lifecycle,
            vec![(true, 0), (false, 0), (true, 1), (false, 1)]
        );
    }
}
