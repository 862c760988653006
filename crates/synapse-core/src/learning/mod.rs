//! Outcome learning.
//!
//! Stage 9 closes the loop: execution results become performance records,
//! high-quality requests become patterns and stored solutions, and per-agent
//! confidence deltas accumulate until `apply_updates` folds them into the
//! registry. Only confidence weights ever change; no model is trained.

use crate::cognition::{Complexity, Intent};
use crate::dag::ExecutionResult;
use crate::evaluation::Evaluation;
use crate::memory::{MemoryStore, PerformanceRecord, TaskSolution};
use crate::registry::AgentRegistry;
use crate::types::{now_ms, TaskStatus};
use serde::{Deserialize, Serialize};

/// Quality threshold above which a request contributes a pattern and a
/// stored solution.
const QUALITY_THRESHOLD: f64 = 0.8;
/// Successful average duration below which the fast-execution pattern is
/// recorded, in milliseconds.
const FAST_EXECUTION_MS: f64 = 100.0;

/// A queued confidence adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceDelta {
    pub agent_id: String,
    pub delta: f64,
    pub reason: String,
}

/// Stage 9 driver. One instance lives for the engine's lifetime; deltas
/// accumulate across requests until applied.
#[derive(Debug, Default)]
pub struct LearningSystem {
    pending: Vec<ConfidenceDelta>,
}

impl LearningSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[ConfidenceDelta] {
        &self.pending
    }

    /// Digest one finished request.
    ///
    /// Performance records are appended before the deltas are derived, so
    /// the cluster average a result is measured against already includes
    /// this run. A cluster's very first record therefore compares against
    /// itself and never earns the boost.
    pub fn learn(
        &mut self,
        memory: &MemoryStore,
        input: &str,
        intent: &Intent,
        complexity: &Complexity,
        execution: &ExecutionResult,
        evaluation: &Evaluation,
        summary: &str,
    ) {
        for result in &execution.results {
            memory.record_performance(PerformanceRecord {
                timestamp: now_ms(),
                agent_id: result.agent_id.clone().unwrap_or_default(),
                task_id: result.task_id.clone(),
                duration_ms: result.duration_ms,
                success: result.status == TaskStatus::Completed,
                complexity: complexity.level,
                cluster: intent.cluster.clone(),
            });
        }

        self.mine_patterns(memory, intent, complexity, execution, evaluation);

        for result in &execution.results {
            let Some(agent_id) = &result.agent_id else {
                continue;
            };
            match result.status {
                TaskStatus::Completed => {
                    let beats_cluster = memory
                        .cluster_avg_duration(&intent.cluster)
                        .map(|avg| (result.duration_ms as f64) < avg)
                        .unwrap_or(false);
                    if beats_cluster {
                        self.pending.push(ConfidenceDelta {
                            agent_id: agent_id.clone(),
                            delta: 0.02,
                            reason: "faster than cluster average".to_string(),
                        });
                    }
                }
                TaskStatus::Failed => {
                    self.pending.push(ConfidenceDelta {
                        agent_id: agent_id.clone(),
                        delta: -0.05,
                        reason: "task failed".to_string(),
                    });
                }
                _ => {}
            }
        }

        if evaluation.success_rate > QUALITY_THRESHOLD {
            memory.store_solution(TaskSolution {
                task_description: input.to_string(),
                solution: summary.to_string(),
                stored_at: now_ms(),
                embedding: Vec::new(),
            });
        }

        tracing::debug!(
            deltas = self.pending.len(),
            quality = evaluation.quality,
            "learning pass recorded"
        );
    }

    fn mine_patterns(
        &self,
        memory: &MemoryStore,
        intent: &Intent,
        complexity: &Complexity,
        execution: &ExecutionResult,
        evaluation: &Evaluation,
    ) {
        if evaluation.quality > QUALITY_THRESHOLD {
            memory.record_pattern(
                format!("{}:{}", intent.kind, complexity.level),
                format!(
                    "{} requests at {} complexity finish well with this pairing",
                    intent.kind, complexity.level
                ),
                Some(evaluation.quality),
                None,
            );
        }

        let successes: Vec<u64> = execution
            .results
            .iter()
            .filter(|r| r.status == TaskStatus::Completed)
            .map(|r| r.duration_ms)
            .collect();
        if !successes.is_empty() {
            let avg = successes.iter().sum::<u64>() as f64 / successes.len() as f64;
            if avg < FAST_EXECUTION_MS {
                memory.record_pattern(
                    format!("fast_execution:{}", intent.kind),
                    format!("{} tasks resolve quickly; prefer lean allocation", intent.kind),
                    None,
                    Some(avg),
                );
            }
        }
    }

    /// Drain the queue into the registry. Each delta applies exactly once;
    /// the registry clamps to [0.1, 1.0] and rounds to three decimals.
    pub fn apply_updates(&mut self, registry: &mut AgentRegistry) {
        for delta in self.pending.drain(..) {
            registry.apply_confidence_delta(&delta.agent_id, delta.delta);
            tracing::trace!(
                agent = %delta.agent_id,
                delta = delta.delta,
                reason = %delta.reason,
                "confidence delta applied"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cognition::{ComplexityScorer, IntentClassifier, TaskDecomposer};
    use crate::dag::TaskResult;
    use crate::evaluation::Evaluator;
    use crate::registry::{MAX_CONFIDENCE, MIN_CONFIDENCE};

    fn fixtures(input: &str) -> (Intent, Complexity) {
        let intent = IntentClassifier::new().classify(input);
        let decomposition = TaskDecomposer::new().decompose(input, &intent);
        let complexity = ComplexityScorer::new().score(&decomposition);
        (intent, complexity)
    }

    fn completed(agent: &str, duration_ms: u64) -> TaskResult {
        TaskResult {
            task_id: crate::types::short_id(),
            description: "build the api".to_string(),
            status: TaskStatus::Completed,
            output: Some("done".to_string()),
            error: None,
            duration_ms,
            agent_id: Some(agent.to_string()),
            wave: 0,
        }
    }

    fn failed(agent: &str) -> TaskResult {
        TaskResult {
            task_id: crate::types::short_id(),
            description: "deploy".to_string(),
            status: TaskStatus::Failed,
            output: None,
            error: Some("worker refused".to_string()),
            duration_ms: 40,
            agent_id: Some(agent.to_string()),
            wave: 0,
        }
    }

    fn run_learning(
        memory: &MemoryStore,
        learning: &mut LearningSystem,
        input: &str,
        results: Vec<TaskResult>,
    ) -> Evaluation {
        let (intent, complexity) = fixtures(input);
        let execution = ExecutionResult {
            total_tasks: results.len(),
            waves: 1,
            results,
        };
        let evaluation = Evaluator::new().evaluate(&execution);
        learning.learn(
            memory,
            input,
            &intent,
            &complexity,
            &execution,
            &evaluation,
            "summary",
        );
        evaluation
    }

    #[test]
    fn test_performance_recorded_per_result() {
        let memory = MemoryStore::new(1000, 500);
        let mut learning = LearningSystem::new();
        run_learning(
            &memory,
            &mut learning,
            "build the api",
            vec![completed("code_agent_v2", 80), failed("code_agent_v1")],
        );
        let log = memory.performance_log();
        assert_eq!(log.len(), 2);
        assert!(log[0].success);
        assert!(!log[1].success);
        assert_eq!(log[0].cluster, "coding");
    }

    #[test]
    fn test_first_cluster_record_earns_no_boost() {
        let memory = MemoryStore::new(1000, 500);
        let mut learning = LearningSystem::new();
        run_learning(
            &memory,
            &mut learning,
            "build the api",
            vec![completed("code_agent_v2", 80)],
        );
        // The lone record IS the cluster average; 80 < 80 is false.
        assert!(learning.pending().is_empty());
    }

    #[test]
    fn test_faster_than_cluster_average_boost() {
        let memory = MemoryStore::new(1000, 500);
        let mut learning = LearningSystem::new();
        run_learning(
            &memory,
            &mut learning,
            "build the api",
            vec![
                completed("code_agent_v2", 50),
                completed("code_agent_v1", 450),
            ],
        );
        let boosts: Vec<&ConfidenceDelta> = learning
            .pending()
            .iter()
            .filter(|d| d.delta > 0.0)
            .collect();
        assert_eq!(boosts.len(), 1);
        assert_eq!(boosts[0].agent_id, "code_agent_v2");
        assert_eq!(boosts[0].reason, "faster than cluster average");
    }

    #[test]
    fn test_failure_enqueues_penalty() {
        let memory = MemoryStore::new(1000, 500);
        let mut learning = LearningSystem::new();
        run_learning(
            &memory,
            &mut learning,
            "build the api",
            vec![failed("code_agent_v2")],
        );
        assert_eq!(learning.pending().len(), 1);
        assert_eq!(learning.pending()[0].delta, -0.05);
        assert_eq!(learning.pending()[0].reason, "task failed");
    }

    #[test]
    fn test_high_quality_mines_pattern_and_solution() {
        let memory = MemoryStore::new(1000, 500);
        let mut learning = LearningSystem::new();
        let evaluation = run_learning(
            &memory,
            &mut learning,
            "build the api",
            vec![completed("code_agent_v2", 60)],
        );
        assert!(evaluation.quality > 0.8);

        let patterns = memory.patterns();
        assert!(patterns.iter().any(|p| p.key == "code:simple"));
        // 60ms average also trips the fast-execution pattern.
        assert!(patterns.iter().any(|p| p.key == "fast_execution:code"));
        assert_eq!(memory.solutions().len(), 1);
        assert_eq!(memory.solutions()[0].task_description, "build the api");
        assert!(memory.solutions()[0].embedding.is_empty());
    }

    #[test]
    fn test_low_quality_mines_nothing() {
        let memory = MemoryStore::new(1000, 500);
        let mut learning = LearningSystem::new();
        run_learning(
            &memory,
            &mut learning,
            "build the api",
            vec![failed("code_agent_v2"), failed("code_agent_v1")],
        );
        assert!(memory.patterns().is_empty());
        assert!(memory.solutions().is_empty());
    }

    #[test]
    fn test_apply_updates_drains_and_bounds() {
        let memory = MemoryStore::new(1000, 500);
        let mut learning = LearningSystem::new();
        let mut registry = AgentRegistry::with_builtins();

        for _ in 0..30 {
            run_learning(
                &memory,
                &mut learning,
                "build the api",
                vec![failed("code_agent_v2")],
            );
        }
        learning.apply_updates(&mut registry);

        assert!(learning.pending().is_empty());
        let score = registry.get("code_agent_v2").unwrap().confidence_score;
        assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&score));
        assert_eq!(score, (score * 1000.0).round() / 1000.0);
    }
}
