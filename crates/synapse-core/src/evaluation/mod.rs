//! Execution evaluation and result aggregation.
//!
//! The evaluator reduces task results to counters and a quality score; the
//! aggregator renders the user-facing summary from them.

use crate::dag::ExecutionResult;
#[cfg(test)]
use crate::dag::TaskResult;
use crate::types::TaskStatus;
use serde::{Deserialize, Serialize};

/// One failed task, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub task_id: String,
    pub error: String,
    pub recoverable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub success_rate: f64,
    pub total_duration_ms: u64,
    pub avg_duration_ms: f64,
    pub errors: Vec<ErrorReport>,
    /// Weighted score in [0, 1]: 0.6 success + 0.2 speed + 0.2 error-free.
    pub quality: f64,
}

/// Stage 7.
#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, execution: &ExecutionResult) -> Evaluation {
        let total = execution.results.len();
        let completed = count(execution, TaskStatus::Completed);
        let failed = count(execution, TaskStatus::Failed);
        let skipped = count(execution, TaskStatus::Skipped);

        let total_duration_ms: u64 = execution.results.iter().map(|r| r.duration_ms).sum();
        let avg_duration_ms = if total > 0 {
            total_duration_ms as f64 / total as f64
        } else {
            0.0
        };
        let success_rate = if total > 0 {
            completed as f64 / total as f64
        } else {
            0.0
        };

        let errors: Vec<ErrorReport> = execution
            .results
            .iter()
            .filter(|r| r.status == TaskStatus::Failed)
            .map(|r| {
                let error = r.error.clone().unwrap_or_default();
                ErrorReport {
                    task_id: r.task_id.clone(),
                    recoverable: !error.contains("fatal"),
                    error,
                }
            })
            .collect();

        let speed_score = (1.0 - avg_duration_ms / 10_000.0).max(0.0);
        let error_score = (1.0 - errors.len() as f64 / 5.0).max(0.0);
        let quality =
            ((0.6 * success_rate + 0.2 * speed_score + 0.2 * error_score) * 100.0).round() / 100.0;

        Evaluation {
            completed,
            failed,
            skipped,
            total,
            success_rate,
            total_duration_ms,
            avg_duration_ms,
            errors,
            quality,
        }
    }
}

fn count(execution: &ExecutionResult, status: TaskStatus) -> usize {
    execution
        .results
        .iter()
        .filter(|r| r.status == status)
        .count()
}

/// Stage 8. Renders the summary the caller shows verbatim.
#[derive(Debug, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(&self, evaluation: &Evaluation, execution: &ExecutionResult) -> String {
        let mut lines = vec![format!(
            "Completed {}/{} tasks in {}ms (quality {:.0}%)",
            evaluation.completed,
            evaluation.total,
            evaluation.total_duration_ms,
            evaluation.quality * 100.0
        )];
        if evaluation.failed > 0 || evaluation.skipped > 0 {
            lines.push(format!(
                "{} failed, {} skipped",
                evaluation.failed, evaluation.skipped
            ));
        }
        for result in &execution.results {
            if result.status == TaskStatus::Completed {
                lines.push(format!(
                    "  - {}: {}",
                    result.description,
                    result.output.as_deref().unwrap_or("")
                ));
            }
        }
        lines.join("\n")
    }
}
