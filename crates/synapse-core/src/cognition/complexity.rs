//! Complexity scoring.
//!
//! Scores a decomposition on subtask count, dependency density, and risk
//! vocabulary, then maps the score to a band that drives agent counts and
//! the execution strategy.

use crate::cognition::decompose::Decomposition;
use crate::types::ComplexityLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Terms that raise the risk factor by 0.2 per occurrence.
pub const RISK_KEYWORDS: &[&str] = &[
    "deploy",
    "delete",
    "production",
    "database",
    "migration",
    "security",
    "authentication",
    "payment",
    "critical",
    "infrastructure",
];

/// Risk factor ceiling.
const RISK_CAP: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityDetails {
    pub subtask_count: usize,
    pub dependency_weight: f64,
    pub risk_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complexity {
    pub score: f64,
    pub level: ComplexityLevel,
    pub agent_count: usize,
    pub waves: usize,
    pub details: ComplexityDetails,
}

/// Stage 4.
#[derive(Debug, Default)]
pub struct ComplexityScorer;

impl ComplexityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, decomposition: &Decomposition) -> Complexity {
        let subtask_count = decomposition.tasks.len();
        let total_deps: usize = decomposition
            .tasks
            .iter()
            .map(|t| t.depends_on.len())
            .sum();
        let dependency_weight = 1.0 + total_deps as f64 / subtask_count.max(1) as f64;

        let mut risk_factor = 1.0;
        for task in &decomposition.tasks {
            let description = task.description.to_lowercase();
            for keyword in RISK_KEYWORDS {
                risk_factor += 0.2 * description.matches(keyword).count() as f64;
            }
        }
        risk_factor = risk_factor.min(RISK_CAP);

        let score =
            (subtask_count as f64 * dependency_weight * risk_factor * 10.0).round() / 10.0;

        let level = if score <= 3.0 {
            ComplexityLevel::Simple
        } else if score < 7.0 {
            ComplexityLevel::Medium
        } else {
            ComplexityLevel::Complex
        };

        let (lo, hi) = level.agent_range();
        let agent_count =
            (lo as f64 + (score / 10.0).min(1.0) * (hi - lo) as f64).round() as usize;

        Complexity {
            score,
            level,
            agent_count,
            waves: wave_count(decomposition),
            details: ComplexityDetails {
                subtask_count,
                dependency_weight,
                risk_factor,
            },
        }
    }
}

/// Number of scheduling waves: one more than the deepest dependency level,
/// with roots at level zero. Dependencies always point at earlier tasks, so
/// a single in-order pass suffices.
fn wave_count(decomposition: &Decomposition) -> usize {
    if decomposition.tasks.is_empty() {
        return 0;
    }
    let mut levels: HashMap<&str, usize> = HashMap::new();
    let mut deepest = 0;
    for task in &decomposition.tasks {
        let level = task
            .depends_on
            .iter()
            .filter_map(|dep| levels.get(dep.as_str()))
            .max()
            .map(|&l| l + 1)
            .unwrap_or(0);
        levels.insert(task.id.as_str(), level);
        deepest = deepest.max(level);
    }
    deepest + 1
}
