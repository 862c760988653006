//! Agent allocation.
//!
//! Stage 5 pools candidates from the primary and secondary intent clusters,
//! deduplicates them in order, trims the pool to the complexity band's
//! agent count, and assigns every task a non-empty agent list.

use crate::cognition::{Complexity, Decomposition, Intent};
use crate::error::{EngineError, Result};
use crate::registry::{Agent, AgentFilter, AgentRegistry};
use crate::types::{ComplexityLevel, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The selected agents and their per-task assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub agents: Vec<Agent>,
    /// Task id -> assigned agent ids; non-empty for every task.
    pub assignments: HashMap<String, Vec<String>>,
    pub strategy: Strategy,
}

/// Stage 5.
#[derive(Debug, Default)]
pub struct AgentSpawner;

impl AgentSpawner {
    pub fn new() -> Self {
        Self
    }

    pub fn allocate(
        &self,
        registry: &AgentRegistry,
        decomposition: &Decomposition,
        complexity: &Complexity,
        intent: &Intent,
    ) -> Result<Allocation> {
        let level = complexity.level;

        // Primary cluster first, then each secondary cluster in rank order.
        let mut pool =
            registry.find_agents(&AgentFilter::cluster(&intent.cluster).with_complexity(level));
        for secondary in &intent.secondary {
            pool.extend(registry.find_agents(
                &AgentFilter::cluster(&secondary.cluster).with_complexity(level),
            ));
        }

        // Dedupe by id, preserving order.
        let mut seen: HashSet<String> = HashSet::new();
        let pool: Vec<Agent> = pool
            .into_iter()
            .filter(|a| seen.insert(a.id.clone()))
            .collect();

        let take = match level {
            ComplexityLevel::Simple => complexity.agent_count.max(1),
            ComplexityLevel::Medium => complexity.agent_count,
            ComplexityLevel::Complex => pool.len().min(10),
        };
        let selected: Vec<Agent> = pool.into_iter().take(take).collect();

        if selected.is_empty() {
            return Err(EngineError::NoEligibleAgents {
                cluster: intent.cluster.clone(),
                level: level.to_string(),
            });
        }

        let mut assignments = HashMap::new();
        for task in &decomposition.tasks {
            let matching: Vec<String> = selected
                .iter()
                .filter(|a| a.cluster == task.cluster)
                .map(|a| a.id.clone())
                .collect();
            let assigned = if matching.is_empty() {
                vec![selected[0].id.clone()]
            } else {
                matching
            };
            assignments.insert(task.id.clone(), assigned);
        }

        tracing::debug!(
            agents = selected.len(),
            tasks = assignments.len(),
            strategy = ?level.strategy(),
            "agents allocated"
        );

        Ok(Allocation {
            agents: selected,
            assignments,
            strategy: level.strategy(),
        })
    }
}
