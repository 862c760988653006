//! Agent registry.
//!
//! A catalog of named worker profiles grouped by cluster. The registry is
//! built once from fixed seed data and mutated only through metric and
//! confidence updates. Iteration order is insertion order so that ranking
//! ties resolve deterministically.

use crate::types::ComplexityLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod seeds;

pub use seeds::{builtin_agents, builtin_clusters};

/// Lower confidence bound. Failures can never push an agent below this.
pub const MIN_CONFIDENCE: f64 = 0.1;
/// Upper confidence bound.
pub const MAX_CONFIDENCE: f64 = 1.0;
/// Smoothing factor for the execution-time and failure-rate moving averages.
pub const EMA_ALPHA: f64 = 0.3;

/// A named worker profile. Not a thread: agents are selection targets whose
/// confidence is the ranking key for allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub role: String,
    pub cluster: String,
    pub skills: Vec<String>,
    pub supported_levels: Vec<ComplexityLevel>,
    pub confidence_score: f64,
    /// Exponential moving average, seconds.
    pub avg_execution_time: f64,
    pub total_executions: u64,
    pub failure_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    pub fn supports(&self, level: ComplexityLevel) -> bool {
        self.supported_levels.contains(&level)
    }
}

/// A domain grouping of agents. No agent belongs to two clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub description: String,
    pub members: Vec<String>,
}

/// Filter for `find_agents`. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub cluster: Option<String>,
    pub skills: Vec<String>,
    pub complexity: Option<ComplexityLevel>,
}

impl AgentFilter {
    pub fn cluster(cluster: impl Into<String>) -> Self {
        Self {
            cluster: Some(cluster.into()),
            ..Self::default()
        }
    }

    pub fn with_complexity(mut self, level: ComplexityLevel) -> Self {
        self.complexity = Some(level);
        self
    }

    fn matches(&self, agent: &Agent) -> bool {
        if let Some(cluster) = &self.cluster {
            if &agent.cluster != cluster {
                return false;
            }
        }
        if !self.skills.is_empty()
            && !self.skills.iter().any(|s| agent.skills.iter().any(|a| a == s))
        {
            return false;
        }
        if let Some(level) = self.complexity {
            if !agent.supports(level) {
                return false;
            }
        }
        true
    }
}

/// The catalog. Agents live in a `Vec` to preserve insertion order; the id
/// index exists only for O(1) updates.
pub struct AgentRegistry {
    agents: Vec<Agent>,
    index: HashMap<String, usize>,
    clusters: Vec<Cluster>,
}

impl AgentRegistry {
    /// Build the registry from the built-in clusters and agents.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            agents: Vec::new(),
            index: HashMap::new(),
            clusters: builtin_clusters(),
        };
        for agent in builtin_agents() {
            registry.insert(agent);
        }
        tracing::debug!(
            agents = registry.agents.len(),
            clusters = registry.clusters.len(),
            "agent registry initialized"
        );
        registry
    }

    /// Empty registry, for tests exercising the no-eligible-agents path.
    pub fn empty() -> Self {
        Self {
            agents: Vec::new(),
            index: HashMap::new(),
            clusters: Vec::new(),
        }
    }

    fn insert(&mut self, agent: Agent) {
        debug_assert!(
            !self.index.contains_key(&agent.id),
            "duplicate agent id {}",
            agent.id
        );
        if let Some(cluster) = self.clusters.iter_mut().find(|c| c.id == agent.cluster) {
            cluster.members.push(agent.id.clone());
        }
        self.index.insert(agent.id.clone(), self.agents.len());
        self.agents.push(agent);
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.index.get(id).map(|&i| &self.agents[i])
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Filtered lookup, sorted by current confidence descending. The sort
    /// is stable, so equally confident agents keep registration order.
    pub fn find_agents(&self, filter: &AgentFilter) -> Vec<Agent> {
        let mut found: Vec<Agent> = self
            .agents
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        found
    }

    /// Fold one execution into an agent's running metrics.
    ///
    /// Success faster than the agent's own average earns +0.02 confidence;
    /// failure costs 0.05. Both stay inside [MIN_CONFIDENCE, MAX_CONFIDENCE].
    pub fn update_agent_metrics(&mut self, id: &str, duration_ms: u64, failed: bool) {
        let Some(&i) = self.index.get(id) else {
            tracing::warn!(agent = id, "metric update for unknown agent");
            return;
        };
        let agent = &mut self.agents[i];
        let duration_secs = duration_ms as f64 / 1000.0;
        let prev_avg = agent.avg_execution_time;

        agent.total_executions += 1;
        agent.avg_execution_time = (1.0 - EMA_ALPHA) * prev_avg + EMA_ALPHA * duration_secs;
        agent.failure_rate =
            (1.0 - EMA_ALPHA) * agent.failure_rate + EMA_ALPHA * if failed { 1.0 } else { 0.0 };

        if failed {
            agent.confidence_score = (agent.confidence_score - 0.05).max(MIN_CONFIDENCE);
        } else if duration_secs < prev_avg {
            agent.confidence_score = (agent.confidence_score + 0.02).min(MAX_CONFIDENCE);
        }
    }

    /// Apply a batched confidence delta, clamped and rounded to 3 decimals.
    pub fn apply_confidence_delta(&mut self, id: &str, delta: f64) {
        let Some(&i) = self.index.get(id) else {
            tracing::warn!(agent = id, "confidence delta for unknown agent");
            return;
        };
        let agent = &mut self.agents[i];
        let next = (agent.confidence_score + delta).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
        agent.confidence_score = (next * 1000.0).round() / 1000.0;
    }
}
