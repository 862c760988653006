//! Task DAG construction.
//!
//! The builder turns a decomposition into a node map with forward and
//! reverse adjacency, then extracts topological waves by repeated frontier
//! extraction. The decomposer cannot emit cycles (dependencies always point
//! at earlier tasks), so the stall check is defensive.

use crate::cognition::{Decomposition, Task};
use crate::error::{EngineError, Result};
use crate::types::TaskStatus;
use std::collections::{HashMap, HashSet};

pub mod scheduler;

pub use scheduler::{ExecutionResult, TaskResult, WaveScheduler};

/// One node of the execution graph.
#[derive(Debug, Clone)]
pub struct DagNode {
    pub task: Task,
    pub depends_on: HashSet<String>,
    /// Reverse edges, computed at build time: `u.dependents` contains `v`
    /// iff `v.depends_on` contains `u`.
    pub dependents: HashSet<String>,
    pub status: TaskStatus,
    pub result: Option<TaskResult>,
}

/// The execution graph: node map plus the wave partition.
#[derive(Debug)]
pub struct TaskDag {
    nodes: HashMap<String, DagNode>,
    /// Task ids in source-index order; wave dispatch follows this order.
    order: Vec<String>,
    waves: Vec<Vec<String>>,
}

impl TaskDag {
    /// Build the graph and compute its waves.
    pub fn build(decomposition: &Decomposition) -> Result<Self> {
        let mut nodes: HashMap<String, DagNode> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for task in &decomposition.tasks {
            order.push(task.id.clone());
            nodes.insert(
                task.id.clone(),
                DagNode {
                    depends_on: task.depends_on.iter().cloned().collect(),
                    dependents: HashSet::new(),
                    status: TaskStatus::Pending,
                    result: None,
                    task: task.clone(),
                },
            );
        }

        // Reverse adjacency after every node exists.
        for task in &decomposition.tasks {
            for dep in &task.depends_on {
                let dep_node = nodes
                    .get_mut(dep)
                    .ok_or_else(|| EngineError::UnknownTask(dep.clone()))?;
                dep_node.dependents.insert(task.id.clone());
            }
        }

        let waves = extract_waves(&mut nodes, &order)?;
        Ok(Self { nodes, order, waves })
    }

    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&DagNode> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut DagNode> {
        self.nodes.get_mut(id)
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Mark every still-waiting transitive dependent of `failed_id` as
    /// skipped. Returns the ids that were newly skipped.
    pub(crate) fn skip_dependents(&mut self, failed_id: &str) -> Vec<String> {
        let mut skipped = Vec::new();
        let mut frontier: Vec<String> = match self.nodes.get(failed_id) {
            Some(node) => node.dependents.iter().cloned().collect(),
            None => return skipped,
        };
        while let Some(id) = frontier.pop() {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            if matches!(node.status, TaskStatus::Pending | TaskStatus::Scheduled) {
                node.status = TaskStatus::Skipped;
                skipped.push(id.clone());
                frontier.extend(node.dependents.iter().cloned());
            }
        }
        skipped
    }
}

/// Repeated frontier extraction: the next wave is every pending node whose
/// dependencies are all satisfied. An empty frontier with nodes remaining
/// means a cycle.
fn extract_waves(
    nodes: &mut HashMap<String, DagNode>,
    order: &[String],
) -> Result<Vec<Vec<String>>> {
    let mut waves: Vec<Vec<String>> = Vec::new();
    let mut completed: HashSet<String> = HashSet::new();

    while completed.len() < nodes.len() {
        let frontier: Vec<String> = order
            .iter()
            .filter(|id| {
                let node = &nodes[*id];
                node.status == TaskStatus::Pending
                    && node.depends_on.iter().all(|d| completed.contains(d))
            })
            .cloned()
            .collect();

        if frontier.is_empty() {
            let remaining: Vec<String> = order
                .iter()
                .filter(|id| !completed.contains(*id))
                .cloned()
                .collect();
            return Err(EngineError::CycleDetected(remaining));
        }

        for id in &frontier {
            nodes.get_mut(id).expect("frontier id exists").status = TaskStatus::Scheduled;
            completed.insert(id.clone());
        }
        waves.push(frontier);
    }

    Ok(waves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cognition::{Decomposition, IntentClassifier, TaskDecomposer};

    fn decompose(input: &str) -> Decomposition {
        let intent = IntentClassifier::new().classify(input);
        TaskDecomposer::new().decompose(input, &intent)
    }

    #[test]
    fn test_waves_partition_nodes() {
        let d = decompose("plan the schema then build the api and write docs then deploy");
        let dag = TaskDag::build(&d).unwrap();

        let flattened: usize = dag.waves().iter().map(|w| w.len()).sum();
        assert_eq!(flattened, dag.len());

        let mut seen = HashSet::new();
        for wave in dag.waves() {
            for id in wave {
                assert!(seen.insert(id.clone()), "{id} appears in two waves");
            }
        }
    }

    #[test]
    fn test_wave_dependencies_point_earlier() {
        let d = decompose("research then build then deploy the production release");
        let dag = TaskDag::build(&d).unwrap();

        let mut wave_of: HashMap<String, usize> = HashMap::new();
        for (i, wave) in dag.waves().iter().enumerate() {
            for id in wave {
                wave_of.insert(id.clone(), i);
            }
        }
        for wave in dag.waves() {
            for id in wave {
                let node = dag.node(id).unwrap();
                for dep in &node.depends_on {
                    assert!(wave_of[dep] < wave_of[id]);
                }
            }
        }
    }

    #[test]
    fn test_independent_tasks_one_wave() {
        let d = decompose("build API and write tests and deploy");
        let dag = TaskDag::build(&d).unwrap();
        assert_eq!(dag.waves().len(), 1);
        assert_eq!(dag.waves()[0].len(), 3);
    }

    #[test]
    fn test_sequential_chain_one_per_wave() {
        let d = decompose("research OAuth then build API then deploy to production");
        let dag = TaskDag::build(&d).unwrap();
        assert_eq!(dag.waves().len(), 3);
        assert!(dag.waves().iter().all(|w| w.len() == 1));
    }

    #[test]
    fn test_dependents_mirror_depends_on() {
        let d = decompose("research OAuth then build API then deploy to production");
        let dag = TaskDag::build(&d).unwrap();
        for id in dag.order() {
            let node = dag.node(id).unwrap();
            for dep in &node.depends_on {
                assert!(dag.node(dep).unwrap().dependents.contains(id));
            }
            for dependent in &node.dependents {
                assert!(dag.node(dependent).unwrap().depends_on.contains(id));
            }
        }
    }

    #[test]
    fn test_cycle_detected() {
        let mut d = decompose("build the api then write the tests");
        // Manufacture a cycle; the decomposer itself cannot.
        let first = d.tasks[0].id.clone();
        let second = d.tasks[1].id.clone();
        d.tasks[0].depends_on = vec![second];
        d.tasks[1].depends_on = vec![first];

        let err = TaskDag::build(&d).unwrap_err();
        match err {
            EngineError::CycleDetected(remaining) => assert_eq!(remaining.len(), 2),
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn test_skip_dependents_transitive() {
        let d = decompose("research OAuth then build API then deploy to production");
        let mut dag = TaskDag::build(&d).unwrap();
        let root = dag.order()[0].clone();

        let skipped = dag.skip_dependents(&root);
        assert_eq!(skipped.len(), 2);
        for id in &skipped {
            assert_eq!(dag.node(id).unwrap().status, TaskStatus::Skipped);
        }
        // The failed node itself is untouched.
        assert_ne!(dag.node(&root).unwrap().status, TaskStatus::Skipped);
    }

    #[test]
    fn test_empty_graph() {
        let d = Decomposition {
            tasks: Vec::new(),
            has_parallelizable: false,
        };
        let dag = TaskDag::build(&d).unwrap();
        assert!(dag.is_empty());
        assert!(dag.waves().is_empty());
    }
}
