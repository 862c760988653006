//! Prose-to-task decomposition.
//!
//! The decomposer splits a request on connector words and sentence
//! punctuation, then turns the surviving fragments into tasks. A fragment
//! preceded by a sequence marker depends on the previous task; everything
//! else is a root and can run in the first wave.

use crate::cognition::intent::Intent;
use crate::types::{short_id, TaskStatus};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Connector words the splitter breaks on (whole words only).
pub const CONNECTORS: &[&str] = &["and", "then", "also", "plus", "with", "after"];

/// Connectors that order the fragments they precede after the previous one.
pub const SEQUENCE_MARKERS: &[&str] = &["then", "after", "once", "when", "finally", "next"];

/// One unit of schedulable work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Position in source order; dependencies always point at smaller
    /// indices.
    pub index: usize,
    pub description: String,
    pub kind: String,
    pub cluster: String,
    pub depends_on: Vec<String>,
    pub status: TaskStatus,
    pub priority: u8,
}

/// Ordered tasks plus whether at least two of them are roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decomposition {
    pub tasks: Vec<Task>,
    pub has_parallelizable: bool,
}

/// Stage 3.
#[derive(Debug)]
pub struct TaskDecomposer {
    splitter: Regex,
}

impl Default for TaskDecomposer {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskDecomposer {
    pub fn new() -> Self {
        // Word connectors as a captured alternation so the preceding
        // connector of each fragment is known; bare punctuation splits
        // without creating an ordering edge.
        let splitter = Regex::new(r"(?i)\b(and|then|also|plus|with|after)\b|[.;]\s*")
            .expect("static splitter pattern");
        Self { splitter }
    }

    pub fn decompose(&self, input: &str, intent: &Intent) -> Decomposition {
        let fragments = self.split(input);

        let mut tasks: Vec<Task> = Vec::new();
        let mut used_ids: HashSet<String> = HashSet::new();

        for (description, connector) in fragments {
            let depends_on = match (&connector, tasks.last()) {
                (Some(word), Some(prev)) if SEQUENCE_MARKERS.contains(&word.as_str()) => {
                    vec![prev.id.clone()]
                }
                _ => Vec::new(),
            };
            let index = tasks.len();
            tasks.push(Task {
                id: fresh_id(&mut used_ids),
                index,
                description: description.clone(),
                kind: intent.kind.clone(),
                cluster: intent.cluster.clone(),
                depends_on,
                status: TaskStatus::Pending,
                priority: priority_for(intent, &description),
            });
        }

        if tasks.is_empty() {
            tasks.push(Task {
                id: fresh_id(&mut used_ids),
                index: 0,
                description: input.trim().to_string(),
                kind: intent.kind.clone(),
                cluster: intent.cluster.clone(),
                depends_on: Vec::new(),
                status: TaskStatus::Pending,
                priority: priority_for(intent, input),
            });
        }

        let roots = tasks.iter().filter(|t| t.depends_on.is_empty()).count();
        Decomposition {
            has_parallelizable: roots >= 2,
            tasks,
        }
    }

    /// Split into (fragment, preceding connector) pairs, dropping trivial
    /// fragments and fragments that are themselves connectors.
    fn split(&self, input: &str) -> Vec<(String, Option<String>)> {
        let mut raw: Vec<(String, Option<String>)> = Vec::new();
        let mut cursor = 0;
        let mut preceding: Option<String> = None;

        for m in self.splitter.captures_iter(input) {
            let whole = m.get(0).expect("match always has a whole group");
            raw.push((input[cursor..whole.start()].to_string(), preceding.take()));
            preceding = m.get(1).map(|w| w.as_str().to_lowercase());
            cursor = whole.end();
        }
        raw.push((input[cursor..].to_string(), preceding));

        raw.into_iter()
            .filter_map(|(fragment, connector)| {
                let trimmed = fragment.trim();
                if trimmed.len() <= 2 {
                    return None;
                }
                if CONNECTORS.contains(&trimmed.to_lowercase().as_str()) {
                    return None;
                }
                Some((trimmed.to_string(), connector))
            })
            .collect()
    }
}

fn priority_for(intent: &Intent, description: &str) -> u8 {
    let mut priority = 1u8;
    if matches!(intent.kind.as_str(), "code" | "devops") {
        priority += 1;
    }
    if description.split_whitespace().count() > 10 {
        priority += 1;
    }
    priority.min(5)
}

fn fresh_id(used: &mut HashSet<String>) -> String {
    loop {
        let id = short_id();
        if used.insert(id.clone()) {
            return id;
        }
    }
}
