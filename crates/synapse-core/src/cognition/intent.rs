//! Keyword-driven multi-label intent classification.

use serde::{Deserialize, Serialize};

/// A built-in intent pattern. Registration order is the tie-break for
/// equal-confidence intents, so the table order is load-bearing.
struct IntentPattern {
    kind: &'static str,
    cluster: &'static str,
    keywords: &'static [&'static str],
}

const INTENT_PATTERNS: &[IntentPattern] = &[
    IntentPattern {
        kind: "code",
        cluster: "coding",
        keywords: &[
            "build", "implement", "code", "api", "refactor", "bug", "fix", "function",
            "endpoint", "feature",
        ],
    },
    IntentPattern {
        kind: "research",
        cluster: "research",
        keywords: &[
            "research", "investigate", "explore", "compare", "learn", "study", "survey",
        ],
    },
    IntentPattern {
        kind: "devops",
        cluster: "devops",
        keywords: &[
            "deploy", "docker", "kubernetes", "pipeline", "infrastructure", "release",
            "provision", "rollback",
        ],
    },
    IntentPattern {
        kind: "design",
        cluster: "uiux",
        keywords: &["design", "wireframe", "mockup", "layout", "prototype", "style"],
    },
    IntentPattern {
        kind: "analysis",
        cluster: "analysis",
        keywords: &[
            "analyze", "analysis", "metrics", "measure", "profile", "report", "dataset",
        ],
    },
    IntentPattern {
        kind: "planning",
        cluster: "analysis",
        keywords: &["plan", "roadmap", "schedule", "organize", "milestone", "strategy"],
    },
];

/// A non-primary intent the request also matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryIntent {
    pub kind: String,
    pub cluster: String,
    pub confidence: f64,
}

/// Classification result: the strongest intent plus everything else that
/// matched at least one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: String,
    pub cluster: String,
    pub confidence: f64,
    pub matched: Vec<String>,
    pub secondary: Vec<SecondaryIntent>,
}

/// Stage 2. Scores each built-in pattern by keyword substring matches.
#[derive(Debug, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a raw request. Confidence is `min(matches / 3, 1.0)`; with
    /// no match at all the request falls back to a general research intent
    /// at 0.3 confidence.
    pub fn classify(&self, input: &str) -> Intent {
        let lowered = input.to_lowercase();

        let mut scored: Vec<(&IntentPattern, Vec<String>, f64)> = Vec::new();
        for pattern in INTENT_PATTERNS {
            let matched: Vec<String> = pattern
                .keywords
                .iter()
                .filter(|kw| lowered.contains(*kw))
                .map(|kw| kw.to_string())
                .collect();
            if matched.is_empty() {
                continue;
            }
            let confidence = (matched.len() as f64 / 3.0).min(1.0);
            scored.push((pattern, matched, confidence));
        }

        if scored.is_empty() {
            return Intent {
                kind: "general".to_string(),
                cluster: "research".to_string(),
                confidence: 0.3,
                matched: Vec::new(),
                secondary: Vec::new(),
            };
        }

        // Stable: equal confidence keeps registration order.
        scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        let (primary, matched, confidence) = scored.remove(0);
        Intent {
            kind: primary.kind.to_string(),
            cluster: primary.cluster.to_string(),
            confidence,
            matched,
            secondary: scored
                .into_iter()
                .map(|(p, _, c)| SecondaryIntent {
                    kind: p.kind.to_string(),
                    cluster: p.cluster.to_string(),
                    confidence: c,
                })
                .collect(),
        }
    }
}
