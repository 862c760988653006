//! Cognitive pipeline stages 2–4: intent classification, task
//! decomposition, and complexity scoring.
//!
//! All three stages are deterministic, synchronous, and pure with respect
//! to the registry: the same input always produces the same intent, the
//! same fragments (modulo generated task ids), and the same score.

mod complexity;
mod decompose;
mod intent;

pub use complexity::{Complexity, ComplexityDetails, ComplexityScorer, RISK_KEYWORDS};
pub use decompose::{Decomposition, Task, TaskDecomposer, CONNECTORS, SEQUENCE_MARKERS};
pub use intent::{Intent, IntentClassifier, SecondaryIntent};
