//! Synapse Core: a single-process orchestration engine.
//!
//! Synapse turns a free-form natural-language request into a DAG of
//! subtasks and executes it across a pool of named agents under a
//! bounded-concurrency scheduler, learning from outcomes to bias future
//! agent selection.
//!
//! # Architecture
//!
//! One request flows through a fixed ten-stage cognitive pipeline:
//!
//! ```text
//! parse -> classify intent -> decompose -> score complexity
//!       -> allocate agents -> execute DAG -> evaluate
//!       -> aggregate -> learn -> emit
//! ```
//!
//! The [`Orchestrator`] owns every component and runs the stages
//! synchronously; only stage 6 (DAG execution) is internally concurrent,
//! dispatching each topological wave to the bounded [`pool::WorkerPool`]
//! behind a strict wave barrier.
//!
//! # Quick start
//!
//! ```
//! use synapse_core::{Orchestrator, RequestContext};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = Orchestrator::new();
//! let report = engine
//!     .execute("research OAuth then build API", &RequestContext::new("demo"))
//!     .await;
//!
//! assert!(report.is_success());
//! println!("{}", report.output.unwrap());
//! # }
//! ```
//!
//! # Collaborators
//!
//! The terminal front-end, CLI, permission prompt, and real LLM worker are
//! external. The engine consumes them through three seams: the
//! [`worker::Worker`] trait (the only LLM injection point), the
//! [`gate::PermissionGate`] predicate, and the optional
//! [`observer::PipelineObserver`] event sink.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod allocation;
pub mod cognition;
pub mod config;
pub mod dag;
pub mod error;
pub mod evaluation;
pub mod gate;
pub mod learning;
pub mod memory;
pub mod observer;
pub mod orchestrator;
pub mod pool;
pub mod registry;
pub mod types;
pub mod worker;

pub use allocation::{AgentSpawner, Allocation};
pub use cognition::{
    Complexity, ComplexityScorer, Decomposition, Intent, IntentClassifier, Task, TaskDecomposer,
};
pub use config::EngineConfig;
pub use dag::{ExecutionResult, TaskDag, TaskResult, WaveScheduler};
pub use error::{EngineError, Result};
pub use evaluation::{Aggregator, Evaluation, Evaluator};
pub use gate::{AllowAll, PermissionGate};
pub use learning::LearningSystem;
pub use memory::MemoryStore;
pub use observer::{NullObserver, PipelineEvent, PipelineObserver};
pub use orchestrator::{Orchestrator, PipelineRecord, RequestContext, RunMetrics, RunReport};
pub use registry::{Agent, AgentFilter, AgentRegistry, Cluster};
pub use types::{ComplexityLevel, Strategy, TaskStatus};
pub use worker::{SimulatedWorker, Worker, WorkerContext, WorkerJob, WorkerOutput};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
