//! The orchestrator: owns every component and drives the ten-stage
//! pipeline.
//!
//! Stages run synchronously in order (parse, classify, decompose, score,
//! allocate, execute, evaluate, aggregate, learn, emit); concurrency is
//! confined to stage 6. A fatal stage error aborts the run and returns the
//! error form with whatever stages completed; stage 6 task failures are
//! absorbed into results, and learning failures never surface at all.

use crate::allocation::{AgentSpawner, Allocation};
use crate::cognition::{
    Complexity, ComplexityScorer, Decomposition, Intent, IntentClassifier, TaskDecomposer,
};
use crate::config::EngineConfig;
use crate::dag::{ExecutionResult, TaskDag, WaveScheduler};
use crate::error::{EngineError, Result};
use crate::evaluation::{Aggregator, Evaluation, Evaluator};
use crate::gate::{AllowAll, PermissionGate};
use crate::learning::LearningSystem;
use crate::memory::MemoryStore;
use crate::observer::{PipelineEvent, PipelineObserver};
use crate::pool::{PoolStats, WorkerPool};
use crate::registry::{Agent, AgentRegistry};
use crate::types::{ComplexityLevel, TaskStatus};
use crate::worker::{SimulatedWorker, Worker, WorkerContext};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Per-request collaborators supplied by the caller.
#[derive(Clone)]
pub struct RequestContext {
    pub session: String,
    pub gate: Arc<dyn PermissionGate>,
    pub observer: Option<Arc<dyn PipelineObserver>>,
}

impl RequestContext {
    /// Context with an approve-everything gate and no observer.
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            gate: Arc::new(AllowAll),
            observer: None,
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// Stage outputs, populated as far as the run progressed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRecord {
    pub intent: Option<Intent>,
    pub decomposition: Option<Decomposition>,
    pub complexity: Option<Complexity>,
    pub agents: Option<Allocation>,
    pub execution: Option<ExecutionResult>,
    pub evaluation: Option<Evaluation>,
}

/// Headline numbers for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    pub duration_ms: u64,
    pub agents_used: usize,
    pub tasks_completed: usize,
    pub tasks_failed: usize,
    pub complexity_level: Option<ComplexityLevel>,
}

/// What `execute` hands back: the success form carries `output`, the error
/// form carries `error`; both carry the partial pipeline and metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub pipeline: PipelineRecord,
    pub metrics: RunMetrics,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The engine. One instance serves requests serially; the registry and
/// memory store are the only state that outlives a request.
pub struct Orchestrator {
    config: EngineConfig,
    registry: RwLock<AgentRegistry>,
    memory: Arc<MemoryStore>,
    pool: Arc<WorkerPool>,
    classifier: IntentClassifier,
    decomposer: TaskDecomposer,
    scorer: ComplexityScorer,
    spawner: AgentSpawner,
    evaluator: Evaluator,
    aggregator: Aggregator,
    learning: Mutex<LearningSystem>,
}

impl Orchestrator {
    /// Engine with the default configuration and the simulated worker.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let worker = Arc::new(SimulatedWorker::new(config.simulated_delay_ms));
        Self::with_worker(config, worker)
    }

    /// Engine with an injected worker body. This is the LLM integration
    /// point.
    pub fn with_worker(config: EngineConfig, worker: Arc<dyn Worker>) -> Self {
        let memory = Arc::new(MemoryStore::new(
            config.performance_log_cap,
            config.performance_log_retain,
        ));
        let pool = Arc::new(WorkerPool::new(worker, config.max_workers));
        Self {
            registry: RwLock::new(AgentRegistry::with_builtins()),
            memory,
            pool,
            classifier: IntentClassifier::new(),
            decomposer: TaskDecomposer::new(),
            scorer: ComplexityScorer::new(),
            spawner: AgentSpawner::new(),
            evaluator: Evaluator::new(),
            aggregator: Aggregator::new(),
            learning: Mutex::new(LearningSystem::new()),
            config,
        }
    }

    /// Run one request through the full pipeline.
    pub async fn execute(&self, input: &str, ctx: &RequestContext) -> RunReport {
        let started = Instant::now();
        let mut pipeline = PipelineRecord::default();

        let outcome = self.run_pipeline(input, ctx, &mut pipeline).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        let metrics = build_metrics(&pipeline, duration_ms);

        match outcome {
            Ok(output) => {
                tracing::info!(
                    duration_ms,
                    completed = metrics.tasks_completed,
                    failed = metrics.tasks_failed,
                    "request finished"
                );
                RunReport {
                    output: Some(output),
                    error: None,
                    pipeline,
                    metrics,
                }
            }
            Err(err) => {
                tracing::warn!(duration_ms, error = %err, "request aborted");
                RunReport {
                    output: None,
                    error: Some(err.to_string()),
                    pipeline,
                    metrics,
                }
            }
        }
    }

    async fn run_pipeline(
        &self,
        input: &str,
        ctx: &RequestContext,
        pipeline: &mut PipelineRecord,
    ) -> Result<String> {
        // Stage 1: parse.
        let parsed = input.trim();
        if parsed.is_empty() {
            return Err(EngineError::ParseError);
        }
        notify(ctx, 1, "parse");

        // Stage 2: classify intent.
        let intent = self.classifier.classify(parsed);
        tracing::debug!(kind = %intent.kind, confidence = intent.confidence, "intent classified");
        pipeline.intent = Some(intent.clone());
        notify(ctx, 2, "classify_intent");

        // Stage 3: decompose.
        let decomposition = self.decomposer.decompose(parsed, &intent);
        pipeline.decomposition = Some(decomposition.clone());
        notify(ctx, 3, "decompose");

        // Stage 4: score complexity.
        let complexity = self.scorer.score(&decomposition);
        tracing::debug!(score = complexity.score, level = %complexity.level, "complexity scored");
        pipeline.complexity = Some(complexity.clone());
        notify(ctx, 4, "score_complexity");

        // Stage 5: allocate agents.
        let allocation = {
            let registry = self.registry.read();
            self.spawner
                .allocate(&registry, &decomposition, &complexity, &intent)?
        };
        pipeline.agents = Some(allocation.clone());
        notify(ctx, 5, "allocate_agents");

        // Stage 6: execute the DAG. Task failures are absorbed into the
        // results; only graph construction can abort here.
        let mut dag = TaskDag::build(&decomposition)?;
        let scheduler = WaveScheduler::new(self.pool.clone());
        let worker_ctx = WorkerContext {
            session: ctx.session.clone(),
            gate: ctx.gate.clone(),
        };
        let execution = scheduler
            .execute(
                &mut dag,
                &allocation,
                &worker_ctx,
                ctx.observer.as_deref(),
            )
            .await;
        pipeline.execution = Some(execution.clone());
        notify(ctx, 6, "execute_dag");

        // Stage 7: evaluate.
        let evaluation = self.evaluator.evaluate(&execution);
        pipeline.evaluation = Some(evaluation.clone());
        notify(ctx, 7, "evaluate");

        // Stage 8: aggregate.
        let summary = self.aggregator.summarize(&evaluation, &execution);
        notify(ctx, 8, "aggregate");

        // Stage 9: learn. Best-effort by contract; nothing here may abort
        // an otherwise finished request.
        self.learn(parsed, &intent, &complexity, &execution, &evaluation, &summary);
        notify(ctx, 9, "learn");

        // Stage 10: emit.
        notify(ctx, 10, "emit");
        Ok(summary)
    }

    fn learn(
        &self,
        input: &str,
        intent: &Intent,
        complexity: &Complexity,
        execution: &ExecutionResult,
        evaluation: &Evaluation,
        summary: &str,
    ) {
        // Registry metric path: execution statistics and the local
        // confidence adjustment.
        {
            let mut registry = self.registry.write();
            for result in &execution.results {
                let Some(agent_id) = &result.agent_id else {
                    continue;
                };
                match result.status {
                    TaskStatus::Completed => {
                        registry.update_agent_metrics(agent_id, result.duration_ms, false)
                    }
                    TaskStatus::Failed => {
                        registry.update_agent_metrics(agent_id, result.duration_ms, true)
                    }
                    _ => {}
                }
            }
        }

        // Learning-system path: memory records plus batched deltas.
        let mut learning = self.learning.lock();
        learning.learn(
            &self.memory,
            input,
            intent,
            complexity,
            execution,
            evaluation,
            summary,
        );
        learning.apply_updates(&mut self.registry.write());
    }

    // --- introspection and persistence ---

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn agent(&self, id: &str) -> Option<Agent> {
        self.registry.read().get(id).cloned()
    }

    pub fn agents(&self) -> Vec<Agent> {
        self.registry.read().agents().to_vec()
    }

    /// Persist the memory snapshot. Failures are logged and swallowed;
    /// memory continues in-process.
    pub fn save_memory(&self) {
        if let Err(err) = self.memory.save(&self.config.snapshot_path) {
            tracing::warn!(error = %err, "memory snapshot save failed");
        }
    }

    /// Load the memory snapshot if one exists. Failures are logged and
    /// swallowed.
    pub fn load_memory(&self) {
        if let Err(err) = self.memory.load(&self.config.snapshot_path) {
            tracing::warn!(error = %err, "memory snapshot load failed");
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

fn notify(ctx: &RequestContext, stage: usize, name: &'static str) {
    if let Some(observer) = &ctx.observer {
        observer.on_event(&PipelineEvent::StageCompleted { stage, name });
    }
}

fn build_metrics(pipeline: &PipelineRecord, duration_ms: u64) -> RunMetrics {
    let (tasks_completed, tasks_failed) = pipeline
        .evaluation
        .as_ref()
        .map(|e| (e.completed, e.failed))
        .unwrap_or((0, 0));
    RunMetrics {
        duration_ms,
        agents_used: pipeline
            .agents
            .as_ref()
            .map(|a| a.agents.len())
            .unwrap_or(0),
        tasks_completed,
        tasks_failed,
        complexity_level: pipeline.complexity.as_ref().map(|c| c.level),
    }
}
