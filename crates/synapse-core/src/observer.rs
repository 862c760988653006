//! Pipeline observer interface.
//!
//! The renderer (or any other sink) can watch stage completion and wave
//! progress without polling. The observer is optional and purely passive;
//! its absence never changes engine semantics.

/// Structured events emitted during one request.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A pipeline stage finished.
    StageCompleted {
        /// 1-based stage number (1 = parse .. 10 = emit).
        stage: usize,
        name: &'static str,
    },
    /// A wave is about to dispatch.
    WaveStarted { wave: usize, tasks: usize },
    /// One task was handed to the worker pool.
    TaskDispatched {
        wave: usize,
        task_id: String,
        agent_id: String,
    },
    /// A wave fully settled.
    WaveCompleted {
        wave: usize,
        completed: usize,
        failed: usize,
        skipped: usize,
    },
}

/// Event sink. Implementations must be cheap; they run inline with the
/// pipeline.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Discards everything.
pub struct NullObserver;

impl PipelineObserver for NullObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use parking_lot::Mutex;

    /// Captures every event for assertions.
    #[derive(Default)]
    pub(crate) struct RecordingObserver(Mutex<Vec<PipelineEvent>>);

    impl RecordingObserver {
        pub(crate) fn events(&self) -> Vec<PipelineEvent> {
            self.0.lock().clone()
        }
    }

    impl PipelineObserver for RecordingObserver {
        fn on_event(&self, event: &PipelineEvent) {
            self.0.lock().push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::RecordingObserver;
    use super::*;

    #[test]
    fn test_recording_observer_captures() {
        let observer = RecordingObserver::default();
        observer.on_event(&PipelineEvent::WaveStarted { wave: 0, tasks: 2 });
        observer.on_event(&PipelineEvent::WaveCompleted {
            wave: 0,
            completed: 2,
            failed: 0,
            skipped: 0,
        });
        assert_eq!(observer.events().len(), 2);
    }

    #[test]
    fn test_null_observer_is_silent() {
        NullObserver.on_event(&PipelineEvent::StageCompleted {
            stage: 1,
            name: "parse",
        });
    }
}
