//! Agent dispatcher core - main struct and run loop.
//!
//! This module contains the [`AgentDispatcher`] struct and its event loop.
//! Handler methods are implemented in separate modules:
//! - `dispatch`: worker-slot accounting and task spawning
//! - `lifecycle`: submission admission, completion handling, shutdown

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::source::SourceRegistry;

use super::config::AgentConfig;
use super::dispatch::TaskCompletion;
use super::serializer::SourceSerializer;
use super::submitter::AgentSubmitter;
use super::task::Task;
use super::telemetry::{NullTelemetrySink, TelemetrySink};

// =============================================================================
// Agent Dispatcher
// =============================================================================

/// The background agent execution engine.
///
/// The dispatcher owns all scheduling state and processes three event
/// streams in one loop:
/// - submissions from [`AgentSubmitter`] clones
/// - completions from worker contexts
/// - the shutdown token
///
/// Admission goes through the per-source serializer first, then through the
/// bounded worker pool, so same-source tasks run strictly FIFO while
/// different sources interleave freely.
pub struct AgentDispatcher {
    /// The injected source registry tasks resolve against.
    pub(crate) registry: Arc<SourceRegistry>,

    /// Receiver for submitted tasks.
    pub(crate) task_rx: mpsc::Receiver<Task>,

    /// Sender for task completions (cloned into workers).
    pub(crate) completion_tx: mpsc::UnboundedSender<TaskCompletion>,

    /// Receiver for task completions.
    pub(crate) completion_rx: mpsc::UnboundedReceiver<TaskCompletion>,

    /// Per-source FIFO admission control.
    pub(crate) serializer: SourceSerializer,

    /// Tasks holding their source slot, waiting for a worker slot.
    pub(crate) ready: VecDeque<Task>,

    /// Number of tasks currently executing.
    pub(crate) running: usize,

    /// Telemetry sink for emitting events.
    pub(crate) telemetry: Arc<dyn TelemetrySink>,

    /// Configuration.
    pub(crate) config: AgentConfig,
}

impl AgentDispatcher {
    /// Creates a new dispatcher and its submission handle.
    pub fn new(config: AgentConfig, registry: Arc<SourceRegistry>) -> (Self, AgentSubmitter) {
        Self::with_telemetry(config, registry, Arc::new(NullTelemetrySink))
    }

    /// Creates a new dispatcher with a telemetry sink.
    pub fn with_telemetry(
        config: AgentConfig,
        registry: Arc<SourceRegistry>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> (Self, AgentSubmitter) {
        let (task_tx, task_rx) = mpsc::channel(config.task_channel_capacity);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let dispatcher = Self {
            registry,
            task_rx,
            completion_tx,
            completion_rx,
            serializer: SourceSerializer::new(),
            ready: VecDeque::new(),
            running: 0,
            telemetry,
            config,
        };

        let submitter = AgentSubmitter::new(task_tx);
        (dispatcher, submitter)
    }

    /// Runs the dispatcher until shutdown is signalled.
    ///
    /// Shutdown lets in-flight tasks finish and abandons queued tasks; the
    /// submitting side is never blocked by any of this.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            max_concurrent_tasks = self.config.max_concurrent_tasks,
            "Agent dispatcher started"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    self.shutdown().await;
                    break;
                }

                Some(task) = self.task_rx.recv() => {
                    self.handle_submission(task);
                }

                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }
            }

            self.dispatch_ready();
        }

        info!("Agent dispatcher stopped");
    }
}

impl std::fmt::Debug for AgentDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDispatcher")
            .field("running", &self.running)
            .field("ready", &self.ready.len())
            .field("busy_sources", &self.serializer.busy_sources())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatcher_creation() {
        let registry = Arc::new(SourceRegistry::new());
        let (dispatcher, _submitter) = AgentDispatcher::new(AgentConfig::default(), registry);

        assert_eq!(dispatcher.running, 0);
        assert!(dispatcher.ready.is_empty());
        assert_eq!(dispatcher.serializer.busy_sources(), 0);
    }

    #[tokio::test]
    async fn test_dispatcher_with_telemetry() {
        let registry = Arc::new(SourceRegistry::new());
        let telemetry = Arc::new(NullTelemetrySink);
        let (dispatcher, _submitter) =
            AgentDispatcher::with_telemetry(AgentConfig::default(), registry, telemetry);

        assert_eq!(dispatcher.running, 0);
    }
}
