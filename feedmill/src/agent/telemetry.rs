//! Telemetry for agent execution observability.
//!
//! The dispatcher emits structured events via a sink abstraction and doesn't
//! know how they are consumed — "emit, don't present". Consumers (logging,
//! metrics, a status UI) decide how to aggregate or display them.

use std::sync::Arc;
use std::time::Duration;

use crate::source::SourceId;

use super::task::{TaskDisposition, TaskId};

// =============================================================================
// Telemetry Events
// =============================================================================

/// Events emitted during task scheduling and execution.
#[derive(Clone, Debug)]
pub enum TelemetryEvent {
    /// A task was submitted to the dispatcher.
    TaskSubmitted {
        task_id: TaskId,
        kind: &'static str,
        source_id: SourceId,
    },

    /// A task was parked behind the in-flight task of its source.
    TaskParked {
        task_id: TaskId,
        kind: &'static str,
        source_id: SourceId,
        queue_depth: usize,
    },

    /// A task was handed to a worker.
    TaskStarted {
        task_id: TaskId,
        kind: &'static str,
        source_id: SourceId,
    },

    /// A task finished (completed, skipped, or contained failure).
    TaskCompleted {
        task_id: TaskId,
        kind: &'static str,
        source_id: SourceId,
        disposition: TaskDisposition,
        duration: Duration,
    },

    /// A queued task was dropped during shutdown.
    TaskAbandoned {
        task_id: TaskId,
        kind: &'static str,
        source_id: SourceId,
    },
}

impl TelemetryEvent {
    /// Returns the task id associated with this event.
    pub fn task_id(&self) -> &TaskId {
        match self {
            Self::TaskSubmitted { task_id, .. }
            | Self::TaskParked { task_id, .. }
            | Self::TaskStarted { task_id, .. }
            | Self::TaskCompleted { task_id, .. }
            | Self::TaskAbandoned { task_id, .. } => task_id,
        }
    }

    /// Returns a short name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TaskSubmitted { .. } => "task_submitted",
            Self::TaskParked { .. } => "task_parked",
            Self::TaskStarted { .. } => "task_started",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskAbandoned { .. } => "task_abandoned",
        }
    }
}

// =============================================================================
// Telemetry Sink
// =============================================================================

/// Sink for telemetry events.
///
/// Implementations must be thread-safe; events may be emitted from the
/// dispatcher loop and from worker contexts. `emit` should be fast and
/// non-blocking.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

/// No-op sink for when telemetry is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn emit(&self, _event: TelemetryEvent) {
        // Intentionally empty
    }
}

/// Sink that logs events using the `tracing` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::TaskSubmitted {
                task_id,
                kind,
                source_id,
            } => {
                tracing::debug!(
                    task_id = %task_id,
                    kind = %kind,
                    source_id = %source_id,
                    "Task submitted"
                );
            }
            TelemetryEvent::TaskParked {
                task_id,
                kind,
                source_id,
                queue_depth,
            } => {
                tracing::trace!(
                    task_id = %task_id,
                    kind = %kind,
                    source_id = %source_id,
                    queue_depth = queue_depth,
                    "Task parked behind in-flight task"
                );
            }
            TelemetryEvent::TaskStarted {
                task_id,
                kind,
                source_id,
            } => {
                tracing::debug!(
                    task_id = %task_id,
                    kind = %kind,
                    source_id = %source_id,
                    "Task started"
                );
            }
            TelemetryEvent::TaskCompleted {
                task_id,
                kind,
                source_id,
                disposition,
                duration,
            } => {
                tracing::debug!(
                    task_id = %task_id,
                    kind = %kind,
                    source_id = %source_id,
                    disposition = %disposition,
                    duration_ms = duration.as_millis(),
                    "Task completed"
                );
            }
            TelemetryEvent::TaskAbandoned {
                task_id,
                kind,
                source_id,
            } => {
                tracing::warn!(
                    task_id = %task_id,
                    kind = %kind,
                    source_id = %source_id,
                    "Task abandoned at shutdown"
                );
            }
        }
    }
}

/// Sink that forwards events to multiple sinks.
pub struct MultiplexTelemetrySink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl MultiplexTelemetrySink {
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { sinks }
    }

    pub fn add_sink(&mut self, sink: Arc<dyn TelemetrySink>) {
        self.sinks.push(sink);
    }
}

impl TelemetrySink for MultiplexTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}
