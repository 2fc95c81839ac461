//! Background Agent Execution System
//!
//! This module runs the engine's long-lived operations (remove a feed, mark
//! a source read, fetch status, …) off the interactive thread while
//! guaranteeing that operations touching the same source never race and that
//! every completion callback fires exactly once — even when an operation
//! body fails.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AgentSubmitter                          │
//! │  queue_* per operation; fire-and-forget, returns a ticket   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      AgentDispatcher                         │
//! │  Event loop: admit tasks, spawn workers, handle completions │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐  │
//! │  │ Per-Source   │  │ Worker Pool  │  │ Telemetry         │  │
//! │  │ Serializer   │  │ (bounded)    │  │ Sink              │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Task**: an immutable unit of background work — an operation kind with
//!   captured parameters, the owning source id, and a completion callback.
//!
//! - **Per-source serialization**: at most one task per source id executes
//!   at any instant; tasks for a busy source park in FIFO order and promote
//!   one at a time. Different sources interleave freely.
//!
//! - **Failure containment**: a failing body is logged against its source
//!   and the callback still fires with the kind's fallback outcome; nothing
//!   ever propagates into the dispatcher loop.
//!
//! - **Absence is not an error**: if the source is gone at execution time
//!   the task silently no-ops (no callback); if only the target entity is
//!   gone the callback still fires.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use feedmill::agent::{AgentConfig, AgentDispatcher};
//! use feedmill::source::{Source, SourceId, SourceRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! let registry = Arc::new(SourceRegistry::new());
//! let source = registry.register(Source::new(SourceId::new(1), "Local"));
//! let feed = source.add_feed("https://example.com/rss.xml", 0, "Example");
//!
//! let (dispatcher, submitter) = AgentDispatcher::new(AgentConfig::default(), registry);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(dispatcher.run(shutdown.clone()));
//!
//! submitter.queue_remove_feed(SourceId::new(1), feed, || {
//!     println!("feed removed");
//! });
//! ```

// Module declarations
mod config;
mod core;
mod dispatch;
mod handle;
mod lifecycle;
mod serializer;
mod submitter;
mod task;
mod telemetry;

// Re-export public types

// Configuration
pub use config::{AgentConfig, DEFAULT_MAX_CONCURRENT_TASKS, DEFAULT_TASK_CHANNEL_CAPACITY};

// Dispatcher and submission
pub use self::core::AgentDispatcher;
pub use submitter::AgentSubmitter;

// Task types
pub use handle::TaskTicket;
pub use task::{OnComplete, Task, TaskDisposition, TaskId, TaskKind, TaskOutcome};

// Telemetry
pub use telemetry::{
    MultiplexTelemetrySink, NullTelemetrySink, TelemetryEvent, TelemetrySink,
    TracingTelemetrySink,
};
