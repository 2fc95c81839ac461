//! feedmill - feed aggregation engine
//!
//! This library provides the core of a feed reader: sources owning feeds,
//! folders, script folders and scripts, fronted by a background agent
//! execution system that runs every operation off the interactive thread.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use feedmill::agent::{AgentConfig, AgentDispatcher};
//! use feedmill::source::{Source, SourceId, SourceRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! let registry = Arc::new(SourceRegistry::new());
//! registry.register(Source::new(SourceId::new(1), "Local"));
//!
//! let (dispatcher, submitter) = AgentDispatcher::new(AgentConfig::default(), registry);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(dispatcher.run(shutdown.clone()));
//!
//! submitter.queue_mark_source_read(SourceId::new(1), |source_id| {
//!     println!("source {source_id} marked read");
//! });
//! ```

pub mod agent;
pub mod config;
pub mod logging;
pub mod source;

/// Version of the feedmill library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
