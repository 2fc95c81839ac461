//! Demo workload runner.
//!
//! Registers a handful of in-memory sources, starts the agent dispatcher and
//! pushes a representative workload through it: mark-read, script folder
//! management, flag color and status queries. Results are printed once every
//! submitted task has completed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use feedmill::agent::{
    AgentConfig, AgentDispatcher, TaskTicket, TracingTelemetrySink,
};
use feedmill::config::ConfigFile;
use feedmill::logging::init_logging;
use feedmill::source::{Source, SourceId, SourceRegistry};

use crate::error::CliError;
use crate::Args;

pub async fn run(args: Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    let _logging_guard = init_logging(&config.logging).map_err(CliError::LoggingInit)?;
    info!(version = feedmill::VERSION, "feedmill starting");

    let registry = Arc::new(SourceRegistry::new());
    let latency = Duration::from_millis(args.latency_ms);
    for n in 1..=args.sources {
        let source = registry.register(Source::new(SourceId::new(n), format!("Source {n}")));
        source.set_operation_latency(Some(latency));
        for f in 1..=args.feeds {
            let feed_id = source.add_feed(
                format!("https://example.com/source{n}/feed{f}.xml"),
                0,
                format!("Feed {n}.{f}"),
            );
            source.with_feed_mut(feed_id, |feed| {
                feed.unread_count = f * 3;
                feed.total_post_count = f * 10;
            });
        }
    }

    let (dispatcher, submitter) = AgentDispatcher::with_telemetry(
        AgentConfig::from(&config.agent),
        Arc::clone(&registry),
        Arc::new(TracingTelemetrySink),
    );
    let shutdown = CancellationToken::new();
    let dispatcher_handle = tokio::spawn(dispatcher.run(shutdown.clone()));

    // Fire a workload across every source; callbacks collect what to print.
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let mut tickets: Vec<TaskTicket> = Vec::new();

    for source_id in registry.ids() {
        tickets.push(submitter.queue_mark_source_read(source_id, |source_id| {
            info!(source_id = %source_id, "source marked read");
        }));

        tickets.push(submitter.queue_add_script_folder(
            source_id,
            "Favorites",
            true,
            true,
            |source_id| {
                info!(source_id = %source_id, "script folder added");
            },
        ));

        tickets.push(
            submitter.queue_get_used_flag_colors(source_id, |source_id, colors| {
                info!(source_id = %source_id, colors = colors.len(), "used flag colors");
            }),
        );

        let statuses_clone = Arc::clone(&statuses);
        tickets.push(
            submitter.queue_get_source_status(source_id, move |source_id, status| {
                statuses_clone.lock().unwrap().push((source_id, status));
            }),
        );
    }

    wait_for(&tickets).await?;

    for (source_id, status) in statuses.lock().unwrap().iter() {
        let source_title = registry
            .get(*source_id)
            .map(|source| source.title())
            .unwrap_or_default();
        println!("── {source_title} (source {source_id}) ──");
        println!(
            "{}",
            serde_json::to_string_pretty(status).unwrap_or_else(|_| status.to_string())
        );
    }

    shutdown.cancel();
    let _ = dispatcher_handle.await;
    info!("feedmill stopped");
    Ok(())
}

/// Waits until every ticket reports done.
async fn wait_for(tickets: &[TaskTicket]) -> Result<(), CliError> {
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    for ticket in tickets {
        while !ticket.is_done() {
            if std::time::Instant::now() > deadline {
                return Err(CliError::DispatcherGone);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
    Ok(())
}
