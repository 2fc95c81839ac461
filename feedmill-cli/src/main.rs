//! feedmill CLI - command-line interface
//!
//! This binary fronts the feedmill engine: it loads the configuration,
//! initialises logging, registers demo sources and drives a workload through
//! the background agent system.

use std::path::PathBuf;

use clap::Parser;

mod error;
mod runner;

#[derive(Parser)]
#[command(name = "feedmill")]
#[command(version = feedmill::VERSION)]
#[command(about = "Drive the feedmill engine from the command line", long_about = None)]
struct Args {
    /// Path to the configuration file (defaults to ~/.feedmill/config.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of sources to register
    #[arg(long, default_value = "2")]
    sources: u64,

    /// Number of feeds per source
    #[arg(long, default_value = "3")]
    feeds: u64,

    /// Simulated backing-store latency per operation, in milliseconds
    #[arg(long, default_value = "25")]
    latency_ms: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(error) = runner::run(args).await {
        error.exit();
    }
}
