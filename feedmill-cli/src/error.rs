//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use feedmill::config::ConfigFileError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to load the configuration file
    Config(ConfigFileError),
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// The agent dispatcher went away while work was outstanding
    DispatcherGone,
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Config(_) = self {
            eprintln!();
            eprintln!("Check ~/.feedmill/config.ini, or pass --config <path>.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(error) => write!(f, "Failed to load configuration: {}", error),
            CliError::LoggingInit(error) => write!(f, "Failed to initialize logging: {}", error),
            CliError::DispatcherGone => write!(f, "Agent dispatcher stopped unexpectedly"),
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(error: ConfigFileError) -> Self {
        CliError::Config(error)
    }
}
