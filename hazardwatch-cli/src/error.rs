//! CLI error types.

use std::fmt;
use std::io;

/// Errors surfaced to the terminal user.
#[derive(Debug)]
pub enum CliError {
    /// A zone file could not be read or parsed.
    Zones(String),

    /// Invalid command-line input.
    Input(String),

    /// Engine construction rejected the configuration.
    Config(String),

    /// An I/O failure outside the zone file path.
    Io(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Zones(msg) => write!(f, "Zone file error: {}", msg),
            CliError::Input(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Io(err)
    }
}
