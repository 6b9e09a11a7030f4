//! Error types for the meekwrap core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the core Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for command resolution and configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Descriptor file could not be read
    #[error("Failed to read descriptor file {}: {source}", path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor file yielded no command tokens
    #[error("no commands in meek-browser-helper file: {}", .0.display())]
    NoCommands(PathBuf),

    /// A command vector was built from zero tokens
    #[error("Command vector is empty")]
    EmptyCommand,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
