//! Error types for the supervisor.

use std::io;

use crate::subprocess::ChildRole;

/// Top-level startup failure. Every variant is fatal.
#[derive(Debug, thiserror::Error)]
pub enum WrapperError {
    #[error("either specify a --helper, or run meek-client directly.")]
    MissingHelper,

    #[error("meek-client command line is empty")]
    EmptyClientCommand,

    #[error(transparent)]
    Resolve(#[from] meekwrap_core::Error),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error("Handshake with browser-helper failed: {0}")]
    Handshake(#[from] HandshakeError),
}

/// Errors from starting a child process.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("Failed to start {role} ({program}): {source}")]
    Spawn {
        role: ChildRole,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to capture {stream} of {role}")]
    Capture {
        role: ChildRole,
        stream: &'static str,
    },
}

/// Errors from scanning the helper's output for its address.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// Output ended without the listen announcement.
    #[error("address not found: unexpected end of helper output")]
    AddressNotFound,

    #[error(transparent)]
    Read(#[from] io::Error),
}

impl HandshakeError {
    /// I/O kind equivalent; a missing address is reported as end of input.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::AddressNotFound => io::ErrorKind::UnexpectedEof,
            Self::Read(e) => e.kind(),
        }
    }
}

/// Errors from delivering a signal to a child.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("{0} has already been reaped")]
    NotRunning(ChildRole),

    #[error("signals are not supported on this platform")]
    Unsupported,

    #[error(transparent)]
    Os(#[from] io::Error),
}
