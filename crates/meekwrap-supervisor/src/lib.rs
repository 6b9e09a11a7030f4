//! meekwrap Supervisor Library
//!
//! Process supervision for the meek-client wrapper:
//! - Spawning the browser helper and meek-client
//! - Scanning the helper's stdout for its listen address
//! - Signal intake, forwarding, and two-strike interrupt handling
//! - Ordered cleanup with a grace period before killing the helper

pub mod cleanup;
pub mod error;
pub mod handshake;
pub mod signals;
pub mod subprocess;
pub mod supervisor;
pub mod termination;

pub use error::{HandshakeError, SignalError, SpawnError, WrapperError};
pub use signals::{SignalHub, SignalKind};
pub use supervisor::{RunOutcome, Supervisor};
