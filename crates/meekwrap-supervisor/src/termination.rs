//! Termination coordinator.
//!
//! ```text
//! Running --sig--> SignalReceived(SIGINT)  --> AwaitingSecondInterrupt --sig--> Terminating --> Done
//!                  SignalReceived(SIGTERM) -------------------------------> Terminating
//! ```
//!
//! Every signal that moves the machine out of a waiting state is forwarded
//! to meek-client. An interrupt needs a second signal before shutdown
//! begins, so an impatient second Ctrl+C reaches the client too; a terminate
//! shuts down right away.

use tracing::{info, warn};

use crate::signals::{SignalHub, SignalKind};
use crate::subprocess::SupervisedChild;

/// Where shutdown stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationState {
    Running,
    SignalReceived(SignalKind),
    AwaitingSecondInterrupt,
    Terminating,
    Done,
}

/// Result of feeding a signal to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: TerminationState,
    /// Signal to pass on to the client, if any.
    pub forward: Option<SignalKind>,
}

impl TerminationState {
    /// Whether this state blocks for the next inbound signal.
    pub const fn awaits_signal(self) -> bool {
        matches!(self, Self::Running | Self::AwaitingSecondInterrupt)
    }

    /// React to an inbound signal. States that are not waiting ignore it.
    pub const fn on_signal(self, kind: SignalKind) -> Transition {
        match self {
            Self::Running => Transition {
                next: Self::SignalReceived(kind),
                forward: Some(kind),
            },
            Self::AwaitingSecondInterrupt => Transition {
                next: Self::Terminating,
                forward: Some(kind),
            },
            other => Transition {
                next: other,
                forward: None,
            },
        }
    }

    /// Take the next step that does not depend on a signal.
    pub const fn advance(self) -> Self {
        match self {
            Self::SignalReceived(SignalKind::Interrupt) => Self::AwaitingSecondInterrupt,
            Self::SignalReceived(SignalKind::Terminate) => Self::Terminating,
            Self::Terminating | Self::Done => Self::Done,
            other => other,
        }
    }
}

/// Something inbound signals are passed on to.
pub trait SignalForwarder {
    /// Deliver `kind`. Failures are logged, never returned.
    fn forward(&mut self, kind: SignalKind);
}

impl SignalForwarder for SupervisedChild {
    fn forward(&mut self, kind: SignalKind) {
        // Give the child a chance to see its stdin close before the signal.
        self.close_stdin();
        info!(signal = %kind, role = %self.role(), pid = ?self.pid(), "sending signal");
        if let Err(e) = self.signal(kind) {
            warn!(signal = %kind, role = %self.role(), pid = ?self.pid(), error = %e, "Failed to forward signal");
        }
    }
}

/// Drives [`TerminationState`] from a [`SignalHub`].
#[derive(Debug)]
pub struct TerminationCoordinator {
    state: TerminationState,
}

impl Default for TerminationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminationCoordinator {
    pub const fn new() -> Self {
        Self {
            state: TerminationState::Running,
        }
    }

    pub const fn state(&self) -> TerminationState {
        self.state
    }

    /// Wait for signals and forward them until the machine reaches
    /// [`TerminationState::Terminating`].
    pub async fn run<F>(&mut self, signals: &mut SignalHub, forwarder: &mut F) -> TerminationState
    where
        F: SignalForwarder + ?Sized,
    {
        loop {
            if self.state.awaits_signal() {
                let Some(kind) = signals.recv().await else {
                    warn!("signal channel closed; shutting down");
                    self.state = TerminationState::Terminating;
                    continue;
                };
                info!(signal = %kind, "received signal");
                let transition = self.state.on_signal(kind);
                if let Some(forward) = transition.forward {
                    forwarder.forward(forward);
                }
                self.state = transition.next;
            } else if matches!(self.state, TerminationState::SignalReceived(_)) {
                self.state = self.state.advance();
            } else {
                return self.state;
            }
        }
    }

    /// Mark cleanup as finished.
    pub fn finish(&mut self) -> TerminationState {
        self.state = TerminationState::Done;
        self.state
    }
}
