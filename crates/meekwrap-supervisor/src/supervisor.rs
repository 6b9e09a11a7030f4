//! Top-level orchestration.
//!
//! Resolve the helper command, start the helper, wait for its address,
//! start meek-client with that address, then run the termination
//! coordinator. Whatever happens, the cleanup stack is unwound before
//! returning.

use std::path::PathBuf;

use meekwrap_core::{CommandResolver, CommandVector, WrapperConfig};
use tracing::{info, warn};

use crate::cleanup::{CleanupStack, ShutdownPolicy};
use crate::error::WrapperError;
use crate::handshake::find_address;
use crate::signals::{SignalHub, SignalKind};
use crate::subprocess::{client, helper};
use crate::termination::TerminationCoordinator;

/// How a supervision run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The termination sequence ran to completion.
    Completed,
    /// A signal arrived before the helper announced its address; the client
    /// was never started.
    AbortedDuringStartup(SignalKind),
}

/// Supervises one browser-helper / meek-client pair.
pub struct Supervisor {
    config: WrapperConfig,
    resolver: Box<dyn CommandResolver>,
    helper_path: PathBuf,
    client_command: CommandVector,
}

impl Supervisor {
    /// Validate the client command line and pick the resolver from
    /// `config.helper_format`.
    pub fn new(
        config: WrapperConfig,
        helper_path: PathBuf,
        client_command: Vec<String>,
    ) -> Result<Self, WrapperError> {
        let client_command =
            CommandVector::new(client_command).map_err(|_| WrapperError::EmptyClientCommand)?;
        Ok(Self {
            resolver: config.helper_format.resolver(),
            config,
            helper_path,
            client_command,
        })
    }

    /// Replace the resolver chosen from the config.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Box<dyn CommandResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Run until the termination sequence completes or startup fails.
    pub async fn run(&self, signals: &mut SignalHub) -> Result<RunOutcome, WrapperError> {
        let mut cleanup = CleanupStack::new();
        let mut coordinator = TerminationCoordinator::new();

        let result = self.supervise(signals, &mut cleanup, &mut coordinator).await;
        if let Err(e) = &result {
            warn!(error = %e, "startup failed; cleaning up");
        }

        for (role, outcome) in cleanup.unwind().await {
            info!(%role, ?outcome, "child stopped");
        }
        let state = coordinator.finish();
        info!(?state, "supervision finished");
        result
    }

    async fn supervise(
        &self,
        signals: &mut SignalHub,
        cleanup: &mut CleanupStack,
        coordinator: &mut TerminationCoordinator,
    ) -> Result<RunOutcome, WrapperError> {
        let resolved = self.resolver.resolve(&self.helper_path)?;

        let (helper, stdout) = helper::start(&resolved)?;
        cleanup.push(helper, ShutdownPolicy::Graceful(self.config.helper_grace));

        let address = tokio::select! {
            found = find_address(stdout) => found?,
            Some(kind) = signals.recv() => {
                info!(signal = %kind, "received signal before browser-helper announced its address");
                return Ok(RunOutcome::AbortedDuringStartup(kind));
            }
        };

        let client = client::start(&address, &self.client_command)?;
        let client = cleanup.push(client, ShutdownPolicy::Immediate);

        if self.config.exit_on_stdin_close
            && let Err(e) = signals.watch_stdin_close()
        {
            warn!(error = %e, "Failed to start stdin close watcher");
        }

        coordinator.run(signals, client).await;
        Ok(RunOutcome::Completed)
    }
}
