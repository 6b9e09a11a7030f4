//! Signal intake.
//!
//! OS interrupt/terminate signals and the optional stdin-close watcher all
//! feed one channel, so the termination coordinator waits in one place.

use std::fmt;
use std::io::Read;

use tokio::sync::mpsc;
use tracing::{debug, info};

/// Shutdown signals the wrapper reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Interrupt,
    Terminate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        })
    }
}

/// Merged stream of inbound [`SignalKind`]s.
#[derive(Debug)]
pub struct SignalHub {
    tx: mpsc::Sender<SignalKind>,
    rx: mpsc::Receiver<SignalKind>,
}

impl SignalHub {
    /// A hub with no OS sources; signals only arrive through [`Self::sender`].
    pub fn detached() -> Self {
        let (tx, rx) = mpsc::channel(8);
        Self { tx, rx }
    }

    /// Register for SIGINT and SIGTERM (Ctrl+C only on non-Unix).
    ///
    /// Must be called from within the tokio runtime, and before any child is
    /// started so an early signal is not lost to the default handler.
    pub fn install() -> std::io::Result<Self> {
        let hub = Self::detached();
        hub.listen_os()?;
        Ok(hub)
    }

    #[cfg(unix)]
    fn listen_os(&self) -> std::io::Result<()> {
        use tokio::signal::unix::{SignalKind as OsSignal, signal};

        let mut interrupt = signal(OsSignal::interrupt())?;
        let mut terminate = signal(OsSignal::terminate())?;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            loop {
                let kind = tokio::select! {
                    Some(()) = interrupt.recv() => SignalKind::Interrupt,
                    Some(()) = terminate.recv() => SignalKind::Terminate,
                    else => break,
                };
                if tx.send(kind).await.is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    #[cfg(not(unix))]
    fn listen_os(&self) -> std::io::Result<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(SignalKind::Interrupt).await.is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    pub fn sender(&self) -> mpsc::Sender<SignalKind> {
        self.tx.clone()
    }

    /// Next inbound signal. The hub keeps a sender alive, so this only
    /// returns `None` if the channel is closed explicitly.
    pub async fn recv(&mut self) -> Option<SignalKind> {
        self.rx.recv().await
    }

    /// Treat end-of-file on our own stdin as SIGTERM.
    pub fn watch_stdin_close(&self) -> std::io::Result<()> {
        spawn_eof_watcher(std::io::stdin(), self.sender()).map(drop)
    }
}

/// Read `input` to end-of-file on a detached thread, then synthesize
/// [`SignalKind::Terminate`].
///
/// A plain thread is used instead of a runtime task because a blocking stdin
/// read would otherwise hold up runtime shutdown.
pub fn spawn_eof_watcher<R>(
    mut input: R,
    tx: mpsc::Sender<SignalKind>,
) -> std::io::Result<std::thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    std::thread::Builder::new()
        .name("stdin-close-watcher".into())
        .spawn(move || {
            if let Err(e) = std::io::copy(&mut input, &mut std::io::sink()) {
                debug!(error = %e, "stdin read failed");
            }
            info!("synthesizing SIGTERM because of stdin close");
            let _ = tx.blocking_send(SignalKind::Terminate);
        })
}
