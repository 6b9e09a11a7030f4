//! Handle to a supervised child process.

use std::fmt;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::{Child, ChildStdin};
use tracing::{debug, info, warn};

use crate::error::SignalError;
use crate::signals::SignalKind;

/// Which of the two supervised processes a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRole {
    Helper,
    Client,
}

impl fmt::Display for ChildRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Helper => "browser-helper",
            Self::Client => "meek-client",
        })
    }
}

/// How a child ended up during cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Exited on its own; no kill was issued.
    Exited(ExitStatus),
    /// A forced kill was issued and the child reaped.
    Killed,
    /// The kill itself failed.
    Failed,
}

/// A running child owned by its supervisor.
#[derive(Debug)]
pub struct SupervisedChild {
    role: ChildRole,
    pid: Option<u32>,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl SupervisedChild {
    /// Take ownership of a freshly spawned child. Its stdin pipe, if any, is
    /// held so it can be closed as a shutdown hint.
    pub fn new(role: ChildRole, mut child: Child) -> Self {
        let stdin = child.stdin.take();
        let pid = child.id();
        Self {
            role,
            pid,
            child,
            stdin,
        }
    }

    pub const fn role(&self) -> ChildRole {
        self.role
    }

    /// Pid recorded at spawn time.
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Close our end of the child's stdin. Returns `false` if already closed.
    pub fn close_stdin(&mut self) -> bool {
        if self.stdin.take().is_some() {
            debug!(role = %self.role, pid = ?self.pid, "closed stdin");
            true
        } else {
            false
        }
    }

    /// Deliver `kind` to the child.
    #[cfg(unix)]
    pub fn signal(&self, kind: SignalKind) -> Result<(), SignalError> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        // `id()` turns to None once the child is reaped, so a recycled pid is
        // never signalled.
        let pid = self
            .child
            .id()
            .and_then(|pid| i32::try_from(pid).ok())
            .ok_or(SignalError::NotRunning(self.role))?;
        let signal = match kind {
            SignalKind::Interrupt => Signal::SIGINT,
            SignalKind::Terminate => Signal::SIGTERM,
        };
        kill(Pid::from_raw(pid), signal).map_err(|errno| SignalError::Os(errno.into()))
    }

    /// Deliver `kind` to the child.
    #[cfg(not(unix))]
    pub fn signal(&self, kind: SignalKind) -> Result<(), SignalError> {
        let _ = kind;
        if self.child.id().is_none() {
            return Err(SignalError::NotRunning(self.role));
        }
        Err(SignalError::Unsupported)
    }

    /// Ask the child to exit, then kill it if it is still running after
    /// `grace`.
    ///
    /// Stdin is closed first, then SIGTERM is sent (a no-op where signals are
    /// unsupported). Whichever comes first wins: the child exiting, in which
    /// case no kill is issued, or the grace period running out.
    pub async fn terminate(&mut self, grace: Duration) -> ShutdownOutcome {
        info!(role = %self.role, pid = ?self.pid, "closing stdin of and sending TERM");
        self.close_stdin();
        if let Err(e) = self.signal(SignalKind::Terminate) {
            debug!(role = %self.role, pid = ?self.pid, error = %e, "TERM not delivered");
        }

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(role = %self.role, pid = ?self.pid, %status, "cleanly closed");
                ShutdownOutcome::Exited(status)
            }
            Ok(Err(e)) => {
                warn!(role = %self.role, pid = ?self.pid, error = %e, "Error waiting for process");
                self.kill().await
            }
            Err(_) => {
                warn!(
                    role = %self.role,
                    pid = ?self.pid,
                    grace_secs = grace.as_secs_f64(),
                    "Timeout waiting for graceful shutdown, killing"
                );
                self.kill().await
            }
        }
    }

    /// Kill the child outright and reap it. A child that has already exited
    /// is only reaped.
    pub async fn kill(&mut self) -> ShutdownOutcome {
        self.close_stdin();
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(role = %self.role, pid = ?self.pid, %status, "already exited");
                return ShutdownOutcome::Exited(status);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(role = %self.role, pid = ?self.pid, error = %e, "Failed to poll process");
            }
        }

        info!(role = %self.role, pid = ?self.pid, "killing");
        match self.child.kill().await {
            Ok(()) => {
                info!(role = %self.role, pid = ?self.pid, "killed");
                ShutdownOutcome::Killed
            }
            Err(e) => {
                warn!(role = %self.role, pid = ?self.pid, error = %e, "Failed to kill process");
                ShutdownOutcome::Failed
            }
        }
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::os::unix::process::ExitStatusExt;
    use std::process::Stdio;

    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::process::Command;

    use super::*;
    use crate::signals::SignalHub;
    use crate::termination::{SignalForwarder, TerminationCoordinator, TerminationState};

    fn spawn_sh(script: &str) -> Child {
        Command::new("sh")
            .arg("-c")
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    /// Spawn a script that prints `ready` once it is set up.
    async fn spawn_ready(script: &str) -> SupervisedChild {
        let mut child = spawn_sh(script);
        let stdout = child.stdout.take().unwrap();
        let mut lines = BufReader::new(stdout).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ready"));
        SupervisedChild::new(ChildRole::Helper, child)
    }

    #[test]
    fn role_names() {
        assert_eq!(ChildRole::Helper.to_string(), "browser-helper");
        assert_eq!(ChildRole::Client.to_string(), "meek-client");
    }

    #[tokio::test]
    async fn terminate_within_grace_issues_no_kill() {
        let mut child = spawn_ready("echo ready; exec sleep 30").await;
        let outcome = child.terminate(Duration::from_secs(10)).await;
        match outcome {
            ShutdownOutcome::Exited(status) => assert!(!status.success()),
            other => panic!("expected Exited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn terminate_kills_after_grace_when_term_is_ignored() {
        let mut child = spawn_ready("trap '' TERM; echo ready; exec sleep 30").await;
        let outcome = child.terminate(Duration::from_millis(300)).await;
        assert_eq!(outcome, ShutdownOutcome::Killed);
    }

    #[tokio::test]
    async fn closing_stdin_lets_cooperative_child_exit() {
        // `cat` exits on EOF, so the stdin close alone is enough.
        let mut child = spawn_ready("trap '' TERM; echo ready; exec cat >/dev/null").await;
        let outcome = child.terminate(Duration::from_secs(10)).await;
        match outcome {
            ShutdownOutcome::Exited(status) => assert!(status.success()),
            other => panic!("expected Exited, got {other:?}"),
        }
        assert!(!child.close_stdin());
    }

    #[tokio::test]
    async fn kill_on_exited_child_only_reaps() {
        let mut child = SupervisedChild::new(ChildRole::Client, spawn_sh("exit 3"));
        let status = child.child.wait().await.unwrap();
        assert_eq!(status.code(), Some(3));
        assert_eq!(child.kill().await, ShutdownOutcome::Exited(status));
    }

    #[tokio::test]
    async fn signal_after_reap_is_refused() {
        let mut child = SupervisedChild::new(ChildRole::Client, spawn_sh("exit 0"));
        child.child.wait().await.unwrap();
        assert!(matches!(
            child.signal(SignalKind::Terminate),
            Err(SignalError::NotRunning(ChildRole::Client))
        ));
    }

    #[tokio::test]
    async fn interrupt_is_delivered() {
        let mut child = spawn_ready("echo ready; exec sleep 30").await;
        child.signal(SignalKind::Interrupt).unwrap();
        let status = child.child.wait().await.unwrap();
        assert_eq!(status.signal(), Some(nix::libc::SIGINT));
    }

    async fn wait_for_lines(path: &std::path::Path, count: usize) -> String {
        for _ in 0..100 {
            if let Ok(contents) = tokio::fs::read_to_string(path).await
                && contents.lines().count() >= count
            {
                return contents;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("{} never reached {count} lines", path.display());
    }

    #[tokio::test]
    async fn forward_closes_stdin_before_signalling() {
        let dir = tempfile::TempDir::new().unwrap();
        let record = dir.path().join("record");
        // The trap reads stdin: it only sees EOF if the pipe was closed
        // before the signal arrived, otherwise it blocks.
        let script = format!(
            "trap 'if read -r x; then s=open; else s=eof; fi; echo \"TERM $s\" >> {rec}; exit 0' TERM; \
             echo ready; while :; do sleep 0.05; done",
            rec = record.display()
        );
        let mut client = spawn_ready(&script).await;

        client.forward(SignalKind::Terminate);
        assert!(!client.close_stdin());

        let status = tokio::time::timeout(Duration::from_secs(5), client.child.wait())
            .await
            .expect("client did not handle SIGTERM")
            .unwrap();
        assert!(status.success());
        assert_eq!(std::fs::read_to_string(&record).unwrap(), "TERM eof\n");
    }

    #[tokio::test]
    async fn double_interrupt_reaches_client_twice() {
        let dir = tempfile::TempDir::new().unwrap();
        let record = dir.path().join("record");
        let script = format!(
            "n=0; trap 'n=$((n+1)); echo INT >> {rec}; if [ $n -ge 2 ]; then exit 0; fi' INT; \
             echo ready; while :; do sleep 0.05; done",
            rec = record.display()
        );
        let mut client = spawn_ready(&script).await;
        let mut hub = SignalHub::detached();
        let sender = hub.sender();
        let mut coordinator = TerminationCoordinator::new();

        let drive = async {
            sender.send(SignalKind::Interrupt).await.unwrap();
            // Space the two so the shell cannot coalesce them.
            wait_for_lines(&record, 1).await;
            sender.send(SignalKind::Interrupt).await.unwrap();
        };
        let (state, ()) = tokio::time::timeout(
            Duration::from_secs(10),
            async { tokio::join!(coordinator.run(&mut hub, &mut client), drive) },
        )
        .await
        .expect("coordinator did not reach Terminating");
        assert_eq!(state, TerminationState::Terminating);

        let status = tokio::time::timeout(Duration::from_secs(5), client.child.wait())
            .await
            .expect("client did not exit after second SIGINT")
            .unwrap();
        assert!(status.success());
        assert_eq!(wait_for_lines(&record, 2).await, "INT\nINT\n");
    }
}
