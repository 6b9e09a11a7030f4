//! Ordered cleanup of supervised children.
//!
//! Each child is pushed as soon as it is started and the stack is unwound in
//! reverse order on every exit path, so meek-client is always dealt with
//! before the browser helper.

use std::time::Duration;

use tracing::debug;

use crate::subprocess::{ChildRole, ShutdownOutcome, SupervisedChild};

/// How a child is stopped during unwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Close stdin, send SIGTERM, kill after the grace period.
    Graceful(Duration),
    /// Kill right away.
    Immediate,
}

#[derive(Debug)]
struct CleanupEntry {
    child: SupervisedChild,
    policy: ShutdownPolicy,
}

/// Children awaiting cleanup, in acquisition order.
#[derive(Debug, Default)]
pub struct CleanupStack {
    entries: Vec<CleanupEntry>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a child and hand back a reference for signalling it.
    pub fn push(&mut self, child: SupervisedChild, policy: ShutdownPolicy) -> &mut SupervisedChild {
        debug!(role = %child.role(), pid = ?child.pid(), ?policy, "registered for cleanup");
        self.entries.push(CleanupEntry { child, policy });
        let last = self.entries.len() - 1;
        &mut self.entries[last].child
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stop every registered child, most recent first. Each child is handled
    /// once; unwinding an empty stack does nothing.
    pub async fn unwind(&mut self) -> Vec<(ChildRole, ShutdownOutcome)> {
        let mut outcomes = Vec::with_capacity(self.entries.len());
        while let Some(CleanupEntry { mut child, policy }) = self.entries.pop() {
            let outcome = match policy {
                ShutdownPolicy::Graceful(grace) => child.terminate(grace).await,
                ShutdownPolicy::Immediate => child.kill().await,
            };
            outcomes.push((child.role(), outcome));
        }
        outcomes
    }
}
