//! Browser helper startup.

use std::process::Stdio;

use meekwrap_core::{EnvMutation, EnvMutations, ResolvedCommand};
use tokio::process::{ChildStdout, Command};
use tracing::info;

use super::child::{ChildRole, SupervisedChild};
use crate::error::SpawnError;

/// Start the browser helper.
///
/// Stderr is inherited so the operator sees it, stdout is returned for the
/// handshake scanner, and stdin is piped so cleanup can close it. The
/// environment mutations apply to the helper only.
pub fn start(resolved: &ResolvedCommand) -> Result<(SupervisedChild, ChildStdout), SpawnError> {
    let role = ChildRole::Helper;
    let mut cmd = Command::new(resolved.command.program());
    cmd.args(resolved.command.args())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    apply_env(&mut cmd, &resolved.env);

    info!(command = ?resolved.command.as_slice(), "running browser-helper command");
    let mut child = cmd.spawn().map_err(|source| SpawnError::Spawn {
        role,
        program: resolved.command.program().to_string(),
        source,
    })?;

    let Some(stdout) = child.stdout.take() else {
        let _ = child.start_kill();
        return Err(SpawnError::Capture {
            role,
            stream: "stdout",
        });
    };

    let child = SupervisedChild::new(role, child);
    info!(pid = ?child.pid(), "browser-helper started");
    Ok((child, stdout))
}

fn apply_env(cmd: &mut Command, env: &EnvMutations) {
    for (name, mutation) in env.iter() {
        match mutation {
            EnvMutation::Set(value) => {
                cmd.env(name, value);
            }
            EnvMutation::Unset => {
                cmd.env_remove(name);
            }
        }
    }
}
