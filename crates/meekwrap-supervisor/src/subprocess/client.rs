//! meek-client startup.

use std::process::Stdio;

use meekwrap_core::config::HELPER_OPTION;
use meekwrap_core::{CommandVector, HelperAddress};
use tokio::process::Command;
use tracing::info;

use super::child::{ChildRole, SupervisedChild};
use crate::error::SpawnError;

/// Append `--helper <address>` to the caller's command line.
pub fn build_command(address: &HelperAddress, base: &CommandVector) -> CommandVector {
    let mut command = base.clone();
    command.extend([HELPER_OPTION, address.as_str()]);
    command
}

/// Start meek-client pointed at the helper.
///
/// Stdout and stderr are inherited unmodified; stdin is piped so it can be
/// closed before the client is signalled.
pub fn start(address: &HelperAddress, base: &CommandVector) -> Result<SupervisedChild, SpawnError> {
    let role = ChildRole::Client;
    let command = build_command(address, base);
    let mut cmd = Command::new(command.program());
    cmd.args(command.args())
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    info!(command = ?command.as_slice(), "running meek-client command");
    let child = cmd.spawn().map_err(|source| SpawnError::Spawn {
        role,
        program: command.program().to_string(),
        source,
    })?;

    let child = SupervisedChild::new(role, child);
    info!(pid = ?child.pid(), "meek-client started");
    Ok(child)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use meekwrap_core::address::match_listen_line;

    use super::*;

    fn address() -> HelperAddress {
        match_listen_line("meek-http-helper: listen 127.0.0.1:9999").unwrap()
    }

    fn base(tokens: &[&str]) -> CommandVector {
        CommandVector::new(tokens.iter().map(ToString::to_string).collect()).unwrap()
    }

    #[test]
    fn helper_option_goes_last() {
        let cmd = build_command(&address(), &base(&["./meek-client", "--url=https://x/", "--log", "c.log"]));
        assert_eq!(
            cmd.as_slice(),
            ["./meek-client", "--url=https://x/", "--log", "c.log", "--helper", "127.0.0.1:9999"]
        );
    }

    #[test]
    fn bare_program_gets_helper_option() {
        let cmd = build_command(&address(), &base(&["meek-client"]));
        assert_eq!(cmd.as_slice(), ["meek-client", "--helper", "127.0.0.1:9999"]);
    }

    #[test]
    fn existing_helper_option_is_not_replaced() {
        let cmd = build_command(&address(), &base(&["meek-client", "--helper", "1.2.3.4:5"]));
        assert_eq!(
            cmd.as_slice(),
            ["meek-client", "--helper", "1.2.3.4:5", "--helper", "127.0.0.1:9999"]
        );
    }

    #[tokio::test]
    async fn missing_executable_is_spawn_error() {
        let err = start(&address(), &base(&["/nonexistent/meek-client"])).unwrap_err();
        assert!(matches!(err, SpawnError::Spawn { role: ChildRole::Client, .. }));
    }
}
