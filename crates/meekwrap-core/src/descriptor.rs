//! Descriptor file parser.
//!
//! A descriptor is a line-oriented text file describing how to launch the
//! browser helper:
//!
//! ```text
//! # comments and blank lines are skipped
//! MOZ_NO_REMOTE=1
//! MOZ_CRASHREPORTER=
//! firefox.exe
//! -no-remote
//! -profile
//! profile.meek-http-helper
//! ```
//!
//! Leading `NAME=value` lines set variables in the helper's environment
//! (an empty value unsets it). The first line without `=` ends that phase;
//! it and every following line become one command-vector token each.

use std::path::Path;

use tracing::debug;

use crate::command::{CommandVector, EnvMutations, ResolvedCommand};
use crate::error::{Error, Result};

/// Read and parse the descriptor at `path`.
pub fn read_descriptor(path: &Path) -> Result<ResolvedCommand> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::Descriptor {
        path: path.to_path_buf(),
        source,
    })?;
    parse_descriptor(&contents, path)
}

/// Parse descriptor text. `source` is only used for error reporting.
pub fn parse_descriptor(contents: &str, source: &Path) -> Result<ResolvedCommand> {
    let mut env = EnvMutations::new();
    let mut tokens = Vec::new();
    let mut setting_env = true;

    for line in contents.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if setting_env && let Some((name, value)) = line.split_once('=') {
            if value.is_empty() {
                debug!(name, "unset envvar");
                env.unset(name);
            } else {
                debug!(name, value, "set envvar");
                env.set(name, value);
            }
            continue;
        }
        setting_env = false;
        tokens.push(line.to_string());
    }

    if tokens.is_empty() {
        return Err(Error::NoCommands(source.to_path_buf()));
    }
    Ok(ResolvedCommand {
        env,
        command: CommandVector::new(tokens)?,
    })
}
