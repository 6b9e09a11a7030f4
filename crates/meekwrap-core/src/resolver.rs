//! Helper command resolution.
//!
//! Turns the `--helper` path into the command vector and environment
//! mutations used to spawn the browser helper.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::command::{CommandVector, EnvMutations, ResolvedCommand};
use crate::descriptor::read_descriptor;
use crate::error::{Error, Result};

/// Yields the helper's command vector and environment from a path.
pub trait CommandResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> Result<ResolvedCommand>;
}

/// Treats the path as the helper executable, run with no arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutableResolver;

impl CommandResolver for ExecutableResolver {
    fn resolve(&self, path: &Path) -> Result<ResolvedCommand> {
        let program = path.to_str().ok_or_else(|| {
            Error::Config(format!(
                "helper path is not valid UTF-8: {}",
                path.display()
            ))
        })?;
        Ok(ResolvedCommand {
            env: EnvMutations::new(),
            command: CommandVector::new(vec![program.to_string()])?,
        })
    }
}

/// Parses the path as a descriptor file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorResolver;

impl CommandResolver for DescriptorResolver {
    fn resolve(&self, path: &Path) -> Result<ResolvedCommand> {
        read_descriptor(path)
    }
}

/// How the `--helper` path is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HelperFormat {
    /// Descriptor file on Windows, plain executable elsewhere.
    #[default]
    Auto,
    Exec,
    Descriptor,
}

impl HelperFormat {
    /// Collapse `Auto` into the concrete format for this platform.
    pub const fn effective(self) -> Self {
        match self {
            Self::Auto if cfg!(windows) => Self::Descriptor,
            Self::Auto => Self::Exec,
            other => other,
        }
    }

    pub fn resolver(self) -> Box<dyn CommandResolver> {
        match self.effective() {
            Self::Descriptor => Box::new(DescriptorResolver),
            _ => Box::new(ExecutableResolver),
        }
    }
}

impl FromStr for HelperFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "exec" => Ok(Self::Exec),
            "descriptor" => Ok(Self::Descriptor),
            other => Err(Error::Config(format!(
                "unknown helper format '{other}' (expected auto, exec or descriptor)"
            ))),
        }
    }
}

impl fmt::Display for HelperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Exec => "exec",
            Self::Descriptor => "descriptor",
        })
    }
}
