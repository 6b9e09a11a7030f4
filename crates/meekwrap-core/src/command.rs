//! Command vectors and environment mutations produced by command resolution.

use crate::error::{Error, Result};

/// An executable path followed by its arguments. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVector(Vec<String>);

impl CommandVector {
    /// Build a command vector, rejecting an empty token list.
    pub fn new(tokens: Vec<String>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(Error::EmptyCommand);
        }
        Ok(Self(tokens))
    }

    /// The executable (first token).
    pub fn program(&self) -> &str {
        &self.0[0]
    }

    /// Everything after the executable.
    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Append tokens at the end of the vector.
    pub fn extend<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(tokens.into_iter().map(Into::into));
    }
}

/// What to do with one environment variable in the helper's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvMutation {
    Set(String),
    Unset,
}

/// Ordered set of environment mutations.
///
/// Order is preserved so that a later line for the same variable wins, the
/// same as applying the lines one after another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMutations(Vec<(String, EnvMutation)>);

impl EnvMutations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), EnvMutation::Set(value.into())));
    }

    pub fn unset(&mut self, name: impl Into<String>) {
        self.0.push((name.into(), EnvMutation::Unset));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnvMutation)> {
        self.0.iter().map(|(name, m)| (name.as_str(), m))
    }

    /// Final effect of the mutations on `name`, if any line touched it.
    pub fn get(&self, name: &str) -> Option<&EnvMutation> {
        self.0.iter().rev().find(|(n, _)| n == name).map(|(_, m)| m)
    }
}

/// Output of a [`CommandResolver`](crate::resolver::CommandResolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub env: EnvMutations,
    pub command: CommandVector,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_vector_is_rejected() {
        assert!(matches!(CommandVector::new(vec![]), Err(Error::EmptyCommand)));
    }

    #[test]
    fn program_and_args_split() {
        let cmd = CommandVector::new(vec!["helper".into(), "-a".into(), "b".into()]).unwrap();
        assert_eq!(cmd.program(), "helper");
        assert_eq!(cmd.args(), ["-a", "b"]);
    }

    #[test]
    fn later_mutation_wins() {
        let mut env = EnvMutations::new();
        env.set("FOO", "one");
        env.unset("FOO");
        assert_eq!(env.get("FOO"), Some(&EnvMutation::Unset));
        assert_eq!(env.len(), 2);
        assert!(env.get("BAR").is_none());
    }
}
