//! Runtime configuration for the wrapper.
//!
//! Values come from built-in defaults, then the command line (which has its
//! own environment-variable fallbacks), then the pluggable-transport
//! environment read by [`WrapperConfig::apply_env`].

use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::HelperFormat;

/// Grace period between asking the helper to terminate and killing it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(16);

/// When set to `1`, end-of-file on our stdin is treated like SIGTERM.
pub const EXIT_ON_STDIN_CLOSE_VAR: &str = "TOR_PT_EXIT_ON_STDIN_CLOSE";

/// Option appended to the client command, followed by the helper address.
pub const HELPER_OPTION: &str = "--helper";

/// Complete wrapper configuration.
#[derive(Debug, Clone)]
pub struct WrapperConfig {
    /// Log destination; `None` logs to stderr.
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub log_json: bool,
    pub helper_format: HelperFormat,
    pub helper_grace: Duration,
    pub exit_on_stdin_close: bool,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_level: "info".to_string(),
            log_json: false,
            helper_format: HelperFormat::Auto,
            helper_grace: DEFAULT_GRACE_PERIOD,
            exit_on_stdin_close: false,
        }
    }
}

impl WrapperConfig {
    /// Pick up settings owned by the pluggable-transport environment.
    pub fn apply_env(&mut self) {
        self.exit_on_stdin_close =
            stdin_close_flag_enabled(std::env::var(EXIT_ON_STDIN_CLOSE_VAR).ok().as_deref());
    }
}

/// Only the literal value `1` enables the stdin-close watcher.
pub fn stdin_close_flag_enabled(value: Option<&str>) -> bool {
    value == Some("1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grace_period_is_16s() {
        let config = WrapperConfig::default();
        assert_eq!(config.helper_grace, Duration::from_secs(16));
        assert!(!config.exit_on_stdin_close);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn stdin_close_flag_requires_literal_one() {
        assert!(stdin_close_flag_enabled(Some("1")));
        assert!(!stdin_close_flag_enabled(Some("true")));
        assert!(!stdin_close_flag_enabled(Some("01")));
        assert!(!stdin_close_flag_enabled(Some("")));
        assert!(!stdin_close_flag_enabled(None));
    }
}
