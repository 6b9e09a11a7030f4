//! The helper's listen announcement.
//!
//! meek-http-helper prints `meek-http-helper: listen 127.0.0.1:<port>` on its
//! standard output once its local endpoint is bound.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Pre-compiled pattern for the listen announcement, anchored on both ends.
#[allow(clippy::expect_used)]
static LISTEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^meek-http-helper: listen (127\.0\.0\.1:[0-9]+)$").expect("static regex is valid")
});

/// `host:port` address announced by the helper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HelperAddress(String);

impl HelperAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for HelperAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Match one output line (without its terminator) against the announcement.
pub fn match_listen_line(line: &str) -> Option<HelperAddress> {
    LISTEN_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| HelperAddress(m.as_str().to_string()))
}
