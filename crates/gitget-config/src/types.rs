//! Configuration struct definitions.
//!
//! Every struct uses `#[serde(default)]` so a partial file only overrides
//! the keys it names.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Retrieval settings.
    pub fetch: FetchSection,
    /// Logging settings.
    pub logging: LoggingSection,
}

/// `[fetch]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    /// Skip TLS certificate verification.
    pub insecure_skip_tls: bool,
    /// Fail when the default branch cannot be discovered.
    pub require_branch: bool,
    /// Shallow clone timeout in seconds.
    pub clone_timeout_secs: u64,
    /// Reference discovery timeout in seconds.
    pub discovery_timeout_secs: u64,
    /// Direct download timeout in seconds.
    pub http_timeout_secs: u64,
    /// Maximum size of a direct download.
    pub max_download_bytes: u64,
    /// `git` executable.
    pub git_program: String,
    /// `ssh` executable.
    pub ssh_program: String,
    /// User agent override for HTTP requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            insecure_skip_tls: false,
            require_branch: false,
            clone_timeout_secs: 300,
            discovery_timeout_secs: 30,
            http_timeout_secs: 120,
            max_download_bytes: 100 * 1024 * 1024,
            git_program: "git".to_owned(),
            ssh_program: "ssh".to_owned(),
            user_agent: None,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level filter (`error`, `warn`, `info`, `debug`, `trace`, `off`).
    pub level: String,
    /// Output format (`pretty`, `compact`, `json`, `full`).
    pub format: String,
    /// Extra filter directives such as `gitget_core=debug`.
    pub directives: Vec<String>,
    /// Use ANSI colors.
    pub ansi: bool,
    /// Include timestamps.
    pub timestamps: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            ansi: true,
            timestamps: true,
        }
    }
}
