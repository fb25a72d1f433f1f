//! Retrieval options.

use std::path::PathBuf;
use std::time::Duration;

/// Default time allowed for a shallow clone (5 minutes).
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(300);
/// Default time allowed for a reference discovery session.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);
/// Default time allowed for a direct HTTP download.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(120);
/// Default download size cap (100 MiB).
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// What to do when a repository has no explicit branch and its default
/// branch cannot be discovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BranchPolicy {
    /// Log the failure and let the clone use the remote's own default.
    #[default]
    BestEffort,
    /// Fail the retrieval.
    Required,
}

/// Options for a retrieval.
///
/// Every field has a documented default; `FetchOptions::default()` is a
/// complete, usable configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip TLS certificate verification for clone, discovery and HTTP.
    /// Default: `false`.
    pub insecure_skip_tls: bool,
    /// Behaviour when default-branch discovery fails. Default: best effort.
    pub branch_policy: BranchPolicy,
    /// Shallow clone timeout. Default: 300s.
    pub clone_timeout: Duration,
    /// Reference discovery timeout. Default: 30s.
    pub discovery_timeout: Duration,
    /// Direct HTTP download timeout. Default: 120s.
    pub http_timeout: Duration,
    /// Maximum size of a direct HTTP download. Default: 100 MiB.
    pub max_download_bytes: u64,
    /// `git` executable. Default: `git` from `PATH`.
    pub git_program: PathBuf,
    /// `ssh` executable. Default: `ssh` from `PATH`.
    pub ssh_program: PathBuf,
    /// User agent for HTTP requests. Default: `gitget/<version>`.
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            insecure_skip_tls: false,
            branch_policy: BranchPolicy::default(),
            clone_timeout: DEFAULT_CLONE_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            git_program: PathBuf::from("git"),
            ssh_program: PathBuf::from("ssh"),
            user_agent: concat!("gitget/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl FetchOptions {
    /// Skip (or enforce) TLS certificate verification.
    #[must_use]
    pub fn with_insecure_skip_tls(mut self, skip: bool) -> Self {
        self.insecure_skip_tls = skip;
        self
    }

    /// Set the branch resolution policy.
    #[must_use]
    pub fn with_branch_policy(mut self, policy: BranchPolicy) -> Self {
        self.branch_policy = policy;
        self
    }

    /// Set the clone timeout.
    #[must_use]
    pub fn with_clone_timeout(mut self, timeout: Duration) -> Self {
        self.clone_timeout = timeout;
        self
    }

    /// Set the discovery timeout.
    #[must_use]
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the download size cap.
    #[must_use]
    pub fn with_max_download_bytes(mut self, limit: u64) -> Self {
        self.max_download_bytes = limit;
        self
    }
}
