//! Shallow clones of a single branch.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::options::FetchOptions;
use crate::process::{hardened_command, stderr_summary};
use crate::worktree::{CheckoutDir, WorkTree};

/// Parameters of one clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    /// Repository URL.
    pub url: String,
    /// Branch to check out; `None` takes the remote default.
    pub branch: Option<String>,
    /// History depth.
    pub depth: u32,
    /// Skip TLS certificate verification.
    pub insecure_skip_tls: bool,
}

impl CloneRequest {
    /// A depth-1 clone of `url`.
    #[must_use]
    pub fn shallow(url: impl Into<String>, branch: Option<String>) -> Self {
        Self {
            url: url.into(),
            branch,
            depth: 1,
            insecure_skip_tls: false,
        }
    }

    /// `url` with any password replaced by `***`.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        match Url::parse(&self.url) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("***"));
                url.to_string()
            },
            _ => self.url.clone(),
        }
    }

    /// Mask the password of `url` wherever it appears in `message`.
    fn scrub(&self, message: String) -> String {
        let Some(password) = Url::parse(&self.url)
            .ok()
            .and_then(|url| url.password().map(str::to_owned))
        else {
            return message;
        };
        let decoded = percent_decode_str(&password).decode_utf8_lossy().into_owned();
        message.replace(&password, "***").replace(&decoded, "***")
    }
}

/// Produces a readable tree from a repository.
#[async_trait]
pub trait RepositoryCloner: Send + Sync {
    /// Clone `request.url` and return the checked-out tree.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Clone`] or [`FetchError::CloneTimedOut`].
    async fn clone_shallow(&self, request: &CloneRequest) -> FetchResult<Box<dyn WorkTree>>;
}

/// Clones with the `git` executable into a temporary directory.
#[derive(Debug, Clone)]
pub struct GitCliCloner {
    program: PathBuf,
    timeout: Duration,
}

impl GitCliCloner {
    /// Use `options.git_program`, bounded by `options.clone_timeout`.
    #[must_use]
    pub fn new(options: &FetchOptions) -> Self {
        Self {
            program: options.git_program.clone(),
            timeout: options.clone_timeout,
        }
    }

    async fn run_clone(&self, request: &CloneRequest) -> FetchResult<CheckoutDir> {
        let clone_error = |message: String| FetchError::Clone {
            repository: request.redacted_url(),
            message: request.scrub(message),
        };

        let tmp = tempfile::tempdir()
            .map_err(|e| clone_error(format!("failed to create temp dir: {e}")))?;
        let clone_path = tmp.path().join("repo");

        let mut cmd = hardened_command(&self.program);
        if request.insecure_skip_tls {
            cmd.args(["-c", "http.sslVerify=false"]);
        }
        cmd.arg("clone")
            .arg(format!("--depth={}", request.depth.max(1)))
            .args(["--single-branch", "--no-tags"]);
        if let Some(branch) = &request.branch {
            cmd.args(["--branch", branch.as_str()]);
        }
        cmd.arg("--").arg(&request.url).arg(&clone_path);

        let output = cmd
            .output()
            .await
            .map_err(|e| clone_error(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            return Err(clone_error(stderr_summary(
                &output.stderr,
                &format!("git exited with {}", output.status),
            )));
        }

        CheckoutDir::new(tmp, &clone_path)
    }
}

impl Default for GitCliCloner {
    fn default() -> Self {
        Self::new(&FetchOptions::default())
    }
}

#[async_trait]
impl RepositoryCloner for GitCliCloner {
    async fn clone_shallow(&self, request: &CloneRequest) -> FetchResult<Box<dyn WorkTree>> {
        tracing::debug!(
            url = %request.redacted_url(),
            branch = request.branch.as_deref().unwrap_or("<remote default>"),
            "Cloning repository"
        );

        // Dropping the future on timeout kills the child.
        let checkout = tokio::time::timeout(self.timeout, self.run_clone(request))
            .await
            .map_err(|_| FetchError::CloneTimedOut {
                repository: request.redacted_url(),
                secs: self.timeout.as_secs(),
            })??;

        Ok(Box::new(checkout))
    }
}
