//! Default-branch discovery through the read-only upload-pack protocol.
//!
//! A single session per repository: connect, read the reference
//! advertisement, disconnect. The branch `HEAD` points at is the default.

pub mod advertisement;
pub mod pktline;
mod transport;

use async_trait::async_trait;

pub use advertisement::{AdvertisedRefs, ObjectId, Ref};
pub use transport::MAX_ADVERTISEMENT_SIZE;

use crate::error::{FetchError, FetchResult};
use crate::locator::Locator;
use crate::options::FetchOptions;
use transport::SessionSettings;

/// Source of reference advertisements.
#[async_trait]
pub trait RefDiscovery: Send + Sync {
    /// List the references a repository advertises.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Discovery`] when the session fails and
    /// [`FetchError::UnsupportedTransport`] for unknown schemes.
    async fn advertised_refs(&self, repository: &Locator) -> FetchResult<AdvertisedRefs>;
}

/// Discovery over `git-upload-pack`: smart HTTP, ssh and the git daemon.
#[derive(Debug, Clone)]
pub struct UploadPackDiscovery {
    settings: SessionSettings,
}

impl UploadPackDiscovery {
    /// Build from retrieval options (timeout, TLS, ssh program, user agent).
    #[must_use]
    pub fn new(options: &FetchOptions) -> Self {
        Self {
            settings: SessionSettings {
                timeout: options.discovery_timeout,
                insecure_skip_tls: options.insecure_skip_tls,
                ssh_program: options.ssh_program.clone(),
                user_agent: options.user_agent.clone(),
            },
        }
    }
}

impl Default for UploadPackDiscovery {
    fn default() -> Self {
        Self::new(&FetchOptions::default())
    }
}

#[async_trait]
impl RefDiscovery for UploadPackDiscovery {
    async fn advertised_refs(&self, repository: &Locator) -> FetchResult<AdvertisedRefs> {
        let session = async {
            match repository.scheme() {
                "http" | "https" => transport::discover_http(repository, &self.settings).await,
                scheme if scheme.contains("ssh") => {
                    transport::discover_ssh(repository, &self.settings).await
                },
                "git" => transport::discover_git(repository).await,
                other => Err(FetchError::UnsupportedTransport {
                    scheme: other.to_owned(),
                    url: repository.redacted(),
                }),
            }
        };

        tokio::time::timeout(self.settings.timeout, session)
            .await
            .map_err(|_| FetchError::Discovery {
                endpoint: repository.redacted(),
                message: format!("timed out after {}s", self.settings.timeout.as_secs()),
            })?
    }
}

/// Name of the branch a repository's `HEAD` points at (`main`, not
/// `refs/heads/main`).
///
/// # Errors
///
/// Propagates discovery failures, and returns [`FetchError::Discovery`]
/// when the repository does not advertise a `HEAD` (for example when it
/// is empty).
pub async fn resolve_default_branch(
    discovery: &dyn RefDiscovery,
    repository: &Locator,
) -> FetchResult<String> {
    let refs = discovery.advertised_refs(repository).await?;
    let branch = refs
        .default_branch()
        .ok_or_else(|| FetchError::Discovery {
            endpoint: repository.redacted(),
            message: "remote does not advertise HEAD".to_owned(),
        })?
        .to_owned();

    tracing::info!(repository = %repository.redacted(), %branch, "Resolved default branch");
    Ok(branch)
}
