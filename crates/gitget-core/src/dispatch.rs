//! Picks a retrieval strategy for a locator and runs it.
//!
//! | Classification | Action |
//! |---|---|
//! | file in a git repository | select branch, shallow clone, read file |
//! | HTTP(S) URL without `.git` | direct GET |
//! | other URL without `.git` | [`FetchError::NotGitUrl`] |
//! | malformed git locator | reported as-is |
//! | not a remote locator | local file read |

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;

use crate::branch::{BranchSelection, select_branch};
use crate::clone::{CloneRequest, GitCliCloner, RepositoryCloner};
use crate::decompose::{Classification, GitRequest, classify, decompose};
use crate::discovery::{RefDiscovery, UploadPackDiscovery};
use crate::error::{DecomposeError, FetchError, FetchResult};
use crate::http::{HttpFetcher, ReqwestFetcher};
use crate::local::read_local_file;
use crate::options::FetchOptions;

/// Where the bytes of a retrieval came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetrievalSource {
    /// A file read from a shallow clone.
    Repository {
        /// Repository URL, password redacted.
        repository: String,
        /// Path inside the repository.
        file_path: String,
        /// Branch that was cloned.
        branch: BranchSelection,
    },
    /// A direct HTTP(S) download.
    Http {
        /// Requested URL, password redacted.
        url: String,
    },
    /// A local file.
    Local {
        /// Path as given.
        path: String,
    },
}

/// Bytes of a retrieved file and their origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieved {
    /// File contents.
    pub bytes: Vec<u8>,
    /// Strategy that served them.
    pub source: RetrievalSource,
}

/// A git locator after decomposition and branch selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRequest {
    /// Repository, file path and explicit branch.
    #[serde(flatten)]
    pub request: GitRequest,
    /// Branch a retrieval would clone.
    pub selection: BranchSelection,
}

/// Retrieves files named by hybrid locators.
///
/// Holds no mutable state; share it freely across tasks.
#[derive(Clone)]
pub struct Fetcher {
    options: FetchOptions,
    cloner: Arc<dyn RepositoryCloner>,
    discovery: Arc<dyn RefDiscovery>,
    http: Arc<dyn HttpFetcher>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Create a fetcher with the default git, upload-pack and HTTP backends.
    #[must_use]
    pub fn new(options: FetchOptions) -> Self {
        Self {
            cloner: Arc::new(GitCliCloner::new(&options)),
            discovery: Arc::new(UploadPackDiscovery::new(&options)),
            http: Arc::new(ReqwestFetcher::new(&options)),
            options,
        }
    }

    /// Replace the repository cloner.
    #[must_use]
    pub fn with_cloner(mut self, cloner: impl RepositoryCloner + 'static) -> Self {
        self.cloner = Arc::new(cloner);
        self
    }

    /// Replace the reference discovery backend.
    #[must_use]
    pub fn with_discovery(mut self, discovery: impl RefDiscovery + 'static) -> Self {
        self.discovery = Arc::new(discovery);
        self
    }

    /// Replace the HTTP backend.
    #[must_use]
    pub fn with_http(mut self, http: impl HttpFetcher + 'static) -> Self {
        self.http = Arc::new(http);
        self
    }

    /// Options in effect.
    #[must_use]
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Retrieve the bytes named by `raw`.
    ///
    /// # Errors
    ///
    /// See [`retrieve`](Self::retrieve).
    pub async fn fetch(&self, raw: &str) -> FetchResult<Vec<u8>> {
        Ok(self.retrieve(raw).await?.bytes)
    }

    /// Retrieve the bytes named by `raw`, along with the strategy used.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Decompose`] for malformed git locators.
    /// - [`FetchError::NotGitUrl`] for non-HTTP URLs without `.git`.
    /// - [`FetchError::BranchResolution`], [`FetchError::Clone`],
    ///   [`FetchError::CloneTimedOut`] or [`FetchError::FileNotInRepository`]
    ///   for repository retrievals.
    /// - [`FetchError::HttpStatus`] and friends for direct downloads.
    /// - [`FetchError::Exhausted`] when the input is not a remote locator
    ///   and the local read fails too.
    pub async fn retrieve(&self, raw: &str) -> FetchResult<Retrieved> {
        let span = tracing::info_span!("fetch", locator = raw);
        self.dispatch(raw).instrument(span).await
    }

    /// Decompose a git locator and select its branch without cloning.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decompose`] for anything that is not a file
    /// in a git repository, and branch selection errors.
    pub async fn resolve(&self, raw: &str) -> FetchResult<ResolvedRequest> {
        let request = decompose(raw)?;
        let selection = select_branch(
            self.discovery.as_ref(),
            &request.repository,
            request.branch.as_deref(),
            self.options.branch_policy,
        )
        .await?;
        Ok(ResolvedRequest { request, selection })
    }

    async fn dispatch(&self, raw: &str) -> FetchResult<Retrieved> {
        match classify(raw) {
            Classification::Repository(request) => {
                tracing::debug!(
                    repository = %request.repository.redacted(),
                    file = %request.file_path,
                    "Retrieving from git repository"
                );
                self.from_repository(request).await
            },
            Classification::Remote(locator) => {
                if !locator.is_http() {
                    return Err(FetchError::NotGitUrl {
                        url: locator.redacted(),
                    });
                }
                tracing::debug!("No .git segment, fetching directly");
                let bytes = self.http.get(raw).await?;
                Ok(Retrieved {
                    bytes,
                    source: RetrievalSource::Http {
                        url: locator.redacted(),
                    },
                })
            },
            Classification::Malformed(err) => Err(err.into()),
            Classification::Local(reason) => {
                tracing::debug!(%reason, "Not a remote locator, reading local file");
                match read_local_file(raw).await {
                    Ok(bytes) => Ok(Retrieved {
                        bytes,
                        source: RetrievalSource::Local {
                            path: raw.to_owned(),
                        },
                    }),
                    Err(local) => Err(FetchError::Exhausted {
                        attempted: DecomposeError::Locator(reason),
                        local: Box::new(local),
                    }),
                }
            },
        }
    }

    async fn from_repository(&self, request: GitRequest) -> FetchResult<Retrieved> {
        let selection = select_branch(
            self.discovery.as_ref(),
            &request.repository,
            request.branch.as_deref(),
            self.options.branch_policy,
        )
        .await?;

        let repository = request.repository.redacted();
        let clone = CloneRequest {
            url: request.repository_url().to_owned(),
            branch: selection.name().map(str::to_owned),
            depth: 1,
            insecure_skip_tls: self.options.insecure_skip_tls,
        };

        let tree = self.cloner.clone_shallow(&clone).await?;
        tracing::info!(%repository, branch = %selection, "Cloned repository");

        let bytes = match tree.read_file(&request.file_path).await {
            Ok(bytes) => bytes,
            Err(FetchError::Io(_)) => {
                return Err(FetchError::FileNotInRepository {
                    repository,
                    path: request.file_path,
                });
            },
            Err(err) => return Err(err),
        };

        Ok(Retrieved {
            bytes,
            source: RetrievalSource::Repository {
                repository,
                file_path: request.file_path,
                branch: selection,
            },
        })
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FetchOptions::default())
    }
}

/// One-shot retrieval with default backends.
///
/// # Errors
///
/// See [`Fetcher::retrieve`].
pub async fn get(raw: &str, options: &FetchOptions) -> FetchResult<Vec<u8>> {
    Fetcher::new(options.clone()).fetch(raw).await
}
