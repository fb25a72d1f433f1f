//! Error types for locator parsing, decomposition and retrieval.

use std::path::PathBuf;

/// Errors from turning a raw string into a [`Locator`](crate::Locator).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    /// The input looked like an SSH endpoint but could not be normalized.
    #[error("malformed ssh url '{input}': {message}")]
    MalformedSsh {
        /// The raw input.
        input: String,
        /// Why normalization failed.
        message: String,
    },

    /// The input is a `file://` URL and belongs to the local reader.
    #[error("local path")]
    LocalPath,

    /// The input is not a well-formed absolute URL.
    #[error("invalid url '{input}': {message}")]
    InvalidUrl {
        /// The raw input.
        input: String,
        /// Parser message.
        message: String,
    },
}

/// Errors from splitting a locator into repository, file path and branch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecomposeError {
    /// The input is not a remote locator at all.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// The input is a URL but no path segment contains `.git`.
    #[error("not a git url, does not contain '.git': {url}")]
    NotGitUrl {
        /// The canonical URL.
        url: String,
    },

    /// The `.git` segment is the last path segment, so no file is designated.
    #[error(
        "invalid git url '{url}': expected {{https|ssh}}://domain.tld/{{name}}.git/{{path}}[@{{branch}}]"
    )]
    MissingFilePath {
        /// The canonical URL.
        url: String,
    },

    /// The in-repository path climbs out of the repository.
    #[error("invalid file path in '{url}': '..' segments are not allowed")]
    PathTraversal {
        /// The canonical URL.
        url: String,
    },
}

impl DecomposeError {
    /// Whether this failure designates a malformed git locator that must be
    /// reported instead of handed to another retrieval strategy.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MissingFilePath { .. }
                | Self::PathTraversal { .. }
                | Self::Locator(LocatorError::MalformedSsh { .. })
        )
    }
}

/// Errors from retrieving the bytes behind a locator.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Resolving a local path to an absolute path failed.
    #[error("invalid path {path}: {source}")]
    InvalidPath {
        /// The path as given.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading a local file failed.
    #[error("invalid uri {}: {source}", path.display())]
    InvalidUri {
        /// The absolute path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The locator is a URL without a `.git` segment that cannot be fetched
    /// over HTTP.
    #[error("not a git url and not fetchable over http: {url}")]
    NotGitUrl {
        /// The raw locator.
        url: String,
    },

    /// The locator is a malformed git locator.
    #[error(transparent)]
    Decompose(#[from] DecomposeError),

    /// Neither the remote strategies nor the local reader applied.
    #[error("{attempted}: {local}")]
    Exhausted {
        /// Why the locator was not treated as remote.
        attempted: DecomposeError,
        /// Why the local read failed.
        local: Box<FetchError>,
    },

    /// The repository has no explicit branch and the default branch could
    /// not be discovered.
    #[error("could not resolve default branch of {repository}: {reason}")]
    BranchResolution {
        /// Repository URL.
        repository: String,
        /// Why discovery failed.
        reason: String,
    },

    /// A branch or ref name is not safe to pass to git.
    #[error("invalid git ref '{git_ref}': {reason}")]
    InvalidRef {
        /// The rejected ref.
        git_ref: String,
        /// Rule that was violated.
        reason: String,
    },

    /// The reference advertisement could not be obtained or understood.
    #[error("discovery failed for {endpoint}: {message}")]
    Discovery {
        /// Repository endpoint.
        endpoint: String,
        /// Failure description.
        message: String,
    },

    /// No transport is available for this URL scheme.
    #[error("unsupported transport '{scheme}' for {url}")]
    UnsupportedTransport {
        /// URL scheme.
        scheme: String,
        /// The URL.
        url: String,
    },

    /// The shallow clone failed.
    #[error("git clone of {repository} failed: {message}")]
    Clone {
        /// Repository URL.
        repository: String,
        /// Failure description (usually git's stderr).
        message: String,
    },

    /// The shallow clone did not finish in time.
    #[error("git clone of {repository} timed out after {secs}s")]
    CloneTimedOut {
        /// Repository URL.
        repository: String,
        /// Timeout in seconds.
        secs: u64,
    },

    /// The requested file is not in the cloned tree.
    #[error("error in cloned git repository {repository}: file not found: {path}")]
    FileNotInRepository {
        /// Repository URL.
        repository: String,
        /// In-repository path that was attempted.
        path: String,
    },

    /// A tree path resolves outside the checkout.
    #[error("path escapes the repository checkout: {path}")]
    PathEscape {
        /// The offending in-repository path.
        path: String,
    },

    /// The HTTP request failed before a response was received.
    #[error("http request to {url} failed: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// Failure description.
        message: String,
    },

    /// The HTTP server answered with a non-success status.
    #[error("http {status} from {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// The download exceeded the configured size limit.
    #[error("download too large: {size} bytes (limit: {limit} bytes)")]
    DownloadTooLarge {
        /// Bytes seen so far (or announced by the server).
        size: u64,
        /// Maximum allowed size in bytes.
        limit: u64,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for retrieval operations.
pub type FetchResult<T> = Result<T, FetchError>;
