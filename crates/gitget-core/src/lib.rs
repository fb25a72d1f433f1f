//! Retrieve a single file from a git repository, an HTTP(S) server or the
//! local filesystem, named by one hybrid locator string.
//!
//! - [`classify`]: Decide which strategy a locator implies
//! - [`decompose`]: Split a git locator into repository, file path and branch
//! - [`detect_ssh`] / [`parse_locator`]: SSH shorthand and URL parsing
//! - [`resolve_default_branch`]: Read the remote `HEAD` over upload-pack
//! - [`Fetcher`]: Dispatch a locator to clone, HTTP or local retrieval
//! - [`get`]: One-shot retrieval with default backends
//!
//! # Locator forms
//!
//! ```text
//! git@github.com:owner/repo.git/path/to/file.yaml@branch
//! ssh://git@github.com:22:owner/repo.git/path/to/file.yaml
//! https://github.com/owner/repo.git/path/to/file.yaml@v1.2.0
//! https://example.com/plain/file.yaml
//! ./relative/file.yaml
//! file:///absolute/file.yaml
//! ```
//!
//! The first path segment containing `.git` separates the repository from
//! the file path. Text after the last `@` names the branch; without one, the
//! branch the remote `HEAD` points at is used.
//!
//! # Collaborators
//!
//! Cloning, reference discovery and HTTP downloads sit behind the
//! [`RepositoryCloner`], [`RefDiscovery`] and [`HttpFetcher`] traits. The
//! defaults shell out to `git`/`ssh` and use `reqwest`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod branch;
pub mod clone;
pub mod decompose;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod local;
pub mod locator;
pub mod options;
mod process;
pub mod validate;
pub mod worktree;

pub use branch::{BranchSelection, select_branch};
pub use clone::{CloneRequest, GitCliCloner, RepositoryCloner};
pub use decompose::{Classification, GitRequest, classify, decompose};
pub use discovery::{
    AdvertisedRefs, ObjectId, Ref, RefDiscovery, UploadPackDiscovery, resolve_default_branch,
};
pub use dispatch::{Fetcher, ResolvedRequest, RetrievalSource, Retrieved, get};
pub use error::{DecomposeError, FetchError, FetchResult, LocatorError};
pub use http::{HttpFetcher, ReqwestFetcher};
pub use local::read_local_file;
pub use locator::{Detection, Locator, detect_ssh, parse_locator};
pub use options::{BranchPolicy, FetchOptions};
pub use validate::validate_git_ref;
pub use worktree::{CheckoutDir, MemoryTree, WorkTree};
