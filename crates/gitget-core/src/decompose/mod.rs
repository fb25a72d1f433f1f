//! Splitting git-flavored locators into repository, file path and branch.
//!
//! Accepted shapes:
//! - `git@host[:port]:owner/repo.git/path/in/repo[@branch]`
//! - `ssh://user@host[:port]:owner/repo.git/path/in/repo[@branch]`
//! - `scheme://[user@]host[:port]/owner/repo.git/path/in/repo[@branch]`
//!
//! The first path segment containing `.git` marks the repository boundary.
//! Everything after it is the file path; a trailing `@ref` names the branch.


use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::Serialize;

use crate::error::{DecomposeError, LocatorError};
use crate::locator::{Locator, parse_locator};

/// Characters re-escaped when a decoded segment is written back into a URL
/// path. `@` would split off a branch and `%` would be decoded twice.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'?')
    .add(b'@');

/// A git locator split into its three parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitRequest {
    /// Repository URL, path truncated at the `.git` segment.
    pub repository: Locator,
    /// Non-empty path of the file inside the repository.
    pub file_path: String,
    /// Branch or ref given after the last `@`, if any.
    pub branch: Option<String>,
}

impl GitRequest {
    /// Canonical repository URL string.
    #[must_use]
    pub fn repository_url(&self) -> &str {
        self.repository.as_str()
    }

    /// Re-join the three parts into a locator string that decomposes back
    /// into the same request.
    #[must_use]
    pub fn to_locator_string(&self) -> String {
        let mut url = self.repository.as_url().clone();
        let mut path = self.repository.path().trim_end_matches('/').to_owned();
        for segment in self.file_path.split('/') {
            path.push('/');
            path.extend(utf8_percent_encode(segment, SEGMENT));
        }
        if let Some(branch) = &self.branch {
            path.push('@');
            path.extend(utf8_percent_encode(branch, SEGMENT));
        }
        url.set_path(&path);
        url.to_string()
    }
}

/// How a raw locator string should be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A file inside a git repository.
    Repository(GitRequest),
    /// A URL without any `.git` segment: fetch it directly.
    Remote(Locator),
    /// Not a remote locator: read it from the local filesystem.
    Local(LocatorError),
    /// A git locator that cannot be served. Reported as-is.
    Malformed(DecomposeError),
}

/// Classify a raw locator by trying each strategy in order.
#[must_use]
pub fn classify(raw: &str) -> Classification {
    let locator = match parse_locator(raw) {
        Ok(locator) => locator,
        Err(err @ LocatorError::MalformedSsh { .. }) => {
            return Classification::Malformed(DecomposeError::Locator(err));
        },
        Err(err) => return Classification::Local(err),
    };

    match decompose_locator(&locator) {
        Ok(request) => Classification::Repository(request),
        Err(DecomposeError::NotGitUrl { .. }) => Classification::Remote(locator),
        Err(err) => Classification::Malformed(err),
    }
}

/// Split a raw git locator into repository URL, file path and branch.
///
/// Performs no I/O: when no branch is given, [`GitRequest::branch`] is
/// `None` and the caller decides how to pick one.
///
/// # Errors
///
/// - [`DecomposeError::Locator`] if the input is not a remote locator.
/// - [`DecomposeError::NotGitUrl`] if no path segment contains `.git`.
/// - [`DecomposeError::MissingFilePath`] if nothing follows the `.git` segment.
/// - [`DecomposeError::PathTraversal`] if the file path contains `..`.
pub fn decompose(raw: &str) -> Result<GitRequest, DecomposeError> {
    let locator = parse_locator(raw)?;
    decompose_locator(&locator)
}

fn decompose_locator(locator: &Locator) -> Result<GitRequest, DecomposeError> {
    let (path, branch) = split_branch(locator.path());

    let segments: Vec<&str> = path.split('/').collect();
    let Some(boundary) = segments.iter().position(|s| s.contains(".git")) else {
        return Err(DecomposeError::NotGitUrl {
            url: locator.to_string(),
        });
    };

    let (repo_segments, file_segments) = segments.split_at(boundary.saturating_add(1));

    let repo_path = format!("/{}", join_segments(repo_segments.iter().copied()));

    let decoded: Vec<String> = file_segments
        .iter()
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect();
    if decoded.iter().any(|s| s == "..") {
        return Err(DecomposeError::PathTraversal {
            url: locator.to_string(),
        });
    }
    let file_path = join_segments(decoded.iter().map(String::as_str));
    if file_path.is_empty() {
        return Err(DecomposeError::MissingFilePath {
            url: locator.to_string(),
        });
    }

    Ok(GitRequest {
        repository: locator.with_path(&repo_path),
        file_path,
        branch,
    })
}

/// Split `path@branch` on the last `@`. An empty branch counts as none.
fn split_branch(path: &str) -> (&str, Option<String>) {
    match path.rsplit_once('@') {
        Some((rest, branch)) => {
            let branch = percent_decode_str(branch).decode_utf8_lossy();
            (rest, (!branch.is_empty()).then(|| branch.into_owned()))
        },
        None => (path, None),
    }
}

/// Join segments with `/`, dropping empty and `.` segments.
fn join_segments<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    segments
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}
