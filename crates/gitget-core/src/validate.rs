//! Guards for values that end up on a `git` or `ssh` command line.

use crate::error::{FetchError, FetchResult};

fn invalid_ref(git_ref: &str, reason: impl Into<String>) -> FetchError {
    FetchError::InvalidRef {
        git_ref: git_ref.to_owned(),
        reason: reason.into(),
    }
}

/// Validate a branch or tag name before it is handed to `git clone --branch`.
///
/// Rejects control characters, path traversal (`..`), leading dashes and
/// names git itself refuses.
///
/// # Errors
///
/// Returns [`FetchError::InvalidRef`] describing the first rule violated.
pub fn validate_git_ref(git_ref: &str) -> FetchResult<()> {
    if git_ref.is_empty() || git_ref.len() > 256 {
        return Err(invalid_ref(git_ref, "must be 1-256 characters"));
    }
    if git_ref.contains("..") {
        return Err(invalid_ref(git_ref, "contains '..'"));
    }
    if git_ref.starts_with('-') {
        return Err(invalid_ref(git_ref, "must not start with '-'"));
    }
    let is_valid = git_ref
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/' | b'+'));
    if !is_valid {
        return Err(invalid_ref(git_ref, "contains invalid characters"));
    }
    if git_ref.starts_with('.')
        || git_ref.ends_with('.')
        || git_ref.starts_with('/')
        || git_ref.ends_with('/')
        || git_ref.ends_with(".lock")
        || git_ref.contains("//")
    {
        return Err(invalid_ref(git_ref, "has invalid format"));
    }
    Ok(())
}

/// Validate an SSH host name before it is passed to `ssh`.
///
/// Only alphanumerics, hyphens and dots; no leading `-` (option injection)
/// or leading/trailing dot.
///
/// # Errors
///
/// Returns [`FetchError::Discovery`] when the host is unusable.
pub fn validate_ssh_host(host: &str) -> FetchResult<()> {
    let is_valid = !host.is_empty()
        && host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.'));
    if !is_valid || host.starts_with('-') || host.starts_with('.') || host.ends_with('.') {
        return Err(FetchError::Discovery {
            endpoint: host.to_owned(),
            message: "ssh host contains invalid characters".to_owned(),
        });
    }
    Ok(())
}
