//! Local filesystem reads.

use std::path::Path;

use crate::error::{FetchError, FetchResult};

/// Read a local file given as a path or `file://` locator.
///
/// The `file://` prefix is stripped and the rest is resolved against the
/// working directory.
///
/// # Errors
///
/// - [`FetchError::InvalidPath`] if the path cannot be made absolute.
/// - [`FetchError::InvalidUri`] if the file cannot be read.
pub async fn read_local_file(raw: &str) -> FetchResult<Vec<u8>> {
    let trimmed = raw.strip_prefix("file://").unwrap_or(raw);

    let path = std::path::absolute(Path::new(trimmed)).map_err(|source| {
        FetchError::InvalidPath {
            path: trimmed.to_owned(),
            source,
        }
    })?;

    tracing::debug!(path = %path.display(), "Reading local file");

    tokio::fs::read(&path)
        .await
        .map_err(|source| FetchError::InvalidUri { path, source })
}
