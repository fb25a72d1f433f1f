//! Read access to a checked-out repository tree.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::error::{FetchError, FetchResult};

/// A checked-out tree that files can be read from.
#[async_trait]
pub trait WorkTree: Send + Sync {
    /// Read the file at `path`, relative to the tree root.
    ///
    /// # Errors
    ///
    /// - [`FetchError::PathEscape`] if `path` leaves the tree or points
    ///   into `.git/`.
    /// - [`FetchError::Io`] if the file cannot be read (`NotFound` when it
    ///   does not exist).
    async fn read_file(&self, path: &str) -> FetchResult<Vec<u8>>;
}

/// Reject absolute paths, `..`, and anything under `.git`.
fn relative_tree_path(path: &str) -> FetchResult<PathBuf> {
    let escape = || FetchError::PathEscape {
        path: path.to_owned(),
    };

    let mut clean = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(escape());
            },
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(escape());
    }
    if clean.components().next() == Some(Component::Normal(".git".as_ref())) {
        return Err(escape());
    }
    Ok(clean)
}

/// Files held in memory, keyed by `/`-separated path.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::PathEscape`] for paths outside the tree.
    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) -> FetchResult<()> {
        let key = relative_tree_path(path)?;
        self.files.insert(key, contents.into());
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::PathEscape`] for paths outside the tree.
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> FetchResult<Self> {
        self.insert(path, contents)?;
        Ok(self)
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the tree has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl WorkTree for MemoryTree {
    async fn read_file(&self, path: &str) -> FetchResult<Vec<u8>> {
        let key = relative_tree_path(path)?;
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::Io(io::Error::from(io::ErrorKind::NotFound)))
    }
}

/// A checkout on disk, removed when dropped.
#[derive(Debug)]
pub struct CheckoutDir {
    // Owns the directory; `root` lives inside it.
    _tmp: TempDir,
    root: PathBuf,
}

impl CheckoutDir {
    /// Wrap a temp dir holding a checkout at `root`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `root` cannot be canonicalized.
    pub fn new(tmp: TempDir, root: &Path) -> FetchResult<Self> {
        let root = root.canonicalize()?;
        Ok(Self { _tmp: tmp, root })
    }

    /// Checkout root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl WorkTree for CheckoutDir {
    async fn read_file(&self, path: &str) -> FetchResult<Vec<u8>> {
        let relative = relative_tree_path(path)?;
        let full = self.root.join(&relative);

        // Symlinks in the tree may still point elsewhere.
        let resolved = tokio::fs::canonicalize(&full).await?;
        if !resolved.starts_with(&self.root) {
            return Err(FetchError::PathEscape {
                path: path.to_owned(),
            });
        }
        if resolved.starts_with(self.root.join(".git")) {
            return Err(FetchError::PathEscape {
                path: path.to_owned(),
            });
        }

        Ok(tokio::fs::read(&resolved).await?)
    }
}
