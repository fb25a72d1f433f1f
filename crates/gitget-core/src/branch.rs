//! Which branch a repository retrieval uses.

use std::fmt;

use serde::Serialize;

use crate::discovery::{RefDiscovery, resolve_default_branch};
use crate::error::{FetchError, FetchResult};
use crate::locator::Locator;
use crate::options::BranchPolicy;
use crate::validate::validate_git_ref;

/// Outcome of branch selection for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BranchSelection {
    /// Named in the locator after `@`.
    Explicit {
        /// Branch or ref name.
        name: String,
    },
    /// The remote's `HEAD`, found by discovery.
    Discovered {
        /// Branch name.
        name: String,
    },
    /// Discovery failed; the clone falls back to the remote's default.
    Unresolved {
        /// Why discovery failed.
        reason: String,
    },
}

impl BranchSelection {
    /// Branch to pass to the cloner, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Explicit { name } | Self::Discovered { name } => Some(name),
            Self::Unresolved { .. } => None,
        }
    }
}

impl fmt::Display for BranchSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit { name } => write!(f, "{name} (explicit)"),
            Self::Discovered { name } => write!(f, "{name} (remote HEAD)"),
            Self::Unresolved { reason } => write!(f, "remote default (unresolved: {reason})"),
        }
    }
}

/// Pick the branch for `repository`.
///
/// An explicit branch is validated and used as-is; otherwise the remote
/// `HEAD` is discovered. When discovery fails, `policy` decides between
/// [`BranchSelection::Unresolved`] and an error.
///
/// # Errors
///
/// - [`FetchError::InvalidRef`] for an explicit or discovered name git
///   would misread.
/// - [`FetchError::BranchResolution`] when discovery fails under
///   [`BranchPolicy::Required`].
pub async fn select_branch(
    discovery: &dyn RefDiscovery,
    repository: &Locator,
    explicit: Option<&str>,
    policy: BranchPolicy,
) -> FetchResult<BranchSelection> {
    if let Some(name) = explicit {
        validate_git_ref(name)?;
        return Ok(BranchSelection::Explicit {
            name: name.to_owned(),
        });
    }

    match resolve_default_branch(discovery, repository).await {
        Ok(name) => {
            validate_git_ref(&name)?;
            Ok(BranchSelection::Discovered { name })
        },
        Err(err) => match policy {
            BranchPolicy::Required => Err(FetchError::BranchResolution {
                repository: repository.redacted(),
                reason: err.to_string(),
            }),
            BranchPolicy::BestEffort => {
                tracing::warn!(
                    repository = %repository.redacted(),
                    error = %err,
                    "Could not resolve default branch, cloning remote default"
                );
                Ok(BranchSelection::Unresolved {
                    reason: err.to_string(),
                })
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::discovery::AdvertisedRefs;
    use crate::locator::parse_locator;

    struct Unreachable;

    #[async_trait]
    impl RefDiscovery for Unreachable {
        async fn advertised_refs(&self, repository: &Locator) -> FetchResult<AdvertisedRefs> {
            Err(FetchError::Discovery {
                endpoint: repository.to_string(),
                message: "connection refused".into(),
            })
        }
    }

    fn repo() -> Locator {
        parse_locator("https://example.com/r.git").unwrap()
    }

    #[tokio::test]
    async fn explicit_branch_skips_discovery() {
        let sel = select_branch(&Unreachable, &repo(), Some("dev"), BranchPolicy::Required)
            .await
            .unwrap();
        assert_eq!(sel, BranchSelection::Explicit { name: "dev".into() });
        assert_eq!(sel.name(), Some("dev"));
    }

    #[tokio::test]
    async fn explicit_branch_is_validated() {
        let err = select_branch(
            &Unreachable,
            &repo(),
            Some("--upload-pack=x"),
            BranchPolicy::BestEffort,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FetchError::InvalidRef { .. }));
    }

    #[tokio::test]
    async fn best_effort_yields_unresolved() {
        let sel = select_branch(&Unreachable, &repo(), None, BranchPolicy::BestEffort)
            .await
            .unwrap();
        assert!(matches!(&sel, BranchSelection::Unresolved { reason } if reason.contains("connection refused")));
        assert_eq!(sel.name(), None);
    }

    #[tokio::test]
    async fn required_policy_fails() {
        let err = select_branch(&Unreachable, &repo(), None, BranchPolicy::Required)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::BranchResolution { .. }));
    }
}
