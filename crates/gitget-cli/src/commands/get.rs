//! `gitget get`.

use std::path::Path;

use anyhow::{Context, Result};
use gitget_core::{BranchPolicy, FetchOptions, Fetcher, RetrievalSource};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::theme::Theme;

/// Layer the per-invocation flags over the configured options. An absent
/// flag leaves the configured value alone.
pub(crate) fn apply_flags(
    options: FetchOptions,
    insecure_skip_tls: bool,
    require_branch: bool,
) -> FetchOptions {
    let mut options = options;
    if insecure_skip_tls {
        options = options.with_insecure_skip_tls(true);
    }
    if require_branch {
        options = options.with_branch_policy(BranchPolicy::Required);
    }
    options
}

pub(crate) async fn run_get(
    locator: &str,
    output: Option<&Path>,
    options: FetchOptions,
) -> Result<()> {
    let fetcher = Fetcher::new(options);
    let retrieved = fetcher
        .retrieve(locator)
        .await
        .with_context(|| format!("failed to fetch {locator}"))?;

    if let RetrievalSource::Repository { branch, .. } = &retrieved.source
        && branch.name().is_none()
    {
        eprintln!(
            "{}",
            Theme::warning(&format!("default branch not resolved, used {branch}"))
        );
    }

    if let Some(path) = output {
        tokio::fs::write(path, &retrieved.bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = retrieved.bytes.len(), "wrote file");
        eprintln!(
            "{}",
            Theme::success(&format!(
                "{} bytes written to {}",
                retrieved.bytes.len(),
                path.display()
            ))
        );
    } else {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(&retrieved.bytes)
            .await
            .context("failed to write to stdout")?;
        stdout.flush().await.context("failed to flush stdout")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let options = apply_flags(FetchOptions::default(), true, true);
        assert!(options.insecure_skip_tls);
        assert_eq!(options.branch_policy, BranchPolicy::Required);
    }

    #[test]
    fn absent_flags_keep_config() {
        let configured = FetchOptions::default()
            .with_insecure_skip_tls(true)
            .with_branch_policy(BranchPolicy::Required);
        let options = apply_flags(configured.clone(), false, false);
        assert_eq!(options, configured);
    }
}
