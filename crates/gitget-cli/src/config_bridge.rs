//! Bridge from `gitget_config::Config` to the option types used by
//! `gitget-core` and `gitget-telemetry`.
//!
//! The config crate has no dependencies on other internal crates, so
//! conversion happens here, once, at startup.

use std::time::Duration;

use gitget_config::Config;
use gitget_core::{BranchPolicy, FetchOptions};
use gitget_telemetry::{LogConfig, LogFormat};

/// Convert config to [`FetchOptions`].
#[must_use]
pub fn to_fetch_options(cfg: &Config) -> FetchOptions {
    let f = &cfg.fetch;
    let policy = if f.require_branch {
        BranchPolicy::Required
    } else {
        BranchPolicy::BestEffort
    };

    let mut options = FetchOptions::default()
        .with_insecure_skip_tls(f.insecure_skip_tls)
        .with_branch_policy(policy)
        .with_clone_timeout(Duration::from_secs(f.clone_timeout_secs))
        .with_discovery_timeout(Duration::from_secs(f.discovery_timeout_secs))
        .with_http_timeout(Duration::from_secs(f.http_timeout_secs))
        .with_max_download_bytes(f.max_download_bytes);

    options.git_program = f.git_program.clone().into();
    options.ssh_program = f.ssh_program.clone().into();
    if let Some(agent) = &f.user_agent {
        options.user_agent.clone_from(agent);
    }

    options
}

/// Convert config to [`LogConfig`].
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let l = &cfg.logging;
    // Already validated by the loader.
    let format = l.format.parse().unwrap_or(LogFormat::Compact);

    let mut log_config = LogConfig::new(l.level.to_ascii_lowercase()).with_format(format);
    if !l.timestamps {
        log_config = log_config.without_timestamps();
    }
    if !l.ansi {
        log_config = log_config.without_ansi();
    }
    for directive in &l.directives {
        log_config = log_config.with_directive(directive);
    }

    log_config
}
