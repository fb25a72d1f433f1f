//! `GITGET_*` environment variable overrides.
//!
//! Environment variables form the highest-precedence layer: a variable that
//! is set replaces whatever the config files said.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// Value type of the field a variable maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvKind {
    Bool,
    Integer,
    Text,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: EnvKind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "GITGET_INSECURE_SKIP_TLS",
        field_path: "fetch.insecure_skip_tls",
        kind: EnvKind::Bool,
    },
    EnvMapping {
        var_name: "GITGET_REQUIRE_BRANCH",
        field_path: "fetch.require_branch",
        kind: EnvKind::Bool,
    },
    EnvMapping {
        var_name: "GITGET_CLONE_TIMEOUT_SECS",
        field_path: "fetch.clone_timeout_secs",
        kind: EnvKind::Integer,
    },
    EnvMapping {
        var_name: "GITGET_DISCOVERY_TIMEOUT_SECS",
        field_path: "fetch.discovery_timeout_secs",
        kind: EnvKind::Integer,
    },
    EnvMapping {
        var_name: "GITGET_HTTP_TIMEOUT_SECS",
        field_path: "fetch.http_timeout_secs",
        kind: EnvKind::Integer,
    },
    EnvMapping {
        var_name: "GITGET_MAX_DOWNLOAD_BYTES",
        field_path: "fetch.max_download_bytes",
        kind: EnvKind::Integer,
    },
    EnvMapping {
        var_name: "GITGET_GIT_PROGRAM",
        field_path: "fetch.git_program",
        kind: EnvKind::Text,
    },
    EnvMapping {
        var_name: "GITGET_SSH_PROGRAM",
        field_path: "fetch.ssh_program",
        kind: EnvKind::Text,
    },
    EnvMapping {
        var_name: "GITGET_USER_AGENT",
        field_path: "fetch.user_agent",
        kind: EnvKind::Text,
    },
    EnvMapping {
        var_name: "GITGET_LOG_LEVEL",
        field_path: "logging.level",
        kind: EnvKind::Text,
    },
    EnvMapping {
        var_name: "GITGET_LOG_FORMAT",
        field_path: "logging.format",
        kind: EnvKind::Text,
    },
];

/// Names of every variable consulted, for `--help` output and docs.
#[must_use]
pub fn supported_vars() -> Vec<&'static str> {
    ENV_MAPPINGS.iter().map(|m| m.var_name).collect()
}

/// Apply every mapped variable present in `env_vars` on top of `merged`.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] when a boolean or integer variable does
/// not parse.
pub fn apply_env_overrides<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var override"
        );

        let value = coerce(mapping, raw)?;
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    let trimmed = raw.trim();
    let invalid = |expected: &str| ConfigError::EnvError {
        var_name: mapping.var_name.to_owned(),
        message: format!("expected {expected}, got '{raw}'"),
    };

    match mapping.kind {
        EnvKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Ok(toml::Value::Boolean(false)),
            _ => Err(invalid("a boolean")),
        },
        EnvKind::Integer => trimmed
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|_| invalid("an integer")),
        EnvKind::Text => Ok(toml::Value::String(raw.to_owned())),
    }
}

/// Set a dotted `path` in the tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
