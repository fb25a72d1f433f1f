//! Layer precedence: defaults < user < --config < env.

use std::collections::HashMap;
use std::path::Path;

use gitget_config::loader::load_layers;
use gitget_config::{ConfigError, ConfigLayer, ShowFormat};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn each_layer_overrides_the_previous() {
    let dir = tempdir().unwrap();
    let user = write(
        dir.path(),
        "user.toml",
        "[fetch]\nclone_timeout_secs = 100\nhttp_timeout_secs = 10\ngit_program = \"/opt/git\"\n",
    );
    let explicit = write(
        dir.path(),
        "explicit.toml",
        "[fetch]\nclone_timeout_secs = 200\n\n[logging]\nlevel = \"info\"\n",
    );
    let vars = env(&[("GITGET_HTTP_TIMEOUT_SECS", "5")]);

    let resolved = load_layers(Some(&user), Some(&explicit), &vars).unwrap();
    let fetch = &resolved.config.fetch;

    assert_eq!(fetch.clone_timeout_secs, 200);
    assert_eq!(fetch.http_timeout_secs, 5);
    assert_eq!(fetch.git_program, "/opt/git");
    assert_eq!(fetch.discovery_timeout_secs, 30);
    assert_eq!(resolved.config.logging.level, "info");

    let sources = &resolved.field_sources;
    assert_eq!(
        sources.get("fetch.clone_timeout_secs"),
        Some(&ConfigLayer::Explicit)
    );
    assert_eq!(
        sources.get("fetch.http_timeout_secs"),
        Some(&ConfigLayer::Environment)
    );
    assert_eq!(sources.get("fetch.git_program"), Some(&ConfigLayer::User));
    assert_eq!(
        sources.get("fetch.discovery_timeout_secs"),
        Some(&ConfigLayer::Defaults)
    );
    assert_eq!(resolved.loaded_files.len(), 2);
}

#[test]
fn missing_user_file_is_skipped() {
    let dir = tempdir().unwrap();
    let resolved = load_layers(Some(&dir.path().join("absent.toml")), None, &env(&[])).unwrap();
    assert!(resolved.loaded_files.is_empty());
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_layers(None, Some(&dir.path().join("absent.toml")), &env(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::ReadError { .. }));
}

#[test]
fn malformed_file_reports_path() {
    let dir = tempdir().unwrap();
    let bad = write(dir.path(), "bad.toml", "[fetch\n");
    let err = load_layers(None, Some(&bad), &env(&[])).unwrap_err();
    match err {
        ConfigError::ParseError { path, .. } => assert!(path.ends_with("bad.toml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn wrong_type_in_file_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let bad = write(dir.path(), "bad.toml", "[fetch]\nrequire_branch = \"sometimes\"\n");
    assert!(matches!(
        load_layers(None, Some(&bad), &env(&[])),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn invalid_merged_value_fails_validation() {
    let vars = env(&[("GITGET_LOG_FORMAT", "xml")]);
    let err = load_layers(None, None, &vars).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ValidationError { ref field, .. } if field == "logging.format"
    ));
}

#[test]
fn show_reports_sources() {
    let dir = tempdir().unwrap();
    let explicit = write(dir.path(), "gitget.toml", "[fetch]\nrequire_branch = true\n");
    let resolved = load_layers(None, Some(&explicit), &env(&[])).unwrap();

    let output = resolved.show(ShowFormat::Toml, None).unwrap();
    assert!(output.contains("require_branch = true  # [--config]"));
    assert!(output.contains("insecure_skip_tls = false  # [defaults]"));
}
