//! Global subscriber installation. Kept in its own test binary because the
//! subscriber can only be installed once per process.

use gitget_telemetry::{LogConfig, LogFormat, TelemetryError, setup_logging};

#[test]
fn installs_once() {
    let config = LogConfig::new("debug")
        .with_format(LogFormat::Json)
        .without_ansi();
    setup_logging(&config).unwrap();
    tracing::debug!(target: "gitget_telemetry_test", "installed");

    assert!(matches!(
        setup_logging(&config),
        Err(TelemetryError::InitError(_))
    ));
}

#[test]
fn invalid_directive_is_rejected_before_install() {
    let config = LogConfig::new("info").with_directive("[bad");
    assert!(matches!(
        setup_logging(&config),
        Err(TelemetryError::ConfigError(_))
    ));
}
