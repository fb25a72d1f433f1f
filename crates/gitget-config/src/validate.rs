//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound for `fetch.max_download_bytes` (4 GiB).
const MAX_DOWNLOAD_UPPER_BOUND: u64 = 4 * 1024 * 1024 * 1024;

/// Accepted `logging.level` values.
const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Accepted `logging.format` values.
const FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_fetch(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_fetch(config: &Config) -> ConfigResult<()> {
    let f = &config.fetch;

    for (field, secs) in [
        ("fetch.clone_timeout_secs", f.clone_timeout_secs),
        ("fetch.discovery_timeout_secs", f.discovery_timeout_secs),
        ("fetch.http_timeout_secs", f.http_timeout_secs),
    ] {
        if secs == 0 {
            return Err(invalid(field, "timeout must be greater than zero"));
        }
    }

    if f.max_download_bytes == 0 || f.max_download_bytes > MAX_DOWNLOAD_UPPER_BOUND {
        return Err(invalid(
            "fetch.max_download_bytes",
            format!(
                "{} is out of range; must be between 1 and {MAX_DOWNLOAD_UPPER_BOUND}",
                f.max_download_bytes
            ),
        ));
    }

    if f.git_program.trim().is_empty() {
        return Err(invalid("fetch.git_program", "must not be empty"));
    }
    if f.ssh_program.trim().is_empty() {
        return Err(invalid("fetch.ssh_program", "must not be empty"));
    }
    if let Some(agent) = &f.user_agent
        && agent.trim().is_empty()
    {
        return Err(invalid("fetch.user_agent", "must not be empty when set"));
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !LEVELS.contains(&l.level.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                l.level,
                LEVELS.join(", ")
            ),
        ));
    }

    if !FORMATS.contains(&l.format.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                l.format,
                FORMATS.join(", ")
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        validate(&Config::default()).unwrap();
    }

    #[test]
    fn zero_timeout() {
        let mut config = Config::default();
        config.fetch.discovery_timeout_secs = 0;
        assert_eq!(field_of(validate(&config)), "fetch.discovery_timeout_secs");
    }

    #[test]
    fn download_limit_bounds() {
        let mut config = Config::default();
        config.fetch.max_download_bytes = 0;
        assert_eq!(field_of(validate(&config)), "fetch.max_download_bytes");

        config.fetch.max_download_bytes = MAX_DOWNLOAD_UPPER_BOUND;
        validate(&config).unwrap();

        config.fetch.max_download_bytes = MAX_DOWNLOAD_UPPER_BOUND + 1;
        assert_eq!(field_of(validate(&config)), "fetch.max_download_bytes");
    }

    #[test]
    fn empty_programs() {
        let mut config = Config::default();
        config.fetch.ssh_program = "  ".into();
        assert_eq!(field_of(validate(&config)), "fetch.ssh_program");

        let mut config = Config::default();
        config.fetch.user_agent = Some(String::new());
        assert_eq!(field_of(validate(&config)), "fetch.user_agent");
    }

    #[test]
    fn logging_names() {
        let mut config = Config::default();
        config.logging.level = "DEBUG".into();
        config.logging.format = "Json".into();
        validate(&config).unwrap();

        config.logging.level = "loud".into();
        assert_eq!(field_of(validate(&config)), "logging.level");

        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }
}
