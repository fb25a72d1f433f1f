//! `gitget config` subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use gitget_config::{ResolvedConfig, ShowFormat};

use crate::theme::Theme;

pub(crate) fn show_config(
    resolved: &ResolvedConfig,
    json: bool,
    section: Option<&str>,
) -> Result<()> {
    let format = if json {
        ShowFormat::Json
    } else {
        ShowFormat::Toml
    };
    let output = resolved.show(format, section).map_err(|_| {
        anyhow::anyhow!(
            "cannot render section '{}' (expected fetch or logging)",
            section.unwrap_or("")
        )
    })?;
    println!("{output}");
    Ok(())
}

pub(crate) fn show_paths(explicit: Option<&Path>) {
    println!("{}", Theme::header("Config files (lowest to highest precedence)"));
    println!("  1. {}", Theme::dimmed("<embedded defaults>"));

    match gitget_config::loader::user_config_path() {
        Some(path) => println!("  2. {}{}", path.display(), exists_marker(&path)),
        None => println!("  2. {}", Theme::dimmed("<no home directory>")),
    }

    match explicit {
        Some(path) => println!("  3. {}{}", path.display(), exists_marker(path)),
        None => println!("  3. {}", Theme::dimmed("--config <FILE> (not given)")),
    }

    println!(
        "  4. {}",
        Theme::dimmed(&gitget_config::env::supported_vars().join(", "))
    );
}

fn exists_marker(path: &Path) -> String {
    if path.exists() {
        String::new()
    } else {
        Theme::dimmed(" (not found)")
    }
}

/// With a file, check that file on its own. Without one, the layered
/// configuration already passed validation during startup.
pub(crate) fn validate_config(file: Option<&Path>) -> Result<()> {
    if let Some(path) = file {
        gitget_config::Config::load_file(path)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        println!("{}", Theme::success(&format!("{} is valid", path.display())));
    } else {
        println!("{}", Theme::success("configuration is valid"));
    }
    Ok(())
}
