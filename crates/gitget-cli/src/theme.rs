//! CLI theme and styling. Everything here is written to stderr or to
//! human-readable reports, never mixed into fetched file content.

use colored::Colorize;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// A `label: value` row with the label padded to `width`.
    pub(crate) fn field(label: &str, value: &str, width: usize) -> String {
        let label = format!("{label}:");
        format!("  {} {value}", format!("{label:<width$}").bold())
    }
}
