//! `gitget inspect`: show the strategy a locator would take.

use anyhow::{Context, Result};
use gitget_core::{BranchSelection, Classification, FetchOptions, Fetcher, classify};
use serde::Serialize;

use crate::theme::Theme;

/// What `inspect` reports for one locator.
#[derive(Debug, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
enum Inspection {
    Repository {
        repository: String,
        file_path: String,
        branch: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        selection: Option<BranchSelection>,
    },
    Http {
        url: String,
    },
    Local {
        reason: String,
    },
    Malformed {
        error: String,
    },
}

fn inspect(raw: &str) -> Inspection {
    match classify(raw) {
        Classification::Repository(request) => Inspection::Repository {
            repository: request.repository.redacted(),
            file_path: request.file_path,
            branch: request.branch,
            selection: None,
        },
        Classification::Remote(locator) if locator.is_http() => Inspection::Http {
            url: locator.redacted(),
        },
        Classification::Remote(locator) => Inspection::Malformed {
            error: format!("{} has no .git segment", locator.redacted()),
        },
        Classification::Local(reason) => Inspection::Local {
            reason: reason.to_string(),
        },
        Classification::Malformed(err) => Inspection::Malformed {
            error: err.to_string(),
        },
    }
}

pub(crate) async fn run_inspect(
    locator: &str,
    resolve: bool,
    json: bool,
    options: FetchOptions,
) -> Result<()> {
    let mut report = inspect(locator);

    if resolve
        && let Inspection::Repository { selection, .. } = &mut report
    {
        let resolved = Fetcher::new(options)
            .resolve(locator)
            .await
            .context("branch resolution failed")?;
        *selection = Some(resolved.selection);
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

fn render(report: &Inspection) -> String {
    const W: usize = 11;
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    match report {
        Inspection::Repository {
            repository,
            file_path,
            branch,
            selection,
        } => {
            line(Theme::header("git repository"));
            line(Theme::field("repository", repository, W));
            line(Theme::field("file", file_path, W));
            let branch = match (branch, selection) {
                (_, Some(selection)) => selection.to_string(),
                (Some(name), None) => name.clone(),
                (None, None) => Theme::dimmed("(default, resolve with --resolve)"),
            };
            line(Theme::field("branch", &branch, W));
        },
        Inspection::Http { url } => {
            line(Theme::header("direct download"));
            line(Theme::field("url", url, W));
        },
        Inspection::Local { reason } => {
            line(Theme::header("local file"));
            line(Theme::field("why", reason, W));
        },
        Inspection::Malformed { error } => {
            line(Theme::warning("cannot be fetched"));
            line(Theme::field("error", error, W));
        },
    }
    out
}
