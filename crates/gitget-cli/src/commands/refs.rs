//! `gitget refs`.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use gitget_core::{
    AdvertisedRefs, FetchOptions, Ref, RefDiscovery, UploadPackDiscovery, parse_locator,
};
use serde::Serialize;

use crate::theme::Theme;

#[derive(Serialize)]
struct RefsReport<'a> {
    repository: String,
    default_branch: Option<&'a str>,
    #[serde(flatten)]
    advertised: &'a AdvertisedRefs,
}

pub(crate) async fn run_refs(url: &str, json: bool, options: &FetchOptions) -> Result<()> {
    let repository = parse_locator(url).with_context(|| format!("invalid repository URL {url}"))?;
    let advertised = UploadPackDiscovery::new(options)
        .advertised_refs(&repository)
        .await
        .context("reference discovery failed")?;

    if json {
        let report = RefsReport {
            repository: repository.redacted(),
            default_branch: advertised.default_branch(),
            advertised: &advertised,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize refs")?
        );
    } else {
        print!("{}", render(&repository.redacted(), &advertised));
    }
    Ok(())
}

fn render(repository: &str, advertised: &AdvertisedRefs) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", Theme::header(repository));
    match advertised.default_branch() {
        Some(branch) => {
            let _ = writeln!(out, "{}", Theme::field("default", branch, 8));
        },
        None => {
            let _ = writeln!(out, "{}", Theme::warning("no default branch advertised"));
        },
    }
    for (name, target) in &advertised.refs {
        let target = match target {
            Ref::Direct(oid) => oid.to_string(),
            Ref::Symbolic(to) => format!("-> {to}"),
        };
        let _ = writeln!(out, "  {target}  {name}");
    }
    out
}
