use std::sync::LazyLock;

use regex::Regex;
use url::Url;
use url::form_urlencoded;

use super::{Detection, Locator};
use crate::error::LocatorError;

/// `[scheme://]user@host[:port]:path`, where `path` may start with `/`.
///
/// The host runs up to the first `:` after the `@`, which keeps the
/// SCP-style port form `git@host:22:owner/repo.git` unambiguous.
static SSH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([a-zA-Z+.\-]+)://)?(?:([^@\s]+)@)([^:]+(?::\d+)?):(/?.+)$")
        .expect("invalid ssh pattern")
});

/// `ssh://user@host:2222/path` written with a standard port.
static EXPLICIT_PORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(/.*)$").expect("invalid port pattern"));

/// Recognize SCP-style and explicit `ssh://` endpoints.
///
/// Returns [`Detection::NotApplicable`] when the input does not have the
/// shape of an SSH endpoint or names a scheme without `ssh` in it, and
/// [`Detection::Malformed`] when it does but the pieces do not form a URL.
#[must_use]
pub fn detect_ssh(src: &str) -> Detection {
    let Some(caps) = SSH_PATTERN.captures(src) else {
        return Detection::NotApplicable;
    };

    let scheme = caps.get(1).map(|m| m.as_str());
    if let Some(scheme) = scheme
        && !scheme.contains("ssh")
    {
        return Detection::NotApplicable;
    }

    let user = caps.get(2).map_or("", |m| m.as_str());
    let mut host = caps.get(3).map_or("", |m| m.as_str()).to_owned();
    let mut path = caps.get(4).map_or("", |m| m.as_str()).to_owned();

    if scheme.is_some()
        && !host.contains(':')
        && let Some(port_caps) = EXPLICIT_PORT.captures(&path)
    {
        let port = port_caps.get(1).map_or("", |m| m.as_str());
        let rest = port_caps.get(2).map_or("", |m| m.as_str()).to_owned();
        host = format!("{host}:{port}");
        path = rest;
    }

    match build(user, &host, &path) {
        Ok(locator) => Detection::Matched(locator),
        Err(message) => Detection::Malformed(LocatorError::MalformedSsh {
            input: src.to_owned(),
            message,
        }),
    }
}

fn build(user: &str, host: &str, path: &str) -> Result<Locator, String> {
    let (path, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    };

    let mut url = Url::parse(&format!("ssh://{host}")).map_err(|e| e.to_string())?;
    url.set_username(user)
        .map_err(|()| format!("cannot set user '{user}'"))?;

    if path.starts_with('/') {
        url.set_path(path);
    } else {
        url.set_path(&format!("/{path}"));
    }

    url.set_query(query.and_then(canonical_query).as_deref());

    Ok(Locator::from_url(url))
}

/// Re-encode a query string with keys in sorted order.
fn canonical_query(raw: &str) -> Option<String> {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Some(
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish(),
    )
}
