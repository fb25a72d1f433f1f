//! Read-only upload-pack sessions over smart HTTP, ssh and `git://`.
//!
//! Each session reads the reference advertisement and stops; nothing is
//! negotiated or transferred.

use std::process::Stdio;
use std::time::Duration;

use futures::StreamExt;
use percent_encoding::percent_decode_str;
use reqwest::header::CONTENT_TYPE;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::advertisement::{AdvertisedRefs, AdvertisementError, read_advertisement};
use super::pktline::{FLUSH_PKT, PktLineReader, pkt_line};
use crate::error::{FetchError, FetchResult};
use crate::locator::Locator;
use crate::process::{hardened_command, shell_quote, stderr_summary};
use crate::validate::validate_ssh_host;

/// Content type of a smart-HTTP advertisement.
const ADVERTISEMENT_CONTENT_TYPE: &str = "application/x-git-upload-pack-advertisement";

/// Largest smart-HTTP advertisement read before giving up.
pub const MAX_ADVERTISEMENT_SIZE: u64 = 16 * 1024 * 1024;

/// Default port of the `git://` daemon.
pub(crate) const GIT_DAEMON_PORT: u16 = 9418;

/// Settings a session needs, taken from [`FetchOptions`](crate::FetchOptions).
#[derive(Debug, Clone)]
pub(crate) struct SessionSettings {
    pub(crate) timeout: Duration,
    pub(crate) insecure_skip_tls: bool,
    pub(crate) ssh_program: std::path::PathBuf,
    pub(crate) user_agent: String,
}

fn discovery_error(repository: &Locator, message: impl Into<String>) -> FetchError {
    FetchError::Discovery {
        endpoint: repository.redacted(),
        message: message.into(),
    }
}

fn advertisement_error(repository: &Locator, err: &AdvertisementError) -> FetchError {
    discovery_error(repository, err.to_string())
}

/// Repository path as the server sees it.
fn decoded_path(repository: &Locator) -> String {
    percent_decode_str(repository.path())
        .decode_utf8_lossy()
        .into_owned()
}

/// `GET <repo>/info/refs?service=git-upload-pack`.
pub(crate) async fn discover_http(
    repository: &Locator,
    settings: &SessionSettings,
) -> FetchResult<AdvertisedRefs> {
    let mut endpoint = repository.as_url().clone();
    let info_refs = format!("{}/info/refs", repository.path().trim_end_matches('/'));
    endpoint.set_path(&info_refs);
    endpoint.set_query(Some("service=git-upload-pack"));
    // Credentials go in the Authorization header, not the request line.
    let _ = endpoint.set_username("");
    let _ = endpoint.set_password(None);

    tracing::debug!(%endpoint, "Requesting smart-HTTP advertisement");

    let client = reqwest::Client::builder()
        .user_agent(&settings.user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(settings.timeout)
        .danger_accept_invalid_certs(settings.insecure_skip_tls)
        .build()
        .map_err(|e| discovery_error(repository, format!("failed to create HTTP client: {e}")))?;

    let mut request = client.get(endpoint);
    if !repository.username().is_empty() {
        let user = percent_decode_str(repository.username()).decode_utf8_lossy();
        let password = repository
            .password()
            .map(|p| percent_decode_str(p).decode_utf8_lossy().into_owned());
        request = request.basic_auth(user, password);
    }

    let response = request
        .send()
        .await
        .map_err(|e| discovery_error(repository, format!("request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(discovery_error(
            repository,
            format!("server returned {}", response.status()),
        ));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with(ADVERTISEMENT_CONTENT_TYPE) {
        return Err(discovery_error(
            repository,
            format!("not a smart git endpoint (content type '{content_type}')"),
        ));
    }

    let body = read_capped(response, repository, MAX_ADVERTISEMENT_SIZE).await?;

    let mut reader = PktLineReader::new(body.as_slice());
    read_advertisement(&mut reader)
        .await
        .map_err(|e| advertisement_error(repository, &e))
}

/// Stream a response body, failing once it passes `max_size` bytes.
async fn read_capped(
    response: reqwest::Response,
    repository: &Locator,
    max_size: u64,
) -> FetchResult<Vec<u8>> {
    if response.content_length().is_some_and(|len| len > max_size) {
        return Err(too_large(repository, max_size));
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| discovery_error(repository, format!("failed to read response: {e}")))?;
        body.extend_from_slice(&chunk);
        if u64::try_from(body.len()).unwrap_or(u64::MAX) > max_size {
            return Err(too_large(repository, max_size));
        }
    }
    Ok(body)
}

fn too_large(repository: &Locator, max_size: u64) -> FetchError {
    discovery_error(repository, format!("advertisement exceeds {max_size} bytes"))
}

/// `ssh [-p port] [user@]host git-upload-pack '<path>'`.
pub(crate) async fn discover_ssh(
    repository: &Locator,
    settings: &SessionSettings,
) -> FetchResult<AdvertisedRefs> {
    let host = repository
        .host()
        .ok_or_else(|| discovery_error(repository, "missing host"))?;
    validate_ssh_host(host)?;

    let user = percent_decode_str(repository.username()).decode_utf8_lossy();
    if user.starts_with('-') {
        return Err(discovery_error(repository, "ssh user must not start with '-'"));
    }
    let destination = if user.is_empty() {
        host.to_owned()
    } else {
        format!("{user}@{host}")
    };

    let mut cmd = hardened_command(&settings.ssh_program);
    cmd.args(["-o", "BatchMode=yes"]);
    if let Some(port) = repository.port() {
        cmd.arg("-p").arg(port.to_string());
    }
    cmd.arg(destination);
    cmd.arg(format!(
        "git-upload-pack {}",
        shell_quote(&decoded_path(repository))
    ));
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!(host, "Starting ssh upload-pack session");

    let mut child = cmd
        .spawn()
        .map_err(|e| discovery_error(repository, format!("failed to run ssh: {e}")))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| discovery_error(repository, "ssh stdout unavailable"))?;

    // stderr must be drained while stdout is read.
    let stderr_task = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        })
    });

    let mut reader = PktLineReader::new(stdout);
    let advertisement = read_advertisement(&mut reader).await;

    // A flush tells upload-pack that no objects are wanted.
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(FLUSH_PKT).await;
        let _ = stdin.shutdown().await;
    }
    drop(reader);

    let status = child
        .wait()
        .await
        .map_err(|e| discovery_error(repository, format!("ssh session failed: {e}")))?;
    let stderr = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => Vec::new(),
    };

    match advertisement {
        Ok(adv) if status.success() || !adv.refs.is_empty() => Ok(adv),
        Ok(_) => Err(discovery_error(
            repository,
            stderr_summary(&stderr, &format!("ssh exited with {status}")),
        )),
        Err(e) if !status.success() => Err(discovery_error(
            repository,
            stderr_summary(&stderr, &e.to_string()),
        )),
        Err(e) => Err(advertisement_error(repository, &e)),
    }
}

/// Plain TCP to the git daemon.
pub(crate) async fn discover_git(repository: &Locator) -> FetchResult<AdvertisedRefs> {
    let host = repository
        .host()
        .ok_or_else(|| discovery_error(repository, "missing host"))?;
    let port = repository.port().unwrap_or(GIT_DAEMON_PORT);

    let host_param = if port == GIT_DAEMON_PORT {
        host.to_owned()
    } else {
        format!("{host}:{port}")
    };
    let request = format!(
        "git-upload-pack {}\0host={host_param}\0",
        decoded_path(repository)
    );

    tracing::debug!(host, port, "Connecting to git daemon");

    let mut stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| discovery_error(repository, format!("connect failed: {e}")))?;
    let (read_half, mut write_half) = stream.split();

    write_half
        .write_all(&pkt_line(request.as_bytes()))
        .await
        .map_err(|e| discovery_error(repository, format!("write failed: {e}")))?;

    let mut reader = PktLineReader::new(read_half);
    let advertisement = read_advertisement(&mut reader)
        .await
        .map_err(|e| advertisement_error(repository, &e))?;

    let _ = write_half.write_all(FLUSH_PKT).await;
    Ok(advertisement)
}
