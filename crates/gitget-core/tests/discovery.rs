//! Default-branch discovery over smart HTTP and the git daemon protocol,
//! served in-process.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::Query,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use gitget_core::discovery::MAX_ADVERTISEMENT_SIZE;
use gitget_core::discovery::pktline::{FLUSH_PKT, PktLineReader, pkt_line};
use gitget_core::{
    BranchPolicy, BranchSelection, CloneRequest, FetchError, FetchOptions, FetchResult, Fetcher,
    MemoryTree, RefDiscovery, RepositoryCloner, UploadPackDiscovery, WorkTree, parse_locator,
    resolve_default_branch,
};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

const OID: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
const ADVERTISEMENT: &str = "application/x-git-upload-pack-advertisement";

fn advertisement(head: &str, preamble: bool) -> Vec<u8> {
    let mut out = Vec::new();
    if preamble {
        out.extend(pkt_line(b"# service=git-upload-pack\n"));
        out.extend_from_slice(FLUSH_PKT);
    }
    out.extend(pkt_line(
        format!("{OID} HEAD\0multi_ack side-band-64k symref=HEAD:refs/heads/{head}\n").as_bytes(),
    ));
    out.extend(pkt_line(format!("{OID} refs/heads/{head}\n").as_bytes()));
    out.extend_from_slice(FLUSH_PKT);
    out
}

/// A valid advertisement padded past [`MAX_ADVERTISEMENT_SIZE`].
fn oversized_advertisement() -> Vec<u8> {
    let limit = usize::try_from(MAX_ADVERTISEMENT_SIZE).unwrap();
    let mut body = advertisement("main", true);
    body.resize(limit + 1, b'0');
    body
}

#[derive(Deserialize)]
struct ServiceQuery {
    service: Option<String>,
}

async fn info_refs(Query(q): Query<ServiceQuery>, headers: HeaderMap) -> impl IntoResponse {
    if q.service.as_deref() != Some("git-upload-pack") {
        return (StatusCode::BAD_REQUEST, "missing service").into_response();
    }
    // Private repository: only `reader:secret` may list refs.
    if headers.get(header::AUTHORIZATION).is_some_and(|v| {
        v.to_str()
            .is_ok_and(|v| v != "Basic cmVhZGVyOnNlY3JldA==")
    }) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, ADVERTISEMENT)],
        advertisement("develop", true),
    )
        .into_response()
}

async fn start_test_server() -> SocketAddr {
    let router = Router::new()
        .route("/owner/repo.git/info/refs", get(info_refs))
        .route(
            "/dumb/repo.git/info/refs",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain")], format!("{OID}\trefs/heads/main\n")) }),
        )
        .route(
            "/huge/repo.git/info/refs",
            get(|| async { ([(header::CONTENT_TYPE, ADVERTISEMENT)], oversized_advertisement()) }),
        )
        .route(
            "/streamed/repo.git/info/refs",
            get(|| async {
                let chunks = oversized_advertisement()
                    .chunks(64 * 1024)
                    .map(|c| Ok::<_, std::io::Error>(c.to_vec()))
                    .collect::<Vec<_>>();
                (
                    [(header::CONTENT_TYPE, ADVERTISEMENT)],
                    Body::from_stream(futures::stream::iter(chunks)),
                )
            }),
        )
        .route(
            "/denied/repo.git/info/refs",
            get(|| async {
                let mut body = pkt_line(b"# service=git-upload-pack\n");
                body.extend_from_slice(FLUSH_PKT);
                body.extend(pkt_line(b"ERR access denied\n"));
                ([(header::CONTENT_TYPE, ADVERTISEMENT)], body)
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn smart_http_head_is_resolved() {
    let addr = start_test_server().await;
    let repo = parse_locator(&format!("http://{addr}/owner/repo.git")).unwrap();

    let branch = resolve_default_branch(&UploadPackDiscovery::default(), &repo)
        .await
        .unwrap();
    assert_eq!(branch, "develop");
}

#[tokio::test]
async fn smart_http_sends_url_credentials() {
    let addr = start_test_server().await;
    let discovery = UploadPackDiscovery::default();

    let good = parse_locator(&format!("http://reader:secret@{addr}/owner/repo.git")).unwrap();
    let refs = discovery.advertised_refs(&good).await.unwrap();
    assert_eq!(refs.default_branch(), Some("develop"));

    let bad = parse_locator(&format!("http://reader:wrong@{addr}/owner/repo.git")).unwrap();
    let err = discovery.advertised_refs(&bad).await.unwrap_err();
    match err {
        FetchError::Discovery { endpoint, message } => {
            assert!(message.contains("401"), "{message}");
            assert!(!endpoint.contains("wrong"), "password leaked: {endpoint}");
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn dumb_endpoint_is_not_smart() {
    let addr = start_test_server().await;
    let repo = parse_locator(&format!("http://{addr}/dumb/repo.git")).unwrap();
    let err = UploadPackDiscovery::default()
        .advertised_refs(&repo)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, FetchError::Discovery { message, .. } if message.contains("not a smart git endpoint")),
        "{err}"
    );
}

#[tokio::test]
async fn missing_repository_is_a_discovery_error() {
    let addr = start_test_server().await;
    let repo = parse_locator(&format!("http://{addr}/nobody/none.git")).unwrap();
    assert!(matches!(
        UploadPackDiscovery::default().advertised_refs(&repo).await,
        Err(FetchError::Discovery { .. })
    ));
}

#[tokio::test]
async fn oversized_advertisement_is_rejected() {
    let addr = start_test_server().await;
    for path in ["huge", "streamed"] {
        let repo = parse_locator(&format!("http://{addr}/{path}/repo.git")).unwrap();
        let err = UploadPackDiscovery::default()
            .advertised_refs(&repo)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, FetchError::Discovery { message, .. } if message.contains("exceeds")),
            "{path}: {err}"
        );
    }
}

#[tokio::test]
async fn remote_err_packet_is_reported() {
    let addr = start_test_server().await;
    let repo = parse_locator(&format!("http://{addr}/denied/repo.git")).unwrap();
    let err = UploadPackDiscovery::default()
        .advertised_refs(&repo)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("access denied"), "{err}");
}

/// One-shot git daemon: checks the request line, answers with an
/// advertisement whose HEAD is `stable`.
async fn start_git_daemon() -> (SocketAddr, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.split();
        let mut reader = PktLineReader::new(read_half);
        let request = match reader.read().await.unwrap() {
            Some(gitget_core::discovery::pktline::PktLine::Data(data)) => {
                String::from_utf8(data).unwrap()
            },
            other => panic!("unexpected packet: {other:?}"),
        };
        write_half
            .write_all(&advertisement("stable", false))
            .await
            .unwrap();
        request
    });
    (addr, handle)
}

#[tokio::test]
async fn git_daemon_head_is_resolved() {
    let (addr, daemon) = start_git_daemon().await;
    let repo = parse_locator(&format!("git://127.0.0.1:{}/owner/repo.git", addr.port())).unwrap();

    let branch = resolve_default_branch(&UploadPackDiscovery::default(), &repo)
        .await
        .unwrap();
    assert_eq!(branch, "stable");

    let request = daemon.await.unwrap();
    assert_eq!(
        request,
        format!("git-upload-pack /owner/repo.git\0host=127.0.0.1:{}\0", addr.port())
    );
}

#[derive(Clone, Default)]
struct RecordingCloner {
    requests: Arc<Mutex<Vec<CloneRequest>>>,
}

#[async_trait]
impl RepositoryCloner for RecordingCloner {
    async fn clone_shallow(&self, request: &CloneRequest) -> FetchResult<Box<dyn WorkTree>> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(Box::new(
            MemoryTree::new().with_file("api/openapi.yaml", "openapi: 3.1.0")?,
        ))
    }
}

#[tokio::test]
async fn discovered_branch_reaches_the_cloner() {
    let addr = start_test_server().await;
    let cloner = RecordingCloner::default();
    let fetcher = Fetcher::new(FetchOptions::default().with_branch_policy(BranchPolicy::Required))
        .with_cloner(cloner.clone());

    let locator = format!("http://{addr}/owner/repo.git/api/openapi.yaml");
    let bytes = fetcher.fetch(&locator).await.unwrap();
    assert_eq!(bytes, b"openapi: 3.1.0");

    let requests = cloner.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, format!("http://{addr}/owner/repo.git"));
    assert_eq!(requests[0].branch.as_deref(), Some("develop"));
    assert_eq!(requests[0].depth, 1);

    drop(requests);
    let resolved = fetcher.resolve(&locator).await.unwrap();
    assert_eq!(
        resolved.selection,
        BranchSelection::Discovered {
            name: "develop".into()
        }
    );
    assert_eq!(resolved.request.file_path, "api/openapi.yaml");
}

/// Stand-in for `ssh` that floods stderr before answering on stdout.
#[cfg(unix)]
fn noisy_ssh(dir: &std::path::Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(dir.join("advertisement"), advertisement("release", false)).unwrap();
    let script = dir.join("ssh");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\nhead -c 262144 /dev/zero | tr '\\0' 'x' >&2\ncat '{}'\ncat >/dev/null\n",
            dir.join("advertisement").display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[cfg(unix)]
#[tokio::test]
async fn ssh_stderr_is_drained_while_reading_refs() {
    let dir = tempfile::tempdir().unwrap();
    let options = FetchOptions {
        ssh_program: noisy_ssh(dir.path()),
        ..FetchOptions::default()
    }
    .with_discovery_timeout(std::time::Duration::from_secs(20));

    let repo = parse_locator("git@example.com:owner/repo.git").unwrap();
    let refs = UploadPackDiscovery::new(&options)
        .advertised_refs(&repo)
        .await
        .unwrap();
    assert_eq!(refs.default_branch(), Some("release"));
}
