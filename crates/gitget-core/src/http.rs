//! Direct HTTP(S) downloads.

use async_trait::async_trait;
use futures::StreamExt;
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::options::FetchOptions;

/// Fetches a resource by URL.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `url` and return the body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnsupportedTransport`] for non-HTTP schemes,
    /// [`FetchError::HttpStatus`] for non-success responses and
    /// [`FetchError::DownloadTooLarge`] past the size limit.
    async fn get(&self, url: &str) -> FetchResult<Vec<u8>>;
}

/// [`HttpFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    options: FetchOptions,
}

impl ReqwestFetcher {
    /// Use the timeout, TLS, size and user agent settings of `options`.
    #[must_use]
    pub fn new(options: &FetchOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }

    fn client(&self, url: &str) -> FetchResult<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(&self.options.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(self.options.http_timeout)
            .danger_accept_invalid_certs(self.options.insecure_skip_tls)
            .build()
            .map_err(|e| FetchError::Http {
                url: url.to_owned(),
                message: format!("failed to create HTTP client: {e}"),
            })
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new(&FetchOptions::default())
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> FetchResult<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Http {
            url: url.to_owned(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedTransport {
                scheme: parsed.scheme().to_owned(),
                url: url.to_owned(),
            });
        }

        tracing::debug!(url, "Fetching over HTTP");

        let response = self
            .client(url)?
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                url: url.to_owned(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_owned(),
                status: response.status().as_u16(),
            });
        }

        let limit = self.options.max_download_bytes;
        if let Some(len) = response.content_length()
            && len > limit
        {
            return Err(FetchError::DownloadTooLarge { size: len, limit });
        }

        download_with_limit(response, url, limit).await
    }
}

/// Stream a response body, failing once it passes `max_size` bytes.
async fn download_with_limit(
    response: reqwest::Response,
    url: &str,
    max_size: u64,
) -> FetchResult<Vec<u8>> {
    let capacity =
        usize::try_from(response.content_length().unwrap_or(0).min(max_size)).unwrap_or(0);
    let mut bytes = Vec::with_capacity(capacity);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::Http {
            url: url.to_owned(),
            message: format!("download error: {e}"),
        })?;
        bytes.extend_from_slice(&chunk);
        let current_size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if current_size > max_size {
            return Err(FetchError::DownloadTooLarge {
                size: current_size,
                limit: max_size,
            });
        }
    }

    Ok(bytes)
}
