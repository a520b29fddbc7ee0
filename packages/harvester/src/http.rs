//! HTTP transport for downloading registry documents.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::StatusCode;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("iana-harvester/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Result of a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// Full response body.
    Body {
        bytes: Vec<u8>,
        last_modified: Option<String>,
    },
    /// The server confirmed the cached copy is current.
    NotModified,
}

/// Network collaborator used by the fetcher.
pub trait Transport: Send + Sync {
    /// Download `url`.
    ///
    /// When `if_modified_since` is set the transport may answer
    /// [`Download::NotModified`].
    fn get(&self, url: &str, if_modified_since: Option<&str>) -> Result<Download>;
}

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` configured with appropriate timeout and user agent.
pub fn create_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// `reqwest`-backed transport with retry.
pub struct HttpTransport {
    client: Client,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl HttpTransport {
    /// Create a transport with the default timeout and retry policy.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: create_client(Duration::from_secs(HTTP_TIMEOUT_SECS))?,
            max_retries: MAX_RETRIES,
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_base_delay = base_delay;
        self
    }
}

impl Transport for HttpTransport {
    /// Download with retry logic.
    ///
    /// Uses exponential backoff for transient failures (network errors, 5xx responses).
    fn get(&self, url: &str, if_modified_since: Option<&str>) -> Result<Download> {
        let mut last_error: Option<String> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1000ms, 2000ms
                let delay = self.retry_base_delay * (1 << (attempt - 1));
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying after delay");
                thread::sleep(delay);
            }

            let mut request = self.client.get(url);
            if let Some(since) = if_modified_since {
                request = request.header(IF_MODIFIED_SINCE, since);
            }

            match request.send() {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NOT_MODIFIED {
                        return Ok(Download::NotModified);
                    }

                    // Retry on server errors (5xx)
                    if status.is_server_error() {
                        tracing::warn!(
                            url,
                            status = %status,
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            "Server error, will retry"
                        );
                        last_error = Some(format!("Server error: {status}"));
                        continue;
                    }

                    // Don't retry client errors (4xx) - they won't succeed
                    let response = response.error_for_status()?;
                    let last_modified = response
                        .headers()
                        .get(LAST_MODIFIED)
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    let bytes = response.bytes()?;
                    return Ok(Download::Body {
                        bytes: bytes.to_vec(),
                        last_modified,
                    });
                }
                Err(e) => {
                    // Retry on connection/timeout errors
                    if e.is_connect() || e.is_timeout() {
                        tracing::warn!(
                            url,
                            error = %e,
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            "Connection error, will retry"
                        );
                        last_error = Some(e.to_string());
                        continue;
                    }
                    // Other errors (like invalid URL) - don't retry
                    return Err(HarvesterError::Http(e));
                }
            }
        }

        // All retries exhausted
        Err(HarvesterError::RetriesExhausted {
            attempts: self.max_retries,
            message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}
