//! Shared HTTP client with timeout and retry policy

use codedrop_utils::error::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound for any single request
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(600);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Retries for 5xx and network failures
const MAX_RETRIES: u32 = 2;

/// Backoff grows linearly: 1s, 2s
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// `reqwest::Client` configured once and reused by every backend call
#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Client,
    max_timeout: Duration,
    backoff: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_timeout,
            backoff: INITIAL_BACKOFF,
        })
    }

    /// Same client with a different retry backoff step.
    #[cfg(test)]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send with `min(request_timeout, max_timeout)`, retrying 5xx and
    /// network failures. 4xx responses are never retried.
    pub async fn execute_with_retry(
        &self,
        request_builder: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| LlmError::Transport("Failed to clone request for retry".to_string()))?
                .timeout(effective_timeout)
                .build()
                .map_err(|e| LlmError::Transport(format!("Failed to build request: {e}")))?;

            debug!(
                provider = provider_name,
                attempt,
                url = %redact_error_message(request.url().as_str()),
                timeout_secs = effective_timeout.as_secs(),
                "executing HTTP request"
            );

            let error = match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_client_error() {
                        return Err(map_client_error(status, provider_name));
                    }
                    if !status.is_server_error() {
                        return Ok(response);
                    }
                    LlmError::ProviderOutage(format!(
                        "{provider_name} returned server error: {status}"
                    ))
                }
                Err(e) if e.is_timeout() => {
                    return Err(LlmError::Timeout {
                        duration: effective_timeout,
                    });
                }
                Err(e) => LlmError::Transport(format!(
                    "{provider_name} request failed: {}",
                    redact_error_message(&e.to_string())
                )),
            };

            if attempt > MAX_RETRIES {
                return Err(error);
            }
            warn!(provider = provider_name, attempt, error = %error, "request failed, will retry");
            tokio::time::sleep(self.backoff * attempt).await;
        }
    }
}

/// 401/403 → auth, 429 → quota, other 4xx → transport
fn map_client_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::ProviderAuth(format!("{provider_name} authentication failed: {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        StatusCode::NOT_FOUND => LlmError::Transport(format!(
            "{provider_name} returned {status} (is the model pulled?)"
        )),
        _ => LlmError::Transport(format!("{provider_name} returned client error: {status}")),
    }
}

static URL_WITH_CREDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://)[^:@\s/]+:[^@\s/]+@").unwrap());

/// Strip `user:pass@` from any URL in an error message.
pub(crate) fn redact_error_message(message: &str) -> String {
    URL_WITH_CREDS
        .replace_all(message, "$1[REDACTED]@")
        .into_owned()
}
