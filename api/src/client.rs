//! HTTP access to the remote data API with timeout, retry and backoff.

use std::future::Future;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::ApiError;

/// How a request is retried before giving up.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,

    /// Sleep between attempts grows linearly: `base_delay * attempt`.
    pub base_delay: Duration,

    /// Per-attempt request timeout.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(350),
            timeout: Duration::from_secs(12),
        }
    }
}

/// Source of remote JSON documents.
///
/// Implemented by [`ApiClient`]; test doubles substitute canned payloads so
/// the store and resolver can be exercised without a network.
#[allow(async_fn_in_trait)]
pub trait RemoteSource {
    /// Fetch one document, retrying per the source's policy.
    async fn get_value(&self, url: &str) -> Result<Value, ApiError>;
}

/// Blocking-per-call client for the read-only data API.
///
/// Every `get_value` is synchronous from the caller's perspective: it
/// returns the decoded body of the first successful attempt, or
/// [`ApiError::Exhausted`] carrying the most recent cause once the retry
/// policy runs out. No de-duplication of concurrent identical requests is
/// attempted; the single consumer task never issues them.
pub struct ApiClient {
    http: reqwest::Client,
    policy: RetryPolicy,
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// One GET attempt: non-2xx statuses and undecodable bodies are
    /// failures just like transport errors, so they retry the same way.
    async fn attempt(&self, url: &str) -> Result<Value, ApiError> {
        let response = self
            .http
            .get(url)
            .timeout(self.policy.timeout)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSource for ApiClient {
    async fn get_value(&self, url: &str) -> Result<Value, ApiError> {
        retry(&self.policy, url, || self.attempt(url)).await
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// Backoff is linear, not exponential: the public API rate limit recovers
/// within a few hundred milliseconds and doubling just adds latency. One
/// structured log line per attempt; the error returned after the final
/// attempt carries only the most recent cause.
pub(crate) async fn retry<T, F, Fut>(policy: &RetryPolicy, url: &str, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let started = Instant::now();

        match op().await {
            Ok(value) => {
                tracing::debug!(
                    attempt,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    url,
                    "fetch succeeded"
                );
                return Ok(value);
            }
            Err(error) => {
                let status = error
                    .status_code()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                tracing::warn!(
                    attempt,
                    max_attempts,
                    status = %status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    url,
                    error = %error,
                    "fetch attempt failed"
                );

                if attempt >= max_attempts {
                    return Err(ApiError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        cause: Box::new(error),
                    });
                }
                tokio::time::sleep(policy.base_delay * attempt).await;
            }
        }
    }
}
