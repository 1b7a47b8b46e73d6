//! HTTP fetching with bounded retry and linear backoff.
//!
//! Every network call in the scrapers (menu pages, JSON endpoints, PDF
//! downloads, vision-model requests) goes through [`with_retry`], so the
//! retry behaviour lives in one place instead of one loop per site.
//!
//! # Backoff Strategy
//!
//! ```text
//! delay(attempt) = base_delay * attempt + random_jitter(0..=max_jitter)
//! ```
//!
//! With the defaults (3 attempts, 2 s base) a failing request is tried at
//! t=0, ~2 s and ~6 s before the error is returned to the caller.

use rand::{Rng, rng};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    /// Delay after the first failure; grows linearly with the attempt number.
    pub base_delay: Duration,
    /// Upper bound of the random jitter added to each delay.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_jitter: Duration::from_millis(250),
        }
    }

    pub fn without_jitter(mut self) -> Self {
        self.max_jitter = Duration::ZERO;
        self
    }

    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let linear = self.base_delay.saturating_mul(attempt as u32);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return linear;
        }
        linear + Duration::from_millis(rng().random_range(0..=jitter_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

/// Run `op` until it succeeds or `policy.max_attempts` is exhausted,
/// sleeping `policy.delay_for(attempt)` between tries. The last error is
/// returned.
#[instrument(level = "debug", skip(policy, op))]
pub async fn with_retry<T, F, Fut>(
    what: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, Box<dyn Error>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Box<dyn Error>>>,
{
    let total_t0 = Instant::now();
    let mut attempt = 0usize;

    loop {
        let attempt_t0 = Instant::now();
        match op().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempt = attempt + 1, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) => {
                attempt += 1;
                let attempt_dt = attempt_t0.elapsed();
                let total_dt = total_t0.elapsed();

                if attempt >= policy.max_attempts {
                    error!(
                        attempt,
                        max = policy.max_attempts,
                        elapsed_ms_total = total_dt.as_millis(),
                        error = %e,
                        "Exhausted retries"
                    );
                    return Err(e);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max = policy.max_attempts,
                    elapsed_ms_attempt = attempt_dt.as_millis(),
                    ?delay,
                    error = %e,
                    "Attempt failed; backing off"
                );
                sleep(delay).await;
            }
        }
    }
}

/// Shared HTTP client with browser-like headers and retrying getters.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,application/json,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let inner = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { inner, retry })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The underlying client, for requests that are not plain GETs.
    pub fn client(&self) -> &reqwest::Client {
        &self.inner
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String, Box<dyn Error>> {
        with_retry(url, &self.retry, move || async move {
            let resp = self.inner.get(url).send().await?.error_for_status()?;
            Ok::<String, Box<dyn Error>>(resp.text().await?)
        })
        .await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
        with_retry(url, &self.retry, move || async move {
            let resp = self.inner.get(url).send().await?.error_for_status()?;
            Ok::<Vec<u8>, Box<dyn Error>>(resp.bytes().await?.to_vec())
        })
        .await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Box<dyn Error>> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn instant_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO).without_jitter()
    }

    #[test]
    fn test_delay_is_linear_without_jitter() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2)).without_jitter();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        for _ in 0..20 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_millis(1250));
        }
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicUsize::new(0);
        let result = with_retry("flaky", &instant_policy(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err::<usize, Box<dyn Error>>("temporarily unavailable".into())
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result = with_retry("down", &instant_policy(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), Box<dyn Error>>("connection refused".into()) }
        })
        .await;
        assert_eq!(result.unwrap_err().to_string(), "connection refused");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_client_builds() {
        let client = HttpClient::new(Duration::from_secs(5), RetryPolicy::default()).unwrap();
        assert_eq!(client.retry_policy().max_attempts, 3);
    }
}
