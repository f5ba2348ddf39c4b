use std::{future::Future, path::Path, time::Duration};

use tracing::warn;

use super::Transport;
use crate::error::{Error, Result};

/// Bounded retries with exponential backoff for transient fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    /// Sleep before retry number `attempt` (0-based): `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }

    /// Connection failures, timeouts, throttling and server errors are
    /// retried. Other HTTP errors (404 in particular) are terminal.
    pub fn is_retryable(err: &Error) -> bool {
        match err.status() {
            Some(0 | 408 | 429) => true,
            Some(status) => status >= 500,
            None => false,
        }
    }

    /// Run `op` until it succeeds, fails terminally, or attempts run out.
    /// The last error is returned.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt + 1 < self.max_attempts && Self::is_retryable(&err) => {
                    let delay = self.delay_for(attempt);
                    warn!(what, attempt = attempt + 1, max = self.max_attempts, ?delay, error = %err, "Retrying after transient failure");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Download `url` to `path` with retries, removing any partial output
    /// before each new attempt.
    pub async fn download(&self, transport: &dyn Transport, url: &str, path: &Path) -> Result<u64> {
        self.run(url, || async move {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
            transport.fetch_to_file(url, path).await
        })
        .await
    }
}
