use std::time::Duration;

use reqwest::{header::HeaderMap, StatusCode};

const MAX_BACKOFF_DOUBLINGS: u32 = 6;
const ERROR_BODY_MAX_CHARS: usize = 320;

/// Attempt budget and exponential backoff for Slack Web API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(max_attempts: usize, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms.max(1)),
        }
    }

    /// `attempt` is 1-based and counts the call that just failed.
    pub(crate) fn allows_retry_after(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    /// A server-provided `Retry-After` wins over the backoff schedule.
    pub(crate) fn delay(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| {
            let doublings = (attempt.saturating_sub(1) as u32).min(MAX_BACKOFF_DOUBLINGS);
            self.base_delay.saturating_mul(1 << doublings)
        })
    }
}

pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let seconds = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    seconds.trim().parse().ok().map(Duration::from_secs)
}

pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub(crate) fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
}

/// Response body shortened for error chains.
pub(crate) fn clip_error_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
