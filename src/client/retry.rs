//! Retry seam for throttled or transiently failing calls
//!
//! The endpoint client asks its policy after every response whether the call
//! should be issued again. The shipped policy never retries; exponential
//! backoff keyed on 429/503/504 plugs in here.

use reqwest::StatusCode;
use std::time::Duration;

/// Decides whether a response should be retried and after what delay
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Delay before re-issuing the call, or `None` to return the response as is
    ///
    /// `attempt` starts at 1 for the first response received.
    fn retry_after(&self, status: StatusCode, attempt: u32) -> Option<Duration>;
}

/// Policy that returns every response to the caller untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn retry_after(&self, _status: StatusCode, _attempt: u32) -> Option<Duration> {
        None
    }
}
