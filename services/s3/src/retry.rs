use std::time::Duration;

use http::StatusCode;
use reqsend_core::Error;
use tokio::sync::watch;

/// Maximum number of attempts before giving up.
pub const MAX_ATTEMPTS: usize = 5;

/// HTTP statuses that end the retry loop as a success right away.
pub const SUCCESS_STATUS: [StatusCode; 3] = [
    StatusCode::OK,
    StatusCode::NO_CONTENT,
    StatusCode::PARTIAL_CONTENT,
];

/// Transport error fragments that can and should be retried.
const TRANSIENT_NET_ERRORS: [&str; 6] = [
    "i/o timeout",
    "TLS handshake timeout",
    "connection reset by peer",
    "operation timed out",
    "dns error",
    "connection closed",
];

/// Is this transport/construction error worth another attempt.
pub fn is_net_err_retryable(err: &Error) -> bool {
    let message = err.to_string();
    TRANSIENT_NET_ERRORS
        .iter()
        .any(|fragment| message.contains(fragment))
}

/// S3 error codes which are retryable.
const RETRYABLE_S3_CODES: [&str; 9] = [
    "RequestError",
    "RequestTimeout",
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "RequestThrottled",
    "InternalError",
    "ExpiredToken",
    "ExpiredTokenException",
];

/// Is this s3 error code retryable.
pub fn is_s3_code_retryable(code: &str) -> bool {
    RETRYABLE_S3_CODES.contains(&code)
}

/// HTTP status codes which are retryable.
const RETRYABLE_HTTP_STATUS: [u16; 4] = [429, 500, 502, 503];

/// Is this HTTP status code retryable.
pub fn is_http_status_retryable(status: StatusCode) -> bool {
    RETRYABLE_HTTP_STATUS.contains(&status.as_u16())
}

/// Yields attempt indices `1..=max_attempts`, sleeping exponentially
/// longer between them: after attempt `n` the wait is
/// `unit * 2^(n-1)`.
///
/// The paired [`RetryCancel`] stops the sequence: once fired (or
/// dropped), `next` returns `None` without waiting out the backoff.
#[derive(Debug)]
pub struct RetryTimer {
    max_attempts: usize,
    unit: Duration,
    attempt: usize,
    cancel: watch::Receiver<bool>,
}

/// Handle that stops a [`RetryTimer`] early.
///
/// Dropping the handle cancels as well, so a caller that wants the full
/// sequence must keep it alive for the duration of the loop.
#[derive(Debug)]
pub struct RetryCancel {
    tx: watch::Sender<bool>,
}

impl RetryCancel {
    /// Stop the paired timer. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl RetryTimer {
    /// Create a timer for `max_attempts` attempts with the given base
    /// backoff unit, plus the handle that cancels it.
    pub fn new(max_attempts: usize, unit: Duration) -> (Self, RetryCancel) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                max_attempts,
                unit,
                attempt: 0,
                cancel: rx,
            },
            RetryCancel { tx },
        )
    }

    /// Yield the next attempt index, waiting out the backoff first.
    ///
    /// Returns `None` once the attempts are used up or the sequence was
    /// canceled mid-wait.
    pub async fn next(&mut self) -> Option<usize> {
        if self.attempt >= self.max_attempts || *self.cancel.borrow() {
            return None;
        }

        if self.attempt > 0 {
            let wait = self.unit * (1u32 << (self.attempt - 1));
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                // Either an explicit cancel or the handle going away.
                _ = self.cancel.changed() => return None,
            }
        }

        self.attempt += 1;
        Some(self.attempt)
    }
}
