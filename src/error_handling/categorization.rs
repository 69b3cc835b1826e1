//! Error categorization and retry strategy.
//!
//! This module maps `reqwest` failures onto [`UpdateError`] and configures the
//! retry strategy used for source downloads.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::UpdateError;

/// Creates an exponential backoff retry strategy.
///
/// Returns a retry strategy configured with:
/// - Delay `RETRY_BASE^n * RETRY_FACTOR` milliseconds before retry `n`
///   (500ms, 1s, 2s, ... with the defaults)
/// - Maximum delay: `RETRY_MAX_DELAY_SECS` seconds
/// - `retries` additional attempts after the first one
///
/// # Returns
///
/// A retry strategy iterator ready for use with `tokio_retry::RetryIf`.
pub fn get_retry_strategy(retries: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(crate::config::RETRY_BASE)
        .factor(crate::config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
        .take(retries)
}

/// Categorizes a `reqwest::Error` into an [`UpdateError::Transport`].
///
/// Timeouts, connection failures, 5xx and 429 responses are marked retriable;
/// everything else (4xx, decode and redirect errors) is permanent.
pub fn categorize_reqwest_error(url: &str, error: &reqwest::Error) -> UpdateError {
    let retriable = match error.status() {
        Some(status) => {
            status.is_server_error()
                || status.as_u16() == crate::config::HTTP_STATUS_TOO_MANY_REQUESTS
        }
        None => error.is_timeout() || error.is_connect() || error.is_request(),
    };

    UpdateError::Transport {
        url: url.to_string(),
        reason: error.to_string(),
        retriable,
    }
}

/// Builds the error for a non-success HTTP status.
pub(crate) fn status_error(url: &str, status: reqwest::StatusCode) -> UpdateError {
    UpdateError::Transport {
        url: url.to_string(),
        reason: format!("Response error {}", status),
        retriable: status.is_server_error()
            || status.as_u16() == crate::config::HTTP_STATUS_TOO_MANY_REQUESTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_strategy_respects_retry_count() {
        assert_eq!(get_retry_strategy(0).count(), 0);
        assert_eq!(get_retry_strategy(3).count(), 3);
    }

    #[test]
    fn test_retry_strategy_delays_grow_and_are_capped() {
        let delays: Vec<Duration> = get_retry_strategy(8).collect();
        for pair in delays.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        let cap = Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS);
        assert!(delays.iter().all(|d| *d <= cap));
    }

    #[test]
    fn test_status_error_classification() {
        let url = "https://example.com/db.zip";
        assert!(status_error(url, reqwest::StatusCode::SERVICE_UNAVAILABLE).is_retriable());
        assert!(status_error(url, reqwest::StatusCode::TOO_MANY_REQUESTS).is_retriable());
        assert!(!status_error(url, reqwest::StatusCode::UNAUTHORIZED).is_retriable());
        assert!(!status_error(url, reqwest::StatusCode::NOT_FOUND).is_retriable());
    }
}
