//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{GeoIpOptions, USER_AGENT};
use crate::error_handling::InitializationError;

/// Builds the client used for freshness checks and archive downloads.
///
/// The timeout covers the whole request including the body, so it must be
/// long enough for a full archive download.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the TLS backend cannot
/// be initialized.
pub fn init_client(options: &GeoIpOptions) -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(options.request_timeout_secs.max(1)))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_with_defaults() {
        assert!(init_client(&GeoIpOptions::default()).is_ok());
    }

    #[test]
    fn test_init_client_zero_timeout_is_clamped() {
        let options = GeoIpOptions {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(init_client(&options).is_ok());
    }
}
