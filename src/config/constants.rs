//! Configuration constants.
//!
//! This module defines the constants used throughout the crate, including
//! refresh delays, defaults for [`GeoIpOptions`](super::GeoIpOptions), and
//! network limits.

use std::time::Duration;

// Refresh schedule
/// Delay after a successful update before the next freshness check
pub const UPDATED_DELAY: Duration = Duration::from_secs(72 * 60 * 60);
/// Delay when the local data is stale but no newer remote data exists yet
pub const STALE_DELAY: Duration = Duration::from_secs(6 * 60 * 60);
/// Delay when the local data is current
pub const CURRENT_DELAY: Duration = Duration::from_secs(24 * 60 * 60);
/// Delay after a failed cycle, or while another update is in flight
pub const ERROR_DELAY: Duration = Duration::from_secs(60 * 60);
/// Local data older than this many days is polled on the faster schedule
pub const STALE_AFTER_DAYS: u64 = 3;

// Defaults for GeoIpOptions
pub const DEFAULT_DATA_DIRECTORY: &str = "./geoip_data";
pub const DEFAULT_BLOCKS_IPV4_FILTER: &str = "Blocks-IPv4.csv";
pub const DEFAULT_BLOCKS_IPV6_FILTER: &str = "Blocks-IPv6.csv";
pub const DEFAULT_LOCATIONS_FILTER: &str = "Locations-en.csv";
pub const DEFAULT_EDITION: &str = "GeoLite2-City-CSV";
/// Download URL template; placeholders are substituted per request
pub const DEFAULT_DOWNLOAD_URL: &str = "https://download.maxmind.com/app/geoip_download?edition_id=$(MaxmindEdition)&license_key=$(MaxmindLicenseKey)&suffix=zip";
/// Rows per reader batch, which is also the size of one index chunk
pub const DEFAULT_CHUNK_SIZE: usize = 5_000;

/// URL template placeholder for the edition name
pub const EDITION_PLACEHOLDER: &str = "$(MaxmindEdition)";
/// URL template placeholder for the license key
pub const LICENSE_KEY_PLACEHOLDER: &str = "$(MaxmindLicenseKey)";
/// Environment variable name for MaxMind license key
pub const MAXMIND_LICENSE_KEY_ENV: &str = "MAXMIND_LICENSE_KEY";
/// Suffix appended to the download URL to fetch the digest sidecar
pub const HASH_SIDECAR_SUFFIX: &str = ".sha256";

// Network limits
/// Whole-request timeout for downloads in seconds (archives are large)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
/// Maximum archive size in bytes (1GB)
pub const MAX_ARCHIVE_DOWNLOAD_SIZE: u64 = 1024 * 1024 * 1024;
/// Additional attempts for transient transport failures
pub const DEFAULT_DOWNLOAD_RETRIES: usize = 2;
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("geoip_csv/", env!("CARGO_PKG_VERSION"));

// Retry strategy (tokio-retry ExponentialBackoff: delay = base^n * factor ms)
pub const RETRY_BASE: u64 = 2;
pub const RETRY_FACTOR: u64 = 250;
pub const RETRY_MAX_DELAY_SECS: u64 = 30;
