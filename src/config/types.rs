//! Configuration types.
//!
//! This module defines the options consumed by the store and the refresh
//! service, plus the logging enums shared with the CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::config::constants::*;
use crate::error_handling::UpdateError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// File name filters used to locate each source file.
///
/// A filter matches a file whose name contains it. An empty filter disables
/// that source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFilters {
    pub blocks_ipv4: String,
    pub blocks_ipv6: String,
    pub locations: String,
    pub isps: String,
}

impl Default for FileFilters {
    fn default() -> Self {
        Self {
            blocks_ipv4: DEFAULT_BLOCKS_IPV4_FILTER.to_string(),
            blocks_ipv6: DEFAULT_BLOCKS_IPV6_FILTER.to_string(),
            locations: DEFAULT_LOCATIONS_FILTER.to_string(),
            isps: String::new(),
        }
    }
}

impl FileFilters {
    /// Returns the enabled (non-empty) filters in load order.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        [
            self.blocks_ipv4.as_str(),
            self.blocks_ipv6.as_str(),
            self.locations.as_str(),
            self.isps.as_str(),
        ]
        .into_iter()
        .filter(|f| !f.is_empty())
    }
}

/// Options for loading and refreshing the GeoIP dataset.
///
/// Every field has a default, so a JSON options file only needs to list the
/// values it overrides.
///
/// # Examples
///
/// ```no_run
/// use geoip_csv::GeoIpOptions;
/// use std::path::PathBuf;
///
/// let options = GeoIpOptions {
///     data_directory: PathBuf::from("/var/lib/geoip"),
///     license_key: "my-key".to_string(),
///     auto_update: true,
///     ..Default::default()
/// };
/// assert!(options.validate_update().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoIpOptions {
    /// Directory holding the extracted CSV files
    pub data_directory: PathBuf,

    /// Filters used to find each source file
    pub file_filters: FileFilters,

    /// Language of the locations file (rewrites the filter to `Locations-<lang>.csv`)
    pub location_language: Option<String>,

    /// Rows per reader batch (one index chunk per batch)
    pub chunk_size: usize,

    /// Optional file that receives malformed-row messages on each load
    pub reader_error_log: Option<PathBuf>,

    /// MaxMind license key (falls back to `MAXMIND_LICENSE_KEY`)
    pub license_key: String,

    /// MaxMind edition, e.g. `GeoLite2-City-CSV`
    pub edition: String,

    /// Download URL template with `$(MaxmindEdition)` / `$(MaxmindLicenseKey)` placeholders
    pub download_url: String,

    /// Verify downloads against the `.sha256` sidecar
    pub hash_check: bool,

    /// Keep the downloaded archive after extraction
    pub keep_archive: bool,

    /// Run the background refresh loop
    pub auto_update: bool,

    /// Load the dataset when the service starts
    pub auto_load: bool,

    /// Additional attempts for transient transport failures
    pub download_retries: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for GeoIpOptions {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from(DEFAULT_DATA_DIRECTORY),
            file_filters: FileFilters::default(),
            location_language: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            reader_error_log: None,
            license_key: String::new(),
            edition: DEFAULT_EDITION.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            hash_check: true,
            keep_archive: false,
            auto_update: false,
            auto_load: true,
            download_retries: DEFAULT_DOWNLOAD_RETRIES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GeoIpOptions {
    /// Reads options from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        let options: GeoIpOptions = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse options file {}", path.display()))?;
        Ok(options)
    }

    /// Fills an empty license key from the `MAXMIND_LICENSE_KEY` environment variable.
    pub fn with_env_license_key(mut self) -> Self {
        if self.license_key.is_empty() {
            if let Ok(key) = std::env::var(MAXMIND_LICENSE_KEY_ENV) {
                self.license_key = key;
            }
        }
        self
    }

    /// Filters with `location_language` applied.
    pub fn effective_filters(&self) -> FileFilters {
        let mut filters = self.file_filters.clone();
        if let Some(language) = self.location_language.as_deref().filter(|l| !l.is_empty()) {
            filters.locations = format!("Locations-{}.csv", language);
        }
        filters
    }

    /// Batch size, never zero.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }

    /// Download URL with placeholders substituted (license key URL-encoded).
    pub fn resolved_download_url(&self) -> String {
        let encoded_key =
            form_urlencoded::byte_serialize(self.license_key.as_bytes()).collect::<String>();
        self.download_url
            .replace(LICENSE_KEY_PLACEHOLDER, &encoded_key)
            .replace(EDITION_PLACEHOLDER, &self.edition)
    }

    /// Download URL safe for logs and error messages.
    pub fn redacted_download_url(&self) -> String {
        self.download_url
            .replace(LICENSE_KEY_PLACEHOLDER, "***")
            .replace(EDITION_PLACEHOLDER, &self.edition)
    }

    /// File name of the temporary archive inside the data directory.
    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.edition)
    }

    /// Checks the options an update needs, before any network or disk activity.
    pub fn validate_update(&self) -> Result<(), UpdateError> {
        require(&self.license_key, "license_key")?;
        require(&self.edition, "edition")?;
        require(&self.download_url, "download_url")?;

        let filters = self.effective_filters();
        if filters.blocks_ipv4.is_empty()
            && filters.blocks_ipv6.is_empty()
            && filters.locations.is_empty()
        {
            return Err(UpdateError::Configuration(
                "Updating requires at least one file filter".to_string(),
            ));
        }
        Ok(())
    }
}

fn require(value: &str, name: &str) -> Result<(), UpdateError> {
    if value.trim().is_empty() {
        return Err(UpdateError::Configuration(format!(
            "Required option not set: {}",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_options() -> GeoIpOptions {
        GeoIpOptions {
            license_key: "abc123".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_options_default() {
        let options = GeoIpOptions::default();
        assert_eq!(options.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(options.edition, DEFAULT_EDITION);
        assert!(options.hash_check);
        assert!(options.auto_load);
        assert!(!options.auto_update);
        assert!(!options.keep_archive);
        assert!(options.file_filters.isps.is_empty());
    }

    #[test]
    fn test_validate_update_requires_license_key() {
        let err = GeoIpOptions::default().validate_update().unwrap_err();
        match err {
            UpdateError::Configuration(msg) => assert!(msg.contains("license_key")),
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_update_requires_edition_and_url() {
        let mut options = update_options();
        options.edition = String::new();
        assert!(matches!(
            options.validate_update(),
            Err(UpdateError::Configuration(msg)) if msg.contains("edition")
        ));

        let mut options = update_options();
        options.download_url = "  ".to_string();
        assert!(matches!(
            options.validate_update(),
            Err(UpdateError::Configuration(msg)) if msg.contains("download_url")
        ));
    }

    #[test]
    fn test_validate_update_requires_a_filter() {
        let mut options = update_options();
        options.file_filters = FileFilters {
            blocks_ipv4: String::new(),
            blocks_ipv6: String::new(),
            locations: String::new(),
            isps: "Isp.csv".to_string(),
        };
        assert!(matches!(
            options.validate_update(),
            Err(UpdateError::Configuration(msg)) if msg.contains("file filter")
        ));

        assert!(update_options().validate_update().is_ok());
    }

    #[test]
    fn test_resolved_download_url_substitutes_and_encodes() {
        let options = GeoIpOptions {
            license_key: "key+with&chars".to_string(),
            edition: "GeoLite2-Country-CSV".to_string(),
            ..Default::default()
        };
        let url = options.resolved_download_url();
        assert!(url.contains("edition_id=GeoLite2-Country-CSV"));
        assert!(url.contains("license_key=key%2Bwith%26chars"));
        assert!(!url.contains("$("));

        let redacted = options.redacted_download_url();
        assert!(redacted.contains("license_key=***"));
        assert!(!redacted.contains("key%2Bwith"));
    }

    #[test]
    fn test_location_language_rewrites_filter() {
        let options = GeoIpOptions {
            location_language: Some("de".to_string()),
            ..Default::default()
        };
        assert_eq!(options.effective_filters().locations, "Locations-de.csv");
        assert_eq!(
            GeoIpOptions::default().effective_filters().locations,
            DEFAULT_LOCATIONS_FILTER
        );
    }

    #[test]
    fn test_effective_chunk_size_never_zero() {
        let options = GeoIpOptions {
            chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(options.effective_chunk_size(), 1);
    }

    #[test]
    fn test_from_json_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("options.json");
        std::fs::write(
            &path,
            r#"{ "edition": "GeoIP2-Enterprise-CSV", "file_filters": { "isps": "ISP.csv" } }"#,
        )
        .expect("Failed to write options");

        let options = GeoIpOptions::from_json_file(&path).expect("Failed to parse options");
        assert_eq!(options.edition, "GeoIP2-Enterprise-CSV");
        assert_eq!(options.file_filters.isps, "ISP.csv");
        assert_eq!(options.file_filters.blocks_ipv4, DEFAULT_BLOCKS_IPV4_FILTER);
        assert_eq!(options.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_from_json_file_invalid() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json").expect("Failed to write options");
        let err = GeoIpOptions::from_json_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse options file"));
    }

    #[test]
    fn test_enabled_filters_skip_empty() {
        let filters = FileFilters::default();
        let enabled: Vec<&str> = filters.enabled().collect();
        assert_eq!(
            enabled,
            vec![
                DEFAULT_BLOCKS_IPV4_FILTER,
                DEFAULT_BLOCKS_IPV6_FILTER,
                DEFAULT_LOCATIONS_FILTER
            ]
        );
    }
}
