//! Error type definitions.
//!
//! This module defines all error types used throughout the crate.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Errors produced while converting address text into ordinals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The text is not an IPv4 or IPv6 literal.
    #[error("Invalid IP address: '{0}'")]
    InvalidAddress(String),

    /// The text is not a valid `address/prefix` network.
    #[error("Invalid CIDR '{cidr}': {reason}")]
    InvalidCidr {
        /// The rejected input
        cidr: String,
        /// What was wrong with it
        reason: String,
    },
}

impl AddressError {
    pub(crate) fn cidr(cidr: &str, reason: impl Into<String>) -> Self {
        AddressError::InvalidCidr {
            cidr: cidr.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors produced by [`GeoDataStore::load`](crate::GeoDataStore::load).
#[derive(Error, Debug)]
pub enum LoadError {
    /// Neither the IPv4 nor the IPv6 blocks file was found.
    #[error("No blocks file found in {}", directory.display())]
    DataNotFound {
        /// The directory that was searched
        directory: PathBuf,
    },

    /// A source file or the reader error log could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The CSV stream itself failed (not a single malformed row).
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: csv::Error,
    },

    /// A thread panicked while holding the data lock.
    #[error("GeoIP data lock poisoned")]
    LockPoisoned,
}

/// Errors produced while checking for and downloading new source files.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// A required option is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An HTTP request failed or returned an unusable response.
    #[error("Transport error for {url}: {reason}")]
    Transport {
        /// Request URL (license key redacted)
        url: String,
        /// Failure description
        reason: String,
        /// Whether retrying could succeed (timeouts, 5xx, 429)
        retriable: bool,
    },

    /// The downloaded archive does not match its published SHA-256 digest.
    #[error("Archive hash mismatch: expected {expected}, computed {actual}")]
    Integrity {
        /// Digest from the `.sha256` sidecar
        expected: String,
        /// Digest of the downloaded file
        actual: String,
    },

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be opened or an entry could not be read.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl UpdateError {
    /// Returns `true` for transient transport failures worth retrying.
    pub fn is_retriable(&self) -> bool {
        matches!(self, UpdateError::Transport { retriable: true, .. })
    }
}

/// Errors surfaced by the [`GeoIpService`](crate::GeoIpService) facade.
#[derive(Error, Debug)]
pub enum GeoIpError {
    /// Loading the dataset failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Updating the source files failed.
    #[error(transparent)]
    Update(#[from] UpdateError),

    /// The blocking load task panicked.
    #[error("Load task failed: {0}")]
    Task(String),

    /// The service was asked to do something its lifecycle state forbids.
    #[error("Invalid service state: {0}")]
    State(String),
}
