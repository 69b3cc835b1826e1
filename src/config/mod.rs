//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (refresh delays, defaults, limits)
//! - [`GeoIpOptions`] and the file filters used for discovery
//! - CLI option types and parsing

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use cli::{Cli, Command, RecordShape};
pub use constants::*;
pub use types::{FileFilters, GeoIpOptions, LogFormat, LogLevel};
