//! Error handling.
//!
//! This module provides:
//! - Error type definitions for every layer (codec, load, update, facade)
//! - The retry strategy used for transient transport failures
//!
//! Queries for absent keys never produce errors; they return `None`.

mod categorization;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, get_retry_strategy};
pub(crate) use categorization::status_error;
pub use types::{AddressError, GeoIpError, InitializationError, LoadError, UpdateError};
