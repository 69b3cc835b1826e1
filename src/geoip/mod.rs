//! GeoIP lookup over MaxMind CSV datasets.
//!
//! This module provides the in-memory [`GeoDataStore`] loaded from the CSV
//! files of one edition, and the [`GeoIpService`] facade that keeps it
//! current through the refresh loop.

pub(crate) mod discovery;
mod error_log;
mod service;
mod store;

// Re-export public API
pub use discovery::{discover_files, DiscoveredFiles};
pub use service::{CityGeoIp, CountryGeoIp, EnterpriseGeoIp, GeoIpService};
pub use store::{DatasetCounts, GeoDataStore, LoadSummary, LookupResult};
