//! geoip_csv library: in-memory GeoIP lookups over MaxMind CSV data
//!
//! This library loads the CSV files of a MaxMind edition (country, city or
//! enterprise) into range-indexed memory tables, answers point lookups by
//! IPv4/IPv6 address, and keeps the files current with a background refresh
//! loop that downloads, verifies and extracts new archives.
//!
//! # Example
//!
//! ```no_run
//! use geoip_csv::{CityGeoIp, GeoIpOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = GeoIpOptions {
//!     data_directory: "./geoip_data".into(),
//!     ..Default::default()
//! };
//!
//! let service = CityGeoIp::new(options)?;
//! let summary = service.load().await?;
//! println!("Loaded {} blocks", summary.counts.blocks);
//!
//! if let Some(found) = service.lookup("8.8.8.8")? {
//!     println!("{} -> {:?}", found.block.network, found.location.and_then(|l| l.country_name));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! The refresh loop and [`GeoIpService`] require a Tokio runtime. The
//! [`GeoDataStore`] itself is synchronous.

pub mod config;
pub mod error_handling;
pub mod geoip;
pub mod index;
pub mod initialization;
pub mod models;
pub mod network;
pub mod refresh;
pub mod tabular;

// Re-export public API
pub use config::{Cli, Command, FileFilters, GeoIpOptions, LogFormat, LogLevel, RecordShape};
pub use error_handling::{AddressError, GeoIpError, InitializationError, LoadError, UpdateError};
pub use geoip::{
    CityGeoIp, CountryGeoIp, DatasetCounts, EnterpriseGeoIp, GeoDataStore, GeoIpService,
    LoadSummary, LookupResult,
};
pub use network::{is_valid_address, is_valid_cidr, parse_address, parse_cidr, AddressRange};
pub use refresh::{RefreshEvent, RefreshService, RefreshState, UpdateOutcome, UpdateSlot};
