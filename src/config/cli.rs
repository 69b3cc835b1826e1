//! Command-line options.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use super::types::{GeoIpOptions, LogFormat, LogLevel};

/// Record shapes matching the MaxMind CSV editions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RecordShape {
    /// GeoLite2/GeoIP2 Country
    Country,
    /// GeoLite2/GeoIP2 City
    City,
    /// GeoIP2 Enterprise (city locations plus ISP table)
    Enterprise,
}

/// Look up IP addresses in MaxMind CSV data and keep it up to date.
#[derive(Debug, Parser)]
#[command(name = "geoip_csv", version, about)]
pub struct Cli {
    /// JSON options file (fields not listed keep their defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the extracted CSV files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Record shape of the configured edition
    #[arg(long, value_enum, default_value = "city", global = true)]
    pub shape: RecordShape,

    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the data directory and print the record for each address as JSON
    Lookup {
        /// IPv4 or IPv6 addresses
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Download, verify and extract the current edition once
    Update,
    /// Load, then keep refreshing in the background until Ctrl-C
    Watch,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded options.
    pub fn apply_to(&self, mut options: GeoIpOptions) -> GeoIpOptions {
        if let Some(dir) = &self.data_dir {
            options.data_directory = dir.clone();
        }
        options
    }
}
