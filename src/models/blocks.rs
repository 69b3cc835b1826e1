//! Network block rows.
//!
//! One struct per edition. Column names follow the MaxMind CSV headers; a
//! missing column deserializes to its default.

use serde::{Deserialize, Serialize};

use super::flags::deserialize_flag;
use super::BlockRow;
use crate::index::Ranged;
use crate::network::AddressRange;

/// Row of a `*-Country-Blocks-IPv{4,6}.csv` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryBlock {
    pub network: String,
    /// Filled from `network` during load.
    #[serde(skip_deserializing)]
    pub range: AddressRange,
    pub geoname_id: Option<u32>,
    pub registered_country_geoname_id: Option<u32>,
    pub represented_country_geoname_id: Option<u32>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_anonymous_proxy: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_satellite_provider: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_anycast: bool,
}

/// Row of a `*-City-Blocks-IPv{4,6}.csv` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityBlock {
    pub network: String,
    #[serde(skip_deserializing)]
    pub range: AddressRange,
    pub geoname_id: Option<u32>,
    pub registered_country_geoname_id: Option<u32>,
    pub represented_country_geoname_id: Option<u32>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_anonymous_proxy: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_satellite_provider: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_anycast: bool,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Radius in kilometers around the coordinates.
    pub accuracy_radius: Option<u32>,
}

/// Row of a `GeoIP2-Enterprise-Blocks-IPv{4,6}.csv` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnterpriseBlock {
    pub network: String,
    #[serde(skip_deserializing)]
    pub range: AddressRange,
    pub geoname_id: Option<u32>,
    pub registered_country_geoname_id: Option<u32>,
    pub represented_country_geoname_id: Option<u32>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_anonymous_proxy: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_satellite_provider: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_anycast: bool,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_radius: Option<u32>,
    /// Foreign key into the ISP table.
    pub isp_id: Option<u32>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_legitimate_proxy: bool,
    pub domain: Option<String>,
    pub country_confidence: Option<u8>,
    pub subdivision_confidence: Option<u8>,
    pub city_confidence: Option<u8>,
    pub postal_confidence: Option<u8>,
}

macro_rules! impl_ranged {
    ($ty:ty) => {
        impl Ranged for $ty {
            fn range(&self) -> AddressRange {
                self.range
            }
        }
    };
}

impl_ranged!(CountryBlock);
impl_ranged!(CityBlock);
impl_ranged!(EnterpriseBlock);

impl BlockRow for CountryBlock {
    fn network(&self) -> &str {
        &self.network
    }

    fn assign_range(&mut self, range: AddressRange) {
        self.range = range;
    }

    fn geoname_id(&self) -> Option<u32> {
        self.geoname_id
    }
}

impl BlockRow for CityBlock {
    fn network(&self) -> &str {
        &self.network
    }

    fn assign_range(&mut self, range: AddressRange) {
        self.range = range;
    }

    fn geoname_id(&self) -> Option<u32> {
        self.geoname_id
    }
}

impl BlockRow for EnterpriseBlock {
    fn network(&self) -> &str {
        &self.network
    }

    fn assign_range(&mut self, range: AddressRange) {
        self.range = range;
    }

    fn geoname_id(&self) -> Option<u32> {
        self.geoname_id
    }

    fn isp_id(&self) -> Option<u32> {
        self.isp_id
    }
}
