//! Location rows keyed by `geoname_id`.

use serde::{Deserialize, Serialize};

use super::flags::deserialize_flag;
use crate::index::Keyed;

/// Row of a `*-Country-Locations-<lang>.csv` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryLocation {
    pub geoname_id: u32,
    pub locale_code: Option<String>,
    pub continent_code: Option<String>,
    pub continent_name: Option<String>,
    pub country_iso_code: Option<String>,
    pub country_name: Option<String>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_in_european_union: bool,
}

/// Row of a `*-City-Locations-<lang>.csv` file, also used by the enterprise edition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityLocation {
    pub geoname_id: u32,
    pub locale_code: Option<String>,
    pub continent_code: Option<String>,
    pub continent_name: Option<String>,
    pub country_iso_code: Option<String>,
    pub country_name: Option<String>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_in_european_union: bool,
    pub subdivision_1_iso_code: Option<String>,
    pub subdivision_1_name: Option<String>,
    pub subdivision_2_iso_code: Option<String>,
    pub subdivision_2_name: Option<String>,
    pub city_name: Option<String>,
    pub metro_code: Option<String>,
    pub time_zone: Option<String>,
}

impl Keyed for CountryLocation {
    fn key(&self) -> u32 {
        self.geoname_id
    }
}

impl Keyed for CityLocation {
    fn key(&self) -> u32 {
        self.geoname_id
    }
}
