//! ISP rows keyed by `isp_id`.

use serde::{Deserialize, Serialize};

use crate::index::Keyed;

/// Row of a `GeoIP2-Enterprise-ISP.csv` style file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IspRecord {
    pub isp_id: u32,
    pub isp: Option<String>,
    pub organization: Option<String>,
    pub autonomous_system_number: Option<u32>,
    pub autonomous_system_organization: Option<String>,
    pub connection_type: Option<String>,
    pub user_type: Option<String>,
    pub mobile_country_code: Option<String>,
    pub mobile_network_code: Option<String>,
}

impl Keyed for IspRecord {
    fn key(&self) -> u32 {
        self.isp_id
    }
}

/// Placeholder ISP shape for editions without an ISP table.
///
/// Never loaded: the ISP filter is empty for country and city editions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoIsp {
    isp_id: u32,
}

impl Keyed for NoIsp {
    fn key(&self) -> u32 {
        self.isp_id
    }
}
