//! Record shapes for the three MaxMind editions.
//!
//! The store is generic over a block, location and ISP shape:
//!
//! | Edition | Block | Location | ISP |
//! |---|---|---|---|
//! | Country | [`CountryBlock`] | [`CountryLocation`] | [`NoIsp`] |
//! | City | [`CityBlock`] | [`CityLocation`] | [`NoIsp`] |
//! | Enterprise | [`EnterpriseBlock`] | [`CityLocation`] | [`IspRecord`] |

mod blocks;
mod flags;
mod isps;
mod locations;

use serde::de::DeserializeOwned;

use crate::index::{Keyed, Ranged};
use crate::network::AddressRange;

pub use blocks::{CityBlock, CountryBlock, EnterpriseBlock};
pub use isps::{IspRecord, NoIsp};
pub use locations::{CityLocation, CountryLocation};

/// A row read from a source CSV file and held in the store.
pub trait Record: DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Record for T where T: DeserializeOwned + Clone + Send + Sync + 'static {}

/// A network block row: carries the CIDR text its range is computed from.
pub trait BlockRow: Record + Ranged {
    /// The `network` column as read.
    fn network(&self) -> &str;

    /// Stores the range computed from [`network`](BlockRow::network).
    fn assign_range(&mut self, range: AddressRange);

    fn geoname_id(&self) -> Option<u32>;

    /// Foreign key into the ISP table, for shapes that have one.
    fn isp_id(&self) -> Option<u32> {
        None
    }
}

/// A location or ISP row looked up by id.
pub trait TableRow: Record + Keyed {}

impl<T> TableRow for T where T: Record + Keyed {}
