//! In-memory chunked collections.
//!
//! Records arrive in batches from the CSV reader; each batch is kept as one
//! immutable [`Chunk`]. [`RangeIndex`] answers point queries over address
//! ranges, [`LookupTable`] answers id queries over flat tables.

mod matches;
mod range_index;
mod table;

use std::sync::Arc;

use crate::network::AddressRange;

pub use matches::Matches;
pub use range_index::RangeIndex;
pub use table::LookupTable;

/// One immutable, pre-sorted batch of records.
pub type Chunk<T> = Arc<[T]>;

/// A record that covers an address range.
pub trait Ranged {
    fn range(&self) -> AddressRange;
}

/// A record identified by an integer id.
pub trait Keyed {
    fn key(&self) -> u32;
}
