//! Address codec.
//!
//! Converts IPv4/IPv6 text into `u128` ordinals in a single IPv6-sized space
//! (IPv4 is mapped to `::ffff:0:0/96`) and expands CIDR networks into
//! inclusive [`AddressRange`]s.

mod address;
mod cidr;

pub use address::{
    ip_to_ordinal, is_valid_address, ordinal_to_ip, parse_address, ParsedAddress,
    IPV4_MAPPED_PREFIX,
};
pub use cidr::{is_valid_cidr, parse_cidr, AddressRange};
