//! CIDR expansion into inclusive ordinal ranges.

use serde::{Deserialize, Serialize};

use super::address::parse_address;
use crate::error_handling::AddressError;

/// Inclusive range of ordinals, `begin <= end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    pub begin: u128,
    pub end: u128,
}

impl AddressRange {
    pub fn new(begin: u128, end: u128) -> Self {
        debug_assert!(begin <= end, "range begin {} > end {}", begin, end);
        Self { begin, end }
    }

    pub fn contains(&self, ordinal: u128) -> bool {
        self.begin <= ordinal && ordinal <= self.end
    }

    /// Number of addresses minus one (`end - begin`); a full `/0` does not fit in `u128` otherwise.
    pub fn span(&self) -> u128 {
        self.end - self.begin
    }
}

/// Largest prefix accepted for IPv6 networks.
const MAX_IPV6_PREFIX: u8 = 127;
const MAX_IPV4_PREFIX: u8 = 32;
/// Bits added to an IPv4 prefix once the address is mapped into IPv6 space.
const MAPPED_PREFIX_OFFSET: u32 = 96;

/// Expands `address/prefix` into the inclusive range it denotes.
///
/// `begin` is the parsed address as given (host bits are not masked off) and
/// `end = begin + 2^(128 - prefix') - 1`, where `prefix'` is the prefix plus 96
/// for IPv4 input.
///
/// # Errors
///
/// Returns [`AddressError::InvalidCidr`] for empty text, a missing or
/// non-numeric prefix, a prefix outside 0-32 (IPv4) or 0-127 (IPv6), or a
/// range running past the top of the address space.
pub fn parse_cidr(text: &str) -> Result<AddressRange, AddressError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AddressError::cidr(trimmed, "empty network"));
    }

    let (address, prefix) = trimmed
        .split_once('/')
        .ok_or_else(|| AddressError::cidr(trimmed, "missing prefix length"))?;
    if prefix.contains('/') {
        return Err(AddressError::cidr(trimmed, "more than one '/'"));
    }

    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::cidr(
            trimmed,
            format!("invalid prefix length '{}'", prefix),
        ));
    }
    let prefix: u8 = prefix
        .parse()
        .map_err(|_| AddressError::cidr(trimmed, format!("invalid prefix length '{}'", prefix)))?;

    let parsed = parse_address(address)
        .map_err(|_| AddressError::cidr(trimmed, format!("invalid address '{}'", address)))?;

    let max_prefix = if parsed.was_mapped {
        MAX_IPV4_PREFIX
    } else {
        MAX_IPV6_PREFIX
    };
    if prefix > max_prefix {
        return Err(AddressError::cidr(
            trimmed,
            format!("prefix length {} out of range 0-{}", prefix, max_prefix),
        ));
    }

    let effective = if parsed.was_mapped {
        u32::from(prefix) + MAPPED_PREFIX_OFFSET
    } else {
        u32::from(prefix)
    };
    // 2^(128 - effective) - 1; checked_shr handles effective == 128 (IPv4 /32).
    let host_span = u128::MAX.checked_shr(effective).unwrap_or(0);

    let end = parsed
        .ordinal
        .checked_add(host_span)
        .ok_or_else(|| AddressError::cidr(trimmed, "range exceeds the address space"))?;

    Ok(AddressRange::new(parsed.ordinal, end))
}

/// Returns `true` if [`parse_cidr`] would succeed.
pub fn is_valid_cidr(text: &str) -> bool {
    parse_cidr(text).is_ok()
}
