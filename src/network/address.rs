//! IP text to 128-bit ordinal conversion.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error_handling::AddressError;

/// High 96 bits of an IPv4-mapped IPv6 address (`::ffff:0:0/96`).
pub const IPV4_MAPPED_PREFIX: u128 = 0xffff_u128 << 32;

/// An address converted to its position in the IPv6 address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAddress {
    pub ordinal: u128,
    /// `true` when the input was IPv4 and got mapped into IPv6 space
    pub was_mapped: bool,
}

/// Parses IPv4 or IPv6 text into its ordinal.
///
/// IPv4 input is mapped to `::ffff:a.b.c.d`, so both families share one
/// ordinal space.
///
/// # Errors
///
/// Returns [`AddressError::InvalidAddress`] if the text is not an IP literal.
pub fn parse_address(text: &str) -> Result<ParsedAddress, AddressError> {
    let trimmed = text.trim();
    let ip: IpAddr = trimmed
        .parse()
        .map_err(|_| AddressError::InvalidAddress(trimmed.to_string()))?;
    Ok(ip_to_ordinal(ip))
}

/// Converts an already-parsed address.
pub fn ip_to_ordinal(ip: IpAddr) -> ParsedAddress {
    match ip {
        IpAddr::V4(v4) => ParsedAddress {
            ordinal: u128::from(v4.to_ipv6_mapped()),
            was_mapped: true,
        },
        IpAddr::V6(v6) => ParsedAddress {
            ordinal: u128::from(v6),
            was_mapped: false,
        },
    }
}

/// Converts an ordinal back to an address; mapped ordinals render as IPv4.
pub fn ordinal_to_ip(ordinal: u128) -> IpAddr {
    if ordinal >> 32 == IPV4_MAPPED_PREFIX >> 32 {
        IpAddr::V4(Ipv4Addr::from(ordinal as u32))
    } else {
        IpAddr::V6(Ipv6Addr::from(ordinal))
    }
}

/// Returns `true` if [`parse_address`] would succeed.
pub fn is_valid_address(text: &str) -> bool {
    text.trim().parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_is_mapped() {
        let parsed = parse_address("129.17.12.1").expect("valid IPv4");
        assert!(parsed.was_mapped);
        assert_eq!(
            parsed.ordinal,
            IPV4_MAPPED_PREFIX | u128::from(u32::from(Ipv4Addr::new(129, 17, 12, 1)))
        );
    }

    #[test]
    fn test_ipv6_is_not_mapped() {
        let parsed = parse_address("2001:db8::1").expect("valid IPv6");
        assert!(!parsed.was_mapped);
        assert_eq!(parsed.ordinal, 0x2001_0db8_0000_0000_0000_0000_0000_0001);
    }

    #[test]
    fn test_mapped_ipv6_literal_is_not_flagged() {
        // Same ordinal as the IPv4 form, but the text was already IPv6.
        let v6 = parse_address("::ffff:10.0.0.1").expect("valid IPv6");
        let v4 = parse_address("10.0.0.1").expect("valid IPv4");
        assert_eq!(v6.ordinal, v4.ordinal);
        assert!(!v6.was_mapped);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert!(parse_address(" 8.8.8.8\n").is_ok());
    }

    #[test]
    fn test_invalid_addresses() {
        for text in ["", "256.1.1.1", "1.2.3", "not-an-ip", "2001:db8:::1", "1.2.3.4/24"] {
            assert!(
                matches!(parse_address(text), Err(AddressError::InvalidAddress(_))),
                "{:?} should be rejected",
                text
            );
            assert!(!is_valid_address(text));
        }
    }

    #[test]
    fn test_ordinal_to_ip_inverts_parse() {
        for text in ["0.0.0.0", "203.0.113.7", "255.255.255.255", "::1", "2001:db8::42"] {
            let parsed = parse_address(text).expect("valid address");
            assert_eq!(ordinal_to_ip(parsed.ordinal).to_string(), text);
        }
    }

    #[test]
    fn test_extremes() {
        assert_eq!(parse_address("::").unwrap().ordinal, 0);
        assert_eq!(
            parse_address("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff")
                .unwrap()
                .ordinal,
            u128::MAX
        );
    }
}
