//! Dotted-quad address codec
//!
//! Converts between the textual IPv4 form and the 32-bit keys stored in the
//! trie. Parsing accepts the classic partial forms as well:
//!
//! ```text
//! "10.1.2.3"  -> 0x0A010203
//! "10.1.515"  -> 0x0A010203   (last group fills the low 16 bits)
//! "10.66051"  -> 0x0A010203   (last group fills the low 24 bits)
//! "167838211" -> 0x0A010203   (single group fills all 32 bits)
//! ```

use crate::error::{Result, SubnetTreeError};

/// Longest accepted address text ("255.255.255.255")
const MAX_ADDRESS_LEN: usize = 15;

/// Parse dotted-quad text into its four network-order octets
///
/// Fails with [`SubnetTreeError::InvalidAddress`] on empty input, input
/// longer than 15 characters, any character other than an ASCII digit or
/// `.`, more than four groups, or a group too large for the bits it covers.
pub fn parse_ipv4_octets(text: &str) -> Result<[u8; 4]> {
    let invalid = || SubnetTreeError::InvalidAddress(text.to_string());

    if text.is_empty() || text.len() > MAX_ADDRESS_LEN {
        return Err(invalid());
    }

    let mut octets = [0u8; 4];
    let mut group = 0usize;
    let mut acc = 0u64;

    for c in text.chars() {
        if c == '.' {
            if acc > 255 || group == 3 {
                return Err(invalid());
            }
            octets[group] = acc as u8;
            group += 1;
            acc = 0;
        } else {
            let digit = c.to_digit(10).ok_or_else(invalid)?;
            // At most 15 digits, so this never overflows a u64
            acc = acc * 10 + u64::from(digit);
        }
    }

    // The trailing group spans every octet not yet filled
    let remaining_bits = (4 - group) * 8;
    if acc >= 1u64 << remaining_bits {
        return Err(invalid());
    }

    for (i, octet) in octets.iter_mut().enumerate().skip(group) {
        let shift = (3 - i) * 8;
        *octet = ((acc >> shift) & 0xFF) as u8;
    }

    Ok(octets)
}

/// Parse dotted-quad text into a 32-bit key
pub fn parse_ipv4(text: &str) -> Result<u32> {
    parse_ipv4_octets(text).map(u32::from_be_bytes)
}

/// Format a 32-bit key as four dot-separated decimal octets
pub fn format_ipv4(key: u32) -> String {
    let [a, b, c, d] = key.to_be_bytes();
    format!("{}.{}.{}.{}", a, b, c, d)
}

/// Parse a decimal prefix length in 0..=32
pub fn parse_prefix_length(text: &str) -> Result<u8> {
    match text.parse::<u8>() {
        Ok(len) if len <= 32 => Ok(len),
        _ => Err(SubnetTreeError::InvalidPrefixLength(text.to_string())),
    }
}

/// Split "address[/prefix]" into a key and prefix length
///
/// A missing `/prefix` means a single host (/32).
pub fn parse_cidr(text: &str) -> Result<(u32, u8)> {
    match text.split_once('/') {
        Some((addr, prefix)) => {
            let key = parse_ipv4(addr)?;
            let prefix_len = parse_prefix_length(prefix)?;
            Ok((key, prefix_len))
        }
        None => Ok((parse_ipv4(text)?, 32)),
    }
}
