//! CIDR block value type

use crate::codec::{format_ipv4, parse_cidr};
use crate::error::SubnetTreeError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Netmask with the top `prefix_len` bits set (0 matches everything)
///
/// `prefix_len` must be at most 32.
pub fn prefix_mask(prefix_len: u8) -> u32 {
    debug_assert!(prefix_len <= 32);
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len))
    }
}

/// An aligned block of addresses sharing the top `prefix_len` bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CidrBlock {
    /// First address of the block (host bits cleared)
    pub network: u32,
    /// Number of significant leading bits
    pub prefix_len: u8,
}

impl CidrBlock {
    /// Create a block, clearing any host bits of `key`
    pub fn new(key: u32, prefix_len: u8) -> Result<Self, SubnetTreeError> {
        if prefix_len > 32 {
            return Err(SubnetTreeError::InvalidPrefixLength(prefix_len.to_string()));
        }
        Ok(Self {
            network: key & prefix_mask(prefix_len),
            prefix_len,
        })
    }

    /// Netmask for this block
    pub fn mask(&self) -> u32 {
        prefix_mask(self.prefix_len)
    }

    /// First address in the block
    pub fn first(&self) -> u32 {
        self.network
    }

    /// Last address in the block
    pub fn last(&self) -> u32 {
        self.network | !self.mask()
    }

    /// Number of addresses covered (up to 2^32)
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }

    /// True if `key` falls inside this block
    pub fn contains(&self, key: u32) -> bool {
        key & self.mask() == self.network
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", format_ipv4(self.network), self.prefix_len)
    }
}

/// Serializes as "a.b.c.d/n"
impl Serialize for CidrBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for CidrBlock {
    type Err = SubnetTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, prefix_len) = parse_cidr(s)?;
        CidrBlock::new(key, prefix_len)
    }
}
