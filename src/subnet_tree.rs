//! Subnet index: prefix trie plus default value and writer exclusion
//!
//! [`SubnetIndex`] is the public face of the crate. Inserts accept CIDR text
//! or an address range and are serialized by a writer mutex held for one trie
//! insertion at a time. Lookups take no lock at all and fall back to the
//! configured default when no prefix covers the address.
//!
//! A range insert is applied block by block, so a concurrent reader may see
//! some blocks of the range before others. A failure never happens halfway
//! through a range: both endpoints are parsed before the first block is
//! written.

use crate::cidr::{prefix_mask, CidrBlock};
use crate::codec::{format_ipv4, parse_cidr, parse_ipv4};
use crate::entry::Entry;
use crate::error::{Result, SubnetTreeError};
use crate::range::decompose;
use crate::trie::PrefixTrie;
use crossbeam_epoch::{self as epoch, Atomic, Owned};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::atomic::Ordering;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, trace};

/// Longest matching prefix for a looked-up address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch<V> {
    /// The stored block that matched
    pub block: CidrBlock,
    /// Value bound to that block
    pub value: V,
}

/// Size statistics for an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Trie nodes materialized, including the root
    pub nodes: usize,
    /// Distinct prefixes holding a value
    pub prefixes: usize,
}

/// Concurrent longest-prefix-match index of IPv4 subnets
///
/// # Example
///
/// ```
/// use subnettree::SubnetIndex;
///
/// let index = SubnetIndex::with_default("Unknown");
/// index.insert("8.8.8.0/24", "Google")?;
/// index.insert_range("127.0.0.0", "127.255.255.255", "localhost")?;
/// index.insert("77.219.59.9", "WAP")?;
///
/// assert_eq!(index.lookup("8.8.8.8")?, Some("Google"));
/// assert_eq!(index.lookup("127.0.0.1")?, Some("localhost"));
/// assert_eq!(index.lookup("77.219.59.9")?, Some("WAP"));
/// assert_eq!(index.lookup("10.0.0.1")?, Some("Unknown"));
/// # Ok::<(), subnettree::SubnetTreeError>(())
/// ```
pub struct SubnetIndex<V> {
    trie: PrefixTrie<V>,
    /// Fallback for uncovered addresses. Swapped atomically but not ordered
    /// against inserts: concurrent readers see the old or the new default.
    default_value: Atomic<V>,
    /// Held for exactly one trie insertion
    writer: Mutex<()>,
}

impl<V> SubnetIndex<V> {
    /// Create an empty index with no default value
    pub fn new() -> Self {
        Self {
            trie: PrefixTrie::new(),
            default_value: Atomic::null(),
            writer: Mutex::new(()),
        }
    }

    /// Create an empty index that answers `default` for uncovered addresses
    pub fn with_default(default: V) -> Self {
        Self {
            trie: PrefixTrie::new(),
            default_value: Atomic::new(default),
            writer: Mutex::new(()),
        }
    }

    /// Node and prefix counts
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            nodes: self.trie.node_count(),
            prefixes: self.trie.prefix_count(),
        }
    }

    /// True if no prefix has been inserted
    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }
}

impl<V: Clone + Send + Sync + 'static> SubnetIndex<V> {
    /// Insert a value for "address[/prefix]" text
    ///
    /// A bare address is treated as a /32. Fails with
    /// [`SubnetTreeError::NullValue`] when `value` is `None`, and with
    /// `InvalidAddress` / `InvalidPrefixLength` on malformed text.
    pub fn insert(&self, cidr: &str, value: impl Into<Option<V>>) -> Result<()> {
        let value = value.into().ok_or(SubnetTreeError::NullValue)?;
        let (key, prefix_len) = parse_cidr(cidr)?;
        self.insert_prefix(key, prefix_len, value)
    }

    /// Insert a value for every address in the inclusive text range
    ///
    /// Returns the number of CIDR blocks written; a reversed range writes
    /// nothing.
    pub fn insert_range(
        &self,
        start: &str,
        end: &str,
        value: impl Into<Option<V>>,
    ) -> Result<usize> {
        let value = value.into().ok_or(SubnetTreeError::NullValue)?;
        let start = parse_ipv4(start)?;
        let end = parse_ipv4(end)?;
        Ok(self.insert_key_range(start, end, value))
    }

    /// Insert a value for a parsed [`Entry`], returning the blocks written
    pub fn insert_entry(&self, entry: &Entry, value: impl Into<Option<V>>) -> Result<usize> {
        let value = value.into().ok_or(SubnetTreeError::NullValue)?;
        match *entry {
            Entry::Prefix(block) => {
                self.insert_prefix(block.network, block.prefix_len, value)?;
                Ok(1)
            }
            Entry::Range { start, end } => Ok(self.insert_key_range(start, end, value)),
        }
    }

    /// Insert a value for the top `prefix_len` bits of `key`
    pub fn insert_prefix(&self, key: u32, prefix_len: u8, value: V) -> Result<()> {
        if prefix_len > 32 {
            return Err(SubnetTreeError::InvalidPrefixLength(prefix_len.to_string()));
        }

        self.insert_block(key, prefix_len, value);
        Ok(())
    }

    /// Insert a value for the inclusive key range, one locked insert per block
    pub fn insert_key_range(&self, start: u32, end: u32, value: V) -> usize {
        let mut blocks = 0;
        for block in decompose(start, end) {
            self.insert_block(block.network, block.prefix_len, value.clone());
            blocks += 1;
        }
        debug!(
            start = %format_ipv4(start),
            end = %format_ipv4(end),
            blocks,
            "inserted range"
        );
        blocks
    }

    /// One trie insertion under the writer lock
    fn insert_block(&self, key: u32, prefix_len: u8, value: V) {
        let replaced = {
            let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            self.trie.insert(key, prefix_len, value)
        };
        trace!(
            key = %format_ipv4(key),
            prefix_len,
            replaced,
            "inserted prefix"
        );
    }

    /// Replace (or with `None`, clear) the default value
    pub fn set_default_value(&self, value: impl Into<Option<V>>) {
        let guard = &epoch::pin();
        let old = match value.into() {
            Some(value) => self
                .default_value
                .swap(Owned::new(value), Ordering::AcqRel, guard),
            None => self
                .default_value
                .swap(epoch::Shared::null(), Ordering::AcqRel, guard),
        };
        if !old.is_null() {
            // SAFETY: unreachable after the swap; retired through the epoch.
            unsafe { guard.defer_destroy(old) };
        }
        debug!("default value replaced");
    }
}

impl<V: Clone> SubnetIndex<V> {
    /// Current default value
    pub fn default_value(&self) -> Option<V> {
        let guard = &epoch::pin();
        // SAFETY: displaced defaults are retired through the epoch.
        unsafe { self.default_value.load(Ordering::Acquire, guard).as_ref() }.cloned()
    }

    /// Value for dotted-quad `address`, or the default if nothing covers it
    pub fn lookup(&self, address: &str) -> Result<Option<V>> {
        let key = parse_ipv4(address)?;
        Ok(self.lookup_key(key))
    }

    /// Value for a parsed address, or the default if nothing covers it
    pub fn lookup_addr(&self, address: Ipv4Addr) -> Option<V> {
        self.lookup_key(u32::from(address))
    }

    /// Value for a 32-bit key, or the default if nothing covers it
    pub fn lookup_key(&self, key: u32) -> Option<V> {
        self.trie.lookup(key).or_else(|| self.default_value())
    }

    /// Longest stored prefix covering `address`, ignoring the default
    pub fn lookup_match(&self, address: &str) -> Result<Option<PrefixMatch<V>>> {
        let key = parse_ipv4(address)?;
        Ok(self.lookup_key_match(key))
    }

    /// Longest stored prefix covering `key`, ignoring the default
    pub fn lookup_key_match(&self, key: u32) -> Option<PrefixMatch<V>> {
        self.trie.lookup_match(key).map(|(prefix_len, value)| PrefixMatch {
            block: CidrBlock {
                network: key & prefix_mask(prefix_len),
                prefix_len,
            },
            value,
        })
    }

    /// Every stored prefix with its value, in address order
    pub fn entries(&self) -> Vec<(CidrBlock, V)> {
        self.trie.entries()
    }
}

impl<V> Drop for SubnetIndex<V> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` excludes readers of the default slot.
        unsafe {
            let guard = epoch::unprotected();
            let value = self.default_value.load(Ordering::Relaxed, guard);
            if !value.is_null() {
                drop(value.into_owned());
            }
        }
    }
}

impl<V> Default for SubnetIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for SubnetIndex<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubnetIndex")
            .field("trie", &self.trie)
            .finish_non_exhaustive()
    }
}
