//! Subnettree - Concurrent IPv4 Longest-Prefix Matching
//!
//! Subnettree maps CIDR blocks and arbitrary address ranges to values and
//! answers "which value applies to this address" with a single walk of at
//! most 32 trie nodes. Typical uses are tagging addresses with an owner,
//! network name, or policy without scanning a list per query.
//!
//! # Quick Start
//!
//! ```rust
//! use subnettree::SubnetIndex;
//!
//! let index = SubnetIndex::with_default("X");
//!
//! index.insert("127.0.0.0/8", "A")?;
//! index.insert_range("127.0.0.0", "127.0.0.255", "B")?;
//! index.insert("127.0.0.5/32", "C")?;
//!
//! assert_eq!(index.lookup("127.1.2.3")?, Some("A"));
//! assert_eq!(index.lookup("127.0.0.1")?, Some("B"));
//! assert_eq!(index.lookup("127.0.0.5")?, Some("C"));
//! assert_eq!(index.lookup("126.0.0.1")?, Some("X"));
//! # Ok::<(), subnettree::SubnetTreeError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! insert("a.b.c.d/n") ──────────────┐
//!                                   ├─> writer mutex ─> PrefixTrie::insert
//! insert_range(start, end) ─> decompose ─┘   (one block per lock)
//!
//! lookup("a.b.c.d") ─> PrefixTrie::lookup (no lock) ─> value or default
//! ```
//!
//! Readers never block: trie nodes are published with release/acquire
//! atomics and displaced values are reclaimed through `crossbeam-epoch`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CIDR block value type
pub mod cidr;
/// Dotted-quad parsing and formatting
pub mod codec;
pub mod entry;
/// Error types for subnet tree operations
pub mod error;
pub mod file_reader;
pub mod range;
/// Thread-safe subnet index
pub mod subnet_tree;
pub mod trie;

// Re-exports for Rust consumers

pub use crate::cidr::CidrBlock;
pub use crate::entry::Entry;
pub use crate::error::SubnetTreeError;
pub use crate::range::decompose;
pub use crate::subnet_tree::{PrefixMatch, SubnetIndex, TreeStats};
pub use crate::trie::PrefixTrie;

// Version information
/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
