//! Range to CIDR decomposition
//!
//! Splits an inclusive address range `[start, end]` into the ordered list of
//! aligned CIDR blocks whose union is exactly that range. Each step takes the
//! largest block that both starts aligned at the current address and stays
//! inside the remaining range:
//!
//! ```text
//! 10.0.0.1 - 10.0.0.10
//!   10.0.0.1/32   (start has no trailing zeros)
//!   10.0.0.2/31
//!   10.0.0.4/30
//!   10.0.0.8/31   (a /30 would overrun 10.0.0.10)
//!   10.0.0.10/32
//! ```

use crate::cidr::CidrBlock;
use std::iter::FusedIterator;

/// Decompose the inclusive range `[start, end]` into CIDR blocks
///
/// Returns an empty sequence when `end < start`. A single address yields
/// exactly one /32 block, and the full space yields one /0 block.
///
/// # Example
///
/// ```
/// use subnettree::range::decompose;
///
/// let blocks: Vec<String> = decompose(0x7F00_0000, 0x7FFF_FFFF)
///     .map(|b| b.to_string())
///     .collect();
/// assert_eq!(blocks, vec!["127.0.0.0/8"]);
/// ```
pub fn decompose(start: u32, end: u32) -> CidrBlocks {
    CidrBlocks {
        next: u64::from(start),
        end: u64::from(end),
    }
}

/// Iterator over the blocks of a decomposed range
///
/// Positions are tracked in 64 bits so stepping past `255.255.255.255`
/// simply ends the sequence.
#[derive(Debug, Clone)]
pub struct CidrBlocks {
    next: u64,
    end: u64,
}

/// Longest prefix whose block may start at `start` (32 minus trailing zeros)
fn alignment_limit(start: u32) -> u32 {
    32 - start.trailing_zeros()
}

/// Shortest prefix whose block fits in `span` addresses
fn size_limit(span: u64) -> u32 {
    debug_assert!(span >= 1 && span <= 1u64 << 32);
    let log2 = 63 - span.leading_zeros();
    32 - log2
}

impl Iterator for CidrBlocks {
    type Item = CidrBlock;

    fn next(&mut self) -> Option<CidrBlock> {
        if self.next > self.end {
            return None;
        }

        let start = self.next as u32;
        let span = self.end - self.next + 1;
        let prefix_len = alignment_limit(start).max(size_limit(span));

        self.next += 1u64 << (32 - prefix_len);

        Some(CidrBlock {
            network: start,
            prefix_len: prefix_len as u8,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.next > self.end {
            (0, Some(0))
        } else {
            // Each side of the range contributes at most one block per bit
            (1, Some(64))
        }
    }
}

impl FusedIterator for CidrBlocks {}
