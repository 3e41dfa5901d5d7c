//! Textual entries accepted by entries files and the CLI
//!
//! An entry is either a CIDR block (`10.0.0.0/8`, or a bare address meaning
//! /32) or an inclusive address range (`10.0.0.1-10.0.0.9`).

use crate::cidr::CidrBlock;
use crate::codec::{format_ipv4, parse_ipv4};
use crate::error::SubnetTreeError;
use crate::range::{decompose, CidrBlocks};
use std::fmt;
use std::str::FromStr;

/// A CIDR block or an inclusive address range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Single prefix
    Prefix(CidrBlock),
    /// Inclusive `[start, end]` range
    Range {
        /// First address
        start: u32,
        /// Last address
        end: u32,
    },
}

impl Entry {
    /// The aligned blocks this entry covers
    pub fn blocks(&self) -> CidrBlocks {
        match *self {
            Entry::Prefix(block) => decompose(block.first(), block.last()),
            Entry::Range { start, end } => decompose(start, end),
        }
    }
}

impl FromStr for Entry {
    type Err = SubnetTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SubnetTreeError::InvalidEntry("empty entry".to_string()));
        }

        match s.split_once('-') {
            Some((start, end)) => {
                let start = parse_ipv4(start.trim())?;
                let end = parse_ipv4(end.trim())?;
                if end < start {
                    return Err(SubnetTreeError::InvalidEntry(format!(
                        "range end {} precedes start {}",
                        format_ipv4(end),
                        format_ipv4(start)
                    )));
                }
                Ok(Entry::Range { start, end })
            }
            None => Ok(Entry::Prefix(s.parse()?)),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Prefix(block) => write!(f, "{}", block),
            Entry::Range { start, end } => {
                write!(f, "{}-{}", format_ipv4(*start), format_ipv4(*end))
            }
        }
    }
}
