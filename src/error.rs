/// Error types for the subnettree library
use std::fmt;

/// Result type alias for subnet tree operations
pub type Result<T> = std::result::Result<T, SubnetTreeError>;

/// Main error type for subnet tree operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubnetTreeError {
    /// Malformed dotted-quad address text
    InvalidAddress(String),

    /// Prefix length that is not a decimal integer in 0..=32
    InvalidPrefixLength(String),

    /// Insert attempted without a value
    NullValue,

    /// Entry text that is neither a CIDR block nor an address range
    InvalidEntry(String),
}

impl fmt::Display for SubnetTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetTreeError::InvalidAddress(text) => {
                write!(f, "Invalid address: could not parse [{}]", text)
            }
            SubnetTreeError::InvalidPrefixLength(text) => {
                write!(f, "Invalid prefix length: [{}] (expected 0-32)", text)
            }
            SubnetTreeError::NullValue => write!(f, "Value cannot be null"),
            SubnetTreeError::InvalidEntry(msg) => write!(f, "Invalid entry: {}", msg),
        }
    }
}

impl std::error::Error for SubnetTreeError {}
