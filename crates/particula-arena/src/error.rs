//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors from validating a [`BlockConfig`](crate::BlockConfig).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Block capacity must be a non-zero power of two.
    CapacityNotPowerOfTwo {
        /// The rejected capacity.
        capacity: usize,
    },
    /// Block capacity exceeds the supported maximum.
    CapacityTooLarge {
        /// The rejected capacity.
        capacity: usize,
        /// The largest supported capacity.
        max: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityNotPowerOfTwo { capacity } => {
                write!(f, "block capacity {capacity} is not a non-zero power of two")
            }
            Self::CapacityTooLarge { capacity, max } => {
                write!(f, "block capacity {capacity} exceeds maximum {max}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Errors from copying attribute data between blocks and flat buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlattenError {
    /// The flat buffer does not hold exactly one element per live particle.
    SizeMismatch {
        /// Attribute being copied.
        attribute: String,
        /// Required buffer length in bytes.
        expected: usize,
        /// Provided buffer length in bytes.
        actual: usize,
    },
}

impl fmt::Display for FlattenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch {
                attribute,
                expected,
                actual,
            } => write!(
                f,
                "size mismatch for attribute '{attribute}': expected {expected} bytes, got {actual}"
            ),
        }
    }
}

impl Error for FlattenError {}
