//! Block configuration parameters.

use crate::error::ConfigError;

/// Configuration for attribute blocks.
///
/// Validated before any container is built; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockConfig {
    /// Number of particle slots per block.
    ///
    /// Default: 1024. Must be a power of two and at most
    /// [`MAX_BLOCK_CAPACITY`](Self::MAX_BLOCK_CAPACITY).
    pub block_capacity: usize,
}

impl BlockConfig {
    /// Default slots per block.
    pub const DEFAULT_BLOCK_CAPACITY: usize = 1024;

    /// Largest supported slots per block (1M).
    pub const MAX_BLOCK_CAPACITY: usize = 1 << 20;

    /// Create a config with the given block capacity.
    pub fn new(block_capacity: usize) -> Self {
        Self { block_capacity }
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacity = self.block_capacity;
        if !capacity.is_power_of_two() {
            return Err(ConfigError::CapacityNotPowerOfTwo { capacity });
        }
        if capacity > Self::MAX_BLOCK_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                capacity,
                max: Self::MAX_BLOCK_CAPACITY,
            });
        }
        Ok(())
    }

    /// Number of blocks needed to hold `particles` particles.
    pub fn blocks_for(&self, particles: usize) -> usize {
        particles.div_ceil(self.block_capacity)
    }
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_CAPACITY)
    }
}
