//! Simulation state configuration.

use particula_arena::BlockConfig;

use crate::error::StateError;

/// Configuration for a [`SimulationState`](crate::SimulationState).
#[derive(Clone, Debug, PartialEq)]
pub struct StateConfig {
    /// Block layout used for every particle type.
    pub blocks: BlockConfig,
    /// Simulation time the state starts at. Default: 0.0.
    pub start_time: f32,
}

impl StateConfig {
    /// Default simulation start time.
    pub const DEFAULT_START_TIME: f32 = 0.0;

    /// Config with the given block capacity and default start time.
    pub fn with_block_capacity(block_capacity: usize) -> Self {
        Self {
            blocks: BlockConfig::new(block_capacity),
            start_time: Self::DEFAULT_START_TIME,
        }
    }

    /// Check the structural invariants.
    ///
    /// # Errors
    ///
    /// [`StateError::Config`] for an invalid block layout,
    /// [`StateError::InvalidStartTime`] if `start_time` is NaN or infinite.
    pub fn validate(&self) -> Result<(), StateError> {
        self.blocks.validate()?;
        if !self.start_time.is_finite() {
            return Err(StateError::InvalidStartTime {
                start_time: self.start_time,
            });
        }
        Ok(())
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            blocks: BlockConfig::default(),
            start_time: Self::DEFAULT_START_TIME,
        }
    }
}
