//! Error types for the registry and the step driver.

use std::error::Error;
use std::fmt;

use particula_arena::ConfigError;

/// Errors from the particle type registry and state configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum StateError {
    /// A particle type was requested with a schema different from the one
    /// it was created with.
    SchemaConflict {
        /// The particle type name.
        name: String,
    },
    /// The block configuration is invalid.
    Config(ConfigError),
    /// The configured start time is NaN or infinite.
    InvalidStartTime {
        /// The rejected start time.
        start_time: f32,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaConflict { name } => {
                write!(f, "particle type '{name}' already exists with a different schema")
            }
            Self::Config(e) => write!(f, "invalid block config: {e}"),
            Self::InvalidStartTime { start_time } => {
                write!(f, "start time {start_time} is not finite")
            }
        }
    }
}

impl Error for StateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::SchemaConflict { .. } | Self::InvalidStartTime { .. } => None,
        }
    }
}

impl From<ConfigError> for StateError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Errors returned by a [`Simulator`](crate::Simulator).
#[derive(Clone, Debug, PartialEq)]
pub enum SimulatorError {
    /// The simulator could not complete the step.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A registry operation failed while simulating.
    State(StateError),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::State(e) => write!(f, "{e}"),
        }
    }
}

impl Error for SimulatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::State(e) => Some(e),
            Self::ExecutionFailed { .. } => None,
        }
    }
}

impl From<StateError> for SimulatorError {
    fn from(e: StateError) -> Self {
        Self::State(e)
    }
}

/// Errors from [`simulate_step`](crate::simulate_step).
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// The time step was negative, NaN or infinite.
    InvalidTimeStep {
        /// The rejected time step.
        dt: f32,
    },
    /// The simulator failed; simulation time was not advanced.
    SimulatorFailed {
        /// Name of the failing simulator.
        name: String,
        /// The underlying simulator error.
        reason: SimulatorError,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimeStep { dt } => {
                write!(f, "time step {dt} is not a finite non-negative number")
            }
            Self::SimulatorFailed { name, reason } => {
                write!(f, "simulator '{name}' failed: {reason}")
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SimulatorFailed { reason, .. } => Some(reason),
            Self::InvalidTimeStep { .. } => None,
        }
    }
}
