//! Particle type registry and simulation stepping for Particula.
//!
//! A [`SimulationState`] owns a [`ParticlesState`] registry (one
//! [`BlockContainer`](particula_arena::BlockContainer) per particle type)
//! and a [`SimulationTime`] clock. External code advances it with
//! [`simulate_step`], handing in a [`Simulator`] that does the actual
//! particle work for the step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod registry;
pub mod simulation;
pub mod time;

pub use config::StateConfig;
pub use error::{SimulatorError, StateError, StepError};
pub use registry::ParticlesState;
pub use simulation::{simulate_step, SimulationState, Simulator, StepReport, TypeStats};
pub use time::{SimulationTime, TimeSpan};
