//! Simulation state and the per-step driver.
//!
//! [`SimulationState`] owns the particle registry and the clock. A
//! [`Simulator`] mutates it once per step; [`simulate_step`] wraps that call
//! in a time update and reports per-type statistics afterwards.

use smallvec::SmallVec;

use crate::config::StateConfig;
use crate::error::{SimulatorError, StateError, StepError};
use crate::registry::ParticlesState;
use crate::time::{SimulationTime, TimeSpan};

// ── SimulationState ──────────────────────────────────────────────

/// Everything a simulation owns between steps.
///
/// Dropping the state releases every container and block.
#[derive(Default)]
pub struct SimulationState {
    particles: ParticlesState,
    time: SimulationTime,
}

impl SimulationState {
    /// Create an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns the [`StateError`] if `config` is invalid.
    pub fn new(config: StateConfig) -> Result<Self, StateError> {
        config.validate()?;
        Ok(Self {
            particles: ParticlesState::new(config.blocks)?,
            time: SimulationTime::new(config.start_time),
        })
    }

    /// The particle registry.
    pub fn particles(&self) -> &ParticlesState {
        &self.particles
    }

    /// The particle registry, mutably.
    pub fn particles_mut(&mut self) -> &mut ParticlesState {
        &mut self.particles
    }

    /// The simulation clock.
    ///
    /// Only [`simulate_step`] opens and closes updates.
    pub fn time(&self) -> &SimulationTime {
        &self.time
    }
}

// ── Simulator ────────────────────────────────────────────────────

/// Advances a [`SimulationState`] by one update.
///
/// Called by [`simulate_step`] while an update is open, so
/// [`SimulationTime::update_span`] is available for the step's interval.
pub trait Simulator: Send {
    /// Human-readable name, used in errors and logs.
    fn name(&self) -> &str;

    /// Mutate the state for the current update.
    ///
    /// # Errors
    ///
    /// Any [`SimulatorError`] aborts the step without advancing time.
    /// Particle changes made before the error are kept.
    fn simulate(&self, state: &mut SimulationState) -> Result<(), SimulatorError>;
}

// ── StepReport ───────────────────────────────────────────────────

/// Statistics of one particle type after a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeStats {
    /// Particle type name.
    pub name: String,
    /// Live particles.
    pub particles: usize,
    /// Blocks holding at least one live particle.
    pub active_blocks: usize,
}

/// Result of a successful [`simulate_step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Number of completed steps, this one included.
    pub step: u64,
    /// Interval the step covered.
    pub span: TimeSpan,
    /// Per-type statistics, in registry order.
    pub types: SmallVec<[TypeStats; 4]>,
}

impl StepReport {
    /// Statistics of type `name`, if it exists.
    pub fn get(&self, name: &str) -> Option<&TypeStats> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Live particles across all types.
    pub fn total_particles(&self) -> usize {
        self.types.iter().map(|t| t.particles).sum()
    }
}

/// Advance `state` by `dt` using `simulator`.
///
/// # Errors
///
/// [`StepError::InvalidTimeStep`] if `dt` is negative or not finite (the
/// state is untouched), [`StepError::SimulatorFailed`] if the simulator
/// fails (the update is abandoned and time is not advanced).
pub fn simulate_step(
    state: &mut SimulationState,
    simulator: &dyn Simulator,
    dt: f32,
) -> Result<StepReport, StepError> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(StepError::InvalidTimeStep { dt });
    }

    state.time.start_update(dt);
    let span = state.time.update_span();
    if let Err(reason) = simulator.simulate(state) {
        state.time.abandon_update();
        tracing::warn!(simulator = simulator.name(), %reason, "step failed");
        return Err(StepError::SimulatorFailed {
            name: simulator.name().to_owned(),
            reason,
        });
    }
    state.time.end_update();

    let types: SmallVec<[TypeStats; 4]> = state
        .particles
        .iter()
        .map(|(name, container)| TypeStats {
            name: name.to_owned(),
            particles: container.count_active(),
            active_blocks: container.active_blocks().count(),
        })
        .collect();
    for t in &types {
        tracing::debug!(
            particle_type = %t.name,
            particles = t.particles,
            blocks = t.active_blocks,
            "particle system"
        );
    }

    Ok(StepReport {
        step: state.time.step_count(),
        span,
        types,
    })
}
