//! Reusable simulator test fixtures.
//!
//! - [`EmitterSimulator`]: spawns a fixed number of indexed particles per step.
//! - [`DriftSimulator`]: moves particles by `Velocity * dt`.
//! - [`CullSimulator`]: removes particles past an x threshold.
//! - [`FailingSimulator`]: fails deterministically after N calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use particula_core::names::{POSITION, VELOCITY};
use particula_core::{AttributeSchema, Float3};
use particula_state::{SimulationState, Simulator, SimulatorError};

use crate::spawn_indexed;

/// Spawns `per_step` particles of one type each step.
///
/// Particles are numbered across steps, so the n-th particle ever spawned
/// carries [`indexed_position(n)`](crate::indexed_position) and friends.
pub struct EmitterSimulator {
    pub particle_type: String,
    pub schema: Arc<AttributeSchema>,
    pub per_step: usize,
    spawned: AtomicUsize,
}

impl EmitterSimulator {
    pub fn new(
        particle_type: impl Into<String>,
        schema: Arc<AttributeSchema>,
        per_step: usize,
    ) -> Self {
        Self {
            particle_type: particle_type.into(),
            schema,
            per_step,
            spawned: AtomicUsize::new(0),
        }
    }

    /// Total particles spawned so far.
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl Simulator for EmitterSimulator {
    fn name(&self) -> &str {
        "emitter"
    }

    fn simulate(&self, state: &mut SimulationState) -> Result<(), SimulatorError> {
        let container = state
            .particles_mut()
            .lookup_or_create(&self.particle_type, &self.schema)?;
        let first = self.spawned.fetch_add(self.per_step, Ordering::Relaxed);
        spawn_indexed(container, self.per_step, first);
        Ok(())
    }
}

/// Adds `Velocity * dt` to `Position` for every particle of one type.
pub struct DriftSimulator {
    pub particle_type: String,
}

impl DriftSimulator {
    pub fn new(particle_type: impl Into<String>) -> Self {
        Self {
            particle_type: particle_type.into(),
        }
    }
}

impl Simulator for DriftSimulator {
    fn name(&self) -> &str {
        "drift"
    }

    fn simulate(&self, state: &mut SimulationState) -> Result<(), SimulatorError> {
        let dt = state.time().update_span().duration();
        let Some(container) = state.particles_mut().lookup_mut(&self.particle_type) else {
            return Ok(());
        };
        if !container.schema().contains(VELOCITY) {
            return Err(SimulatorError::ExecutionFailed {
                reason: format!("type '{}' has no {VELOCITY} attribute", self.particle_type),
            });
        }
        for block in container.active_blocks_mut() {
            let velocities = block.attribute::<Float3>(VELOCITY).to_vec();
            for (p, v) in block
                .attribute_mut::<Float3>(POSITION)
                .iter_mut()
                .zip(velocities)
            {
                *p += v * dt;
            }
        }
        Ok(())
    }
}

/// Removes particles of one type whose x position exceeds `max_x`.
pub struct CullSimulator {
    pub particle_type: String,
    pub max_x: f32,
}

impl CullSimulator {
    pub fn new(particle_type: impl Into<String>, max_x: f32) -> Self {
        Self {
            particle_type: particle_type.into(),
            max_x,
        }
    }
}

impl Simulator for CullSimulator {
    fn name(&self) -> &str {
        "cull"
    }

    fn simulate(&self, state: &mut SimulationState) -> Result<(), SimulatorError> {
        if let Some(container) = state.particles_mut().lookup_mut(&self.particle_type) {
            let max_x = self.max_x;
            container.retain::<Float3, _>(POSITION, |p| p.x <= max_x);
        }
        Ok(())
    }
}

/// Fails deterministically after a configurable number of successful calls.
///
/// Uses `AtomicUsize` for the call counter so it satisfies `Send`.
pub struct FailingSimulator {
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingSimulator {
    /// Create a simulator that succeeds `succeed_count` times then fails.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `simulate()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Simulator for FailingSimulator {
    fn name(&self) -> &str {
        "failing"
    }

    fn simulate(&self, _state: &mut SimulationState) -> Result<(), SimulatorError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(SimulatorError::ExecutionFailed {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(())
    }
}
