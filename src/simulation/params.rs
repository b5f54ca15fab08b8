use glam::Vec2;

use crate::error::ConfigError;
use crate::simulation::types::SimulationUniforms;

/// Configuration fixed for the lifetime of one initialized particle set.
///
/// Positions, radii and velocities share one unit (window coordinates in the
/// demo, where the visible area spans [-1, 1] on both axes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParameters {
    capacity: u32,
    max_emitted_per_frame: u32,
    emitter_center: Vec2,
    radius_sqr: f32,
    min_velocity: f32,
    velocity_delta: f32,
}

impl SimulationParameters {
    /// Validates the raw init arguments. Nothing is allocated here, so a
    /// rejected configuration leaves nothing behind.
    pub fn new(
        capacity: u32,
        max_emitted_per_frame: u32,
        emitter_center: Vec2,
        kill_radius: f32,
        min_velocity: f32,
        max_velocity: f32,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !emitter_center.is_finite() {
            return Err(ConfigError::InvalidEmitterCenter(emitter_center.to_array()));
        }
        if !kill_radius.is_finite() || kill_radius < 0.0 {
            return Err(ConfigError::InvalidKillRadius(kill_radius));
        }
        if !min_velocity.is_finite() || min_velocity < 0.0 {
            return Err(ConfigError::InvalidMinVelocity(min_velocity));
        }
        if !max_velocity.is_finite() || max_velocity < min_velocity {
            return Err(ConfigError::InvalidMaxVelocity {
                min: min_velocity,
                max: max_velocity,
            });
        }

        Ok(Self {
            capacity,
            max_emitted_per_frame,
            emitter_center,
            // Only the squared radius is used during update
            radius_sqr: kill_radius * kill_radius,
            min_velocity,
            velocity_delta: max_velocity - min_velocity,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn max_emitted_per_frame(&self) -> u32 {
        self.max_emitted_per_frame
    }

    pub fn emitter_center(&self) -> Vec2 {
        self.emitter_center
    }

    pub fn radius_sqr(&self) -> f32 {
        self.radius_sqr
    }

    pub fn min_velocity(&self) -> f32 {
        self.min_velocity
    }

    pub fn velocity_delta(&self) -> f32 {
        self.velocity_delta
    }

    pub fn max_velocity(&self) -> f32 {
        self.min_velocity + self.velocity_delta
    }

    pub(crate) fn uniforms(&self) -> SimulationUniforms {
        SimulationUniforms {
            emitter_center: self.emitter_center.to_array(),
            radius_sqr: self.radius_sqr,
            min_velocity: self.min_velocity,
            velocity_delta: self.velocity_delta,
            max_emitted_per_frame: self.max_emitted_per_frame,
            max_particle_count: self.capacity,
            delta_time_sec: 0.0,
            frame_seed: 0,
            _padding: [0; 3],
        }
    }
}
