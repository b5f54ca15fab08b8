//! Host-side particle model: the record layout, configuration, and the
//! reference implementation of the per-particle update.

pub mod emission;
pub mod layout;
pub mod params;
pub mod particle_set;
pub mod reset;
pub mod types;

pub use emission::{EmissionQuota, is_out_of_bounds};
pub use layout::{ParticleField, ParticleLayout};
pub use params::SimulationParameters;
pub use particle_set::{ParticleSet, StepReport, Transition, step_particle};
pub use reset::{new_velocity, random_direction, reset_particle, spawn_particle};
pub use types::{MAX_DIRECTION_ATTEMPTS, Particle, SPAWN_REGION_RADIUS, WORKGROUP_SIZE};
