//! Spawning of fresh particles on the emission disc.
//!
//! `update.wgsl` carries the GPU copy of this procedure; the two must stay in
//! step (same modulus, same spawn radius, same zero-vector handling).

use glam::Vec2;
use rand::Rng;

use crate::simulation::params::SimulationParameters;
use crate::simulation::types::{
    DIRECTION_MODULUS, MAX_DIRECTION_ATTEMPTS, Particle, SPAWN_REGION_RADIUS,
};

/// Random unit direction built from two signed integer draws.
///
/// Each draw is reduced modulo 100 so neither axis dominates. When both draws
/// reduce to zero the pair is redrawn; after `MAX_DIRECTION_ATTEMPTS` failed
/// attempts the unit x-axis is returned.
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    for _ in 0..MAX_DIRECTION_ATTEMPTS {
        let x = (rng.r#gen::<i32>() % DIRECTION_MODULUS) as f32;
        let y = (rng.r#gen::<i32>() % DIRECTION_MODULUS) as f32;
        if let Some(direction) = Vec2::new(x, y).try_normalize() {
            return direction;
        }
    }
    Vec2::X
}

/// New velocity with a random direction and a magnitude in `[min, min + delta)`.
pub fn new_velocity<R: Rng + ?Sized>(params: &SimulationParameters, rng: &mut R) -> Vec2 {
    let direction = random_direction(rng);
    let magnitude = params.min_velocity() + rng.r#gen::<f32>() * params.velocity_delta();
    direction * magnitude
}

/// Moves `particle` to a random point of the spawn disc and gives it a new velocity.
///
/// The active flag is left alone; the caller decides liveness.
pub fn reset_particle<R: Rng + ?Sized>(
    particle: &mut Particle,
    params: &SimulationParameters,
    rng: &mut R,
) {
    let direction = random_direction(rng);
    let offset = rng.r#gen::<f32>() * SPAWN_REGION_RADIUS;
    particle.set_position(params.emitter_center() + direction * offset);
    particle.set_velocity(new_velocity(params, rng));
}

/// A freshly emitted, active particle.
pub fn spawn_particle<R: Rng + ?Sized>(params: &SimulationParameters, rng: &mut R) -> Particle {
    let mut particle = Particle::new(Vec2::ZERO, Vec2::ZERO, true);
    reset_particle(&mut particle, params, rng);
    particle
}
