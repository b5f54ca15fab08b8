use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::simulation::emission::{EmissionQuota, is_out_of_bounds};
use crate::simulation::params::SimulationParameters;
use crate::simulation::reset::{reset_particle, spawn_particle};
use crate::simulation::types::Particle;

// Particles handled by one CPU worker in `ParticleSet::step`
const CPU_CHUNK_SIZE: usize = 4096;

/// What happened to a single particle during one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Out of bounds and granted a slot: respawned on the emission disc.
    Recycled,
    /// Out of bounds with the quota exhausted: frozen until a later frame.
    Deactivated,
    /// Active and in bounds: moved by `velocity * dt`.
    Integrated,
    /// Inactive and in bounds: left untouched.
    Frozen,
}

/// Per-step totals returned by `ParticleSet::step`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub recycled: u32,
    pub deactivated: u32,
    pub integrated: u32,
}

impl StepReport {
    fn record(&mut self, transition: Transition) {
        match transition {
            Transition::Recycled => self.recycled += 1,
            Transition::Deactivated => self.deactivated += 1,
            Transition::Integrated => self.integrated += 1,
            Transition::Frozen => {}
        }
    }

    fn merge(mut self, other: StepReport) -> StepReport {
        self.recycled += other.recycled;
        self.deactivated += other.deactivated;
        self.integrated += other.integrated;
        self
    }
}

/// Advances one particle by one step. This is the CPU twin of `update_particles` in update.wgsl.
pub fn step_particle<R: Rng + ?Sized>(
    particle: &mut Particle,
    params: &SimulationParameters,
    quota: &EmissionQuota,
    delta_time_sec: f32,
    rng: &mut R,
) -> Transition {
    // Inactive particles are checked too, that is how they get their turn in a later frame
    if is_out_of_bounds(particle.position(), params.emitter_center(), params.radius_sqr()) {
        if quota.try_claim() {
            reset_particle(particle, params, rng);
            particle.set_active(true);
            Transition::Recycled
        } else {
            particle.set_active(false);
            Transition::Deactivated
        }
    } else if particle.is_active() {
        particle.set_position(particle.position() + particle.velocity() * delta_time_sec);
        Transition::Integrated
    } else {
        Transition::Frozen
    }
}

/// Fixed-length particle sequence kept in host memory.
///
/// The GPU path only uses it for the initial upload; stepping it on the CPU
/// reproduces the update kernel for headless use and testing.
#[derive(Debug, Clone)]
pub struct ParticleSet {
    params: SimulationParameters,
    particles: Vec<Particle>,
}

impl ParticleSet {
    /// Allocates `params.capacity()` particles, each freshly reset and active.
    pub fn populate<R: Rng + ?Sized>(params: SimulationParameters, rng: &mut R) -> Self {
        let particles = (0..params.capacity())
            .map(|_| spawn_particle(&params, &mut *rng))
            .collect();
        Self { params, particles }
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_active()).count()
    }

    /// Advances every particle by `delta_time_sec`, spreading chunks over the rayon pool.
    ///
    /// All workers share one `EmissionQuota`, so at most `max_emitted_per_frame`
    /// particles are recycled per call regardless of how the work is split.
    pub fn step<R: Rng + ?Sized>(&mut self, delta_time_sec: f32, rng: &mut R) -> StepReport {
        let quota = EmissionQuota::new(self.params.max_emitted_per_frame());
        let params = self.params;

        if self.particles.len() <= CPU_CHUNK_SIZE {
            let mut report = StepReport::default();
            for particle in &mut self.particles {
                report.record(step_particle(particle, &params, &quota, delta_time_sec, &mut *rng));
            }
            return report;
        }

        let seeds: Vec<u64> = (0..self.particles.len().div_ceil(CPU_CHUNK_SIZE))
            .map(|_| rng.r#gen())
            .collect();

        self.particles
            .par_chunks_mut(CPU_CHUNK_SIZE)
            .zip(seeds)
            .map(|(chunk, seed)| {
                let mut worker_rng = StdRng::seed_from_u64(seed);
                let mut report = StepReport::default();
                for particle in chunk {
                    report.record(step_particle(particle, &params, &quota, delta_time_sec, &mut worker_rng));
                }
                report
            })
            .reduce(StepReport::default, StepReport::merge)
    }
}
