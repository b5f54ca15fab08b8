//! Fixed-capacity GPU particle pool.
//!
//! Particles live in a single GPU buffer that a compute pass updates in place
//! and a render pass draws from directly as points. The compute pass recycles
//! particles that leave the kill radius, at most `max_emitted_per_frame` per
//! step, back onto a small disc around the emitter center.
//!
//! ```ignore
//! let params = SimulationParameters::new(10_000, 100, Vec2::ZERO, 0.9, 0.05, 0.4)?;
//! let mut particles = ParticleManager::new();
//! particles.init(&device, ParticlePrograms::compile(&device), surface_format, params)?;
//!
//! // every frame
//! particles.update(&device, &queue, dt)?;
//! particles.render_to(&mut encoder, &view, Some(wgpu::Color::BLACK))?;
//! ```

pub mod error;
pub mod rendering;
pub mod simulation;

pub use error::{BindingRole, ConfigError, ParticleError, ProtocolViolation};
pub use rendering::{FramePhase, MemoryBarrier, ParticleManager, ParticlePrograms};
pub use simulation::{Particle, ParticleSet, SimulationParameters};
