use std::sync::mpsc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ParticleError, ProtocolViolation};
use crate::rendering::buffer::SharedParticleBuffer;
use crate::rendering::limits::PlatformLimits;
use crate::rendering::programs::ParticlePrograms;
use crate::rendering::render_stage::RenderStage;
use crate::rendering::update_stage::{MemoryBarrier, UpdateStage};
use crate::simulation::{Particle, ParticleSet, SimulationParameters};

/// Where the manager is in its per-frame protocol.
///
/// `Idle → Updated → Rendered → Updated → …`. Rendering the same state twice
/// is allowed; updating twice without a render in between is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Updated,
    Rendered,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Updated(MemoryBarrier),
    Rendered(MemoryBarrier),
}

// Everything the manager owns while initialized
struct LiveParticles {
    params: SimulationParameters,
    programs: ParticlePrograms,
    update_stage: UpdateStage,
    render_stage: RenderStage,
    buffer: SharedParticleBuffer,
    phase: Phase,
    rng: StdRng,
}

impl LiveParticles {
    fn release(self) {
        let LiveParticles {
            programs,
            update_stage,
            render_stage,
            buffer,
            ..
        } = self;
        buffer.release();
        drop(render_stage);
        drop(update_stage);
        // Drops this subsystem's reference only; other holders keep the modules
        drop(programs);
    }
}

enum Lifecycle {
    Uninitialized,
    Live(Box<LiveParticles>),
    Released,
}

/// Owns the shared particle buffer and both stages, and enforces the
/// init → (update → render)* → cleanup protocol.
pub struct ParticleManager {
    state: Lifecycle,
    seed: Option<u64>,
}

impl Default for ParticleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleManager {
    pub fn new() -> Self {
        Self {
            state: Lifecycle::Uninitialized,
            seed: None,
        }
    }

    /// A manager whose initial population and per-frame kernel seeds are
    /// derived from `seed` instead of OS entropy.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Lifecycle::Uninitialized,
            seed: Some(seed),
        }
    }

    /// One-time setup: validates against the adapter limits, builds both
    /// pipelines, and uploads a freshly reset particle population.
    ///
    /// On failure nothing stays allocated and the manager is left uninitialized.
    pub fn init(
        &mut self,
        device: &wgpu::Device,
        programs: ParticlePrograms,
        target_format: wgpu::TextureFormat,
        params: SimulationParameters,
    ) -> Result<(), ParticleError> {
        if let Lifecycle::Live(_) = self.state {
            return Err(ProtocolViolation::AlreadyInitialized.into());
        }
        // A released manager may be initialized again
        self.state = Lifecycle::Uninitialized;

        let limits = PlatformLimits::from_device(device);
        limits.log();
        limits.check(params.capacity())?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let initial = ParticleSet::populate(params, &mut rng);

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let update_stage = UpdateStage::new(device, &programs, &params);
        let render_stage = RenderStage::new(device, &programs, target_format);
        let buffer = SharedParticleBuffer::allocate(device, &update_stage, initial.particles());

        let validation_error = pollster::block_on(device.pop_error_scope());
        let memory_error = pollster::block_on(device.pop_error_scope());

        if let Some(error) = memory_error {
            buffer.release();
            return Err(ParticleError::ResourceExhaustion(error.to_string()));
        }
        if let Some(error) = validation_error {
            buffer.release();
            return Err(ParticleError::InvalidProgram(error.to_string()));
        }

        log::info!(
            "Particle manager initialized: {} particles, {} per frame, center = {}, radius^2 = {}",
            params.capacity(),
            params.max_emitted_per_frame(),
            params.emitter_center(),
            params.radius_sqr()
        );

        self.state = Lifecycle::Live(Box::new(LiveParticles {
            params,
            programs,
            update_stage,
            render_stage,
            buffer,
            phase: Phase::Idle,
            rng,
        }));
        Ok(())
    }

    fn live(&self) -> Result<&LiveParticles, ProtocolViolation> {
        match &self.state {
            Lifecycle::Live(live) => Ok(live.as_ref()),
            Lifecycle::Uninitialized => Err(ProtocolViolation::NotInitialized),
            Lifecycle::Released => Err(ProtocolViolation::AlreadyReleased),
        }
    }

    fn live_mut(&mut self) -> Result<&mut LiveParticles, ProtocolViolation> {
        match &mut self.state {
            Lifecycle::Live(live) => Ok(live.as_mut()),
            Lifecycle::Uninitialized => Err(ProtocolViolation::NotInitialized),
            Lifecycle::Released => Err(ProtocolViolation::AlreadyReleased),
        }
    }

    /// Advances the simulation by one step on the GPU.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        delta_time_sec: f32,
    ) -> Result<(), ParticleError> {
        let live = self.live_mut()?;

        if !delta_time_sec.is_finite() || delta_time_sec < 0.0 {
            return Err(ProtocolViolation::InvalidDeltaTime(delta_time_sec).into());
        }
        if let Phase::Updated(_) = live.phase {
            return Err(ProtocolViolation::UpdateBeforeRender.into());
        }

        let frame_seed = live.rng.r#gen::<u32>();
        let barrier = live
            .update_stage
            .run(device, queue, &mut live.buffer, delta_time_sec, frame_seed)?;
        live.phase = Phase::Updated(barrier);
        Ok(())
    }

    /// Records the draw of every particle into `pass`. Returns the number of points drawn.
    pub fn render(&mut self, pass: &mut wgpu::RenderPass<'_>) -> Result<u32, ParticleError> {
        let live = self.live_mut()?;

        let barrier = match live.phase {
            Phase::Idle => return Err(ProtocolViolation::RenderBeforeUpdate.into()),
            Phase::Updated(barrier) | Phase::Rendered(barrier) => barrier,
        };

        let drawn = live.render_stage.draw(pass, &mut live.buffer, &barrier)?;
        live.phase = Phase::Rendered(barrier);
        Ok(drawn)
    }

    /// Opens a render pass on `target` and records the particle draw into it.
    ///
    /// With `clear` set the target is cleared first; with `None` its contents
    /// are kept and the particles are blended over them.
    pub fn render_to(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clear: Option<wgpu::Color>,
    ) -> Result<u32, ParticleError> {
        // Nothing is recorded, not even the clear, when the draw would be refused
        if let Phase::Idle = self.live()?.phase {
            return Err(ProtocolViolation::RenderBeforeUpdate.into());
        }

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Particle Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        self.render(&mut pass)
    }

    /// Releases the buffer, both pipelines and this manager's program references.
    ///
    /// A no-op on a manager that was never initialized; an error on one that
    /// was already cleaned up.
    pub fn cleanup(&mut self) -> Result<(), ParticleError> {
        match std::mem::replace(&mut self.state, Lifecycle::Released) {
            Lifecycle::Uninitialized => {
                self.state = Lifecycle::Uninitialized;
                Ok(())
            }
            Lifecycle::Released => Err(ProtocolViolation::AlreadyReleased.into()),
            Lifecycle::Live(live) => {
                (*live).release();
                log::info!("Particle manager cleaned up");
                Ok(())
            }
        }
    }

    /// Copies the shared buffer back to host memory. Blocks until the copy completes.
    pub fn read_particles(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<Particle>, ParticleError> {
        let live = self.live()?;
        let size = live.buffer.size();

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(live.buffer.raw(), 0, &staging, 0, size);
        queue.submit([encoder.finish()]);

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| ParticleError::BufferMapping(e.to_string()))?;
        rx.recv()
            .map_err(|e| ParticleError::BufferMapping(e.to_string()))?
            .map_err(|e| ParticleError::BufferMapping(e.to_string()))?;

        let particles = {
            let data = slice.get_mapped_range();
            bytemuck::pod_collect_to_vec::<u8, Particle>(&data)
        };
        staging.unmap();

        Ok(particles)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, Lifecycle::Live(_))
    }

    pub fn phase(&self) -> Option<FramePhase> {
        self.live().ok().map(|live| match live.phase {
            Phase::Idle => FramePhase::Idle,
            Phase::Updated(_) => FramePhase::Updated,
            Phase::Rendered(_) => FramePhase::Rendered,
        })
    }

    pub fn params(&self) -> Option<&SimulationParameters> {
        self.live().ok().map(|live| &live.params)
    }

    pub fn capacity(&self) -> Option<u32> {
        self.live().ok().map(|live| live.buffer.capacity())
    }

    pub fn workgroups(&self) -> Option<u32> {
        self.live().ok().map(|live| live.update_stage.workgroups())
    }
}

impl Drop for ParticleManager {
    fn drop(&mut self) {
        if let Lifecycle::Live(live) = std::mem::replace(&mut self.state, Lifecycle::Released) {
            log::debug!("Particle manager dropped without cleanup; releasing");
            (*live).release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_before_init_are_rejected() {
        let mut manager = ParticleManager::new();
        assert!(!manager.is_initialized());
        assert_eq!(manager.phase(), None);
        assert_eq!(manager.capacity(), None);
        assert!(matches!(
            manager.live(),
            Err(ProtocolViolation::NotInitialized)
        ));
        // Cleanup of a never-initialized manager is a no-op, repeatedly
        assert!(manager.cleanup().is_ok());
        assert!(manager.cleanup().is_ok());
    }
}
