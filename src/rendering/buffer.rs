use wgpu::util::DeviceExt;

use crate::error::{BindingRole, ProtocolViolation};
use crate::rendering::update_stage::UpdateStage;
use crate::simulation::{Particle, ParticleLayout};

/// The one block of GPU memory holding every particle.
///
/// The same buffer is bound as read/write storage for the update pass and as
/// vertex buffer 0 for the render pass. Only one role may be bound at a time.
pub struct SharedParticleBuffer {
    buffer: wgpu::Buffer,
    update_bind_group: wgpu::BindGroup,
    capacity: u32,
    bound_role: Option<BindingRole>,
}

impl SharedParticleBuffer {
    /// Creates the buffer and uploads the initial particles.
    ///
    /// Takes the update stage because its bind group layout and uniform
    /// buffers are part of the storage binding.
    pub fn allocate(device: &wgpu::Device, update_stage: &UpdateStage, particles: &[Particle]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shared Particle Buffer"),
            contents: bytemuck::cast_slice(particles),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });

        let update_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Update Bind Group"),
            layout: update_stage.bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: update_stage.uniform_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: update_stage.emission_counter().as_entire_binding(),
                },
            ],
        });

        log::debug!(
            "Allocated particle buffer: {} particles, {} bytes",
            particles.len(),
            ParticleLayout::buffer_size(particles.len() as u32)
        );

        Self {
            buffer,
            update_bind_group,
            capacity: particles.len() as u32,
            bound_role: None,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn size(&self) -> u64 {
        ParticleLayout::buffer_size(self.capacity)
    }

    pub(crate) fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn bound_role(&self) -> Option<BindingRole> {
        self.bound_role
    }

    fn claim_role(&mut self, requested: BindingRole) -> Result<(), ProtocolViolation> {
        match self.bound_role {
            Some(bound) if bound != requested => Err(ProtocolViolation::BindingConflict { bound, requested }),
            _ => {
                self.bound_role = Some(requested);
                Ok(())
            }
        }
    }

    /// Binds the buffer as storage (group 0) for the update kernel.
    pub fn bind_for_update(&mut self, pass: &mut wgpu::ComputePass<'_>) -> Result<(), ProtocolViolation> {
        self.claim_role(BindingRole::Update)?;
        pass.set_bind_group(0, &self.update_bind_group, &[]);
        Ok(())
    }

    /// Binds the buffer as vertex buffer 0 for the render pipeline.
    pub fn bind_for_render(&mut self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), ProtocolViolation> {
        self.claim_role(BindingRole::Render)?;
        pass.set_vertex_buffer(0, self.buffer.slice(..));
        Ok(())
    }

    pub fn unbind(&mut self) {
        self.bound_role = None;
    }

    /// Frees the GPU memory. Consuming `self` makes a second release impossible.
    pub fn release(self) {
        log::debug!("Releasing particle buffer ({} particles)", self.capacity);
        self.buffer.destroy();
    }
}
