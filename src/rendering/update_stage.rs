use std::mem::{offset_of, size_of};

use wgpu::util::DeviceExt;

use crate::error::ProtocolViolation;
use crate::rendering::buffer::SharedParticleBuffer;
use crate::rendering::limits::dispatch_size;
use crate::rendering::programs::ParticlePrograms;
use crate::simulation::types::{FrameUniforms, SimulationUniforms};
use crate::simulation::{ParticleLayout, SimulationParameters};

/// Proof that an update pass was submitted and its writes are visible to later work.
///
/// Only `UpdateStage::run` creates one, and `RenderStage::draw` requires one,
/// so a draw cannot be recorded against a buffer no update has been fenced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBarrier {
    frame: u64,
}

impl MemoryBarrier {
    /// Number of update passes submitted before and including this one.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// Drives the parallel update pass.
pub struct UpdateStage {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    emission_counter: wgpu::Buffer,
    workgroups: u32,
    frames: u64,
}

impl UpdateStage {
    /// Builds the compute pipeline and pushes the fixed-for-lifetime parameters.
    pub fn new(device: &wgpu::Device, programs: &ParticlePrograms, params: &SimulationParameters) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Update Bind Group Layout"),
            entries: &[
                // particles
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: ParticleLayout::storage_binding_size(),
                    },
                    count: None,
                },
                // uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size_of::<SimulationUniforms>() as u64),
                    },
                    count: None,
                },
                // emitted_this_frame
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size_of::<u32>() as u64),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Update Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Particle Update Pipeline"),
            layout: Some(&pipeline_layout),
            module: &programs.update,
            entry_point: Some(programs.update_entry),
            compilation_options: Default::default(),
            cache: None,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Simulation Uniforms"),
            contents: bytemuck::bytes_of(&params.uniforms()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let emission_counter = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Emission Counter"),
            size: size_of::<u32>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            emission_counter,
            workgroups: dispatch_size(params.capacity()),
            frames: 0,
        }
    }

    pub(crate) fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub(crate) fn uniform_buffer(&self) -> &wgpu::Buffer {
        &self.uniform_buffer
    }

    pub(crate) fn emission_counter(&self) -> &wgpu::Buffer {
        &self.emission_counter
    }

    pub fn workgroups(&self) -> u32 {
        self.workgroups
    }

    /// Advances every particle by `delta_time_sec` on the GPU.
    ///
    /// The emission counter is cleared, the kernel dispatched, and the command
    /// buffer submitted. Work submitted to the queue afterwards observes every
    /// write of this pass, which is what the returned barrier stands for.
    pub fn run(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        buffer: &mut SharedParticleBuffer,
        delta_time_sec: f32,
        frame_seed: u32,
    ) -> Result<MemoryBarrier, ProtocolViolation> {
        let frame = FrameUniforms {
            delta_time_sec,
            frame_seed,
        };
        queue.write_buffer(
            &self.uniform_buffer,
            offset_of!(SimulationUniforms, delta_time_sec) as u64,
            bytemuck::bytes_of(&frame),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Update Encoder"),
        });

        // The per-frame emission count starts at zero
        encoder.clear_buffer(&self.emission_counter, 0, None);

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Particle Update Pass"),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&self.pipeline);
            buffer.bind_for_update(&mut compute_pass)?;
            compute_pass.dispatch_workgroups(self.workgroups, 1, 1);
        }
        buffer.unbind();

        queue.submit([encoder.finish()]);
        self.frames += 1;
        log::trace!("Particle update {} dispatched ({} workgroups, dt = {})", self.frames, self.workgroups, delta_time_sec);

        Ok(MemoryBarrier { frame: self.frames })
    }
}
