use crate::error::ProtocolViolation;
use crate::rendering::buffer::SharedParticleBuffer;
use crate::rendering::programs::ParticlePrograms;
use crate::rendering::update_stage::MemoryBarrier;
use crate::simulation::ParticleLayout;

/// Draws the shared buffer as a point list, one point per particle.
///
/// Inactive particles are drawn too, at the position they froze in.
pub struct RenderStage {
    pipeline: wgpu::RenderPipeline,
}

impl RenderStage {
    /// Builds the render pipeline. The vertex attribute description comes from
    /// `ParticleLayout` and is attached to this pipeline only.
    pub fn new(device: &wgpu::Device, programs: &ParticlePrograms, target_format: wgpu::TextureFormat) -> Self {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Render Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &programs.render,
                entry_point: Some(programs.render_vertex_entry),
                buffers: &[ParticleLayout::vertex_buffer_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &programs.render,
                entry_point: Some(programs.render_fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self { pipeline }
    }

    /// Records the draw into `pass` and returns the number of points drawn.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        buffer: &mut SharedParticleBuffer,
        barrier: &MemoryBarrier,
    ) -> Result<u32, ProtocolViolation> {
        pass.set_pipeline(&self.pipeline);
        buffer.bind_for_render(pass)?;
        pass.draw(0..buffer.capacity(), 0..1);
        buffer.unbind();

        log::trace!("Drew {} particles after update {}", buffer.capacity(), barrier.frame());
        Ok(buffer.capacity())
    }
}
