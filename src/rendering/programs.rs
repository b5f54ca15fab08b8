use std::sync::Arc;

use crate::simulation::WORKGROUP_SIZE;

const UPDATE_SHADER: &str = include_str!("../shaders/update.wgsl");
const RENDER_SHADER: &str = include_str!("../shaders/render.wgsl");

/// Already-built shader programs handed to `ParticleManager::init`.
///
/// The manager holds one reference to each module. Cleanup drops only that
/// reference; whoever else holds a clone of the `Arc` keeps the module alive.
///
/// An externally built update program must declare `@workgroup_size(WORKGROUP_SIZE)`
/// and the bindings of `shaders/update.wgsl`; a render program must take the
/// vertex inputs described by `ParticleLayout`.
#[derive(Clone)]
pub struct ParticlePrograms {
    pub render: Arc<wgpu::ShaderModule>,
    pub render_vertex_entry: &'static str,
    pub render_fragment_entry: &'static str,
    pub update: Arc<wgpu::ShaderModule>,
    pub update_entry: &'static str,
}

impl ParticlePrograms {
    /// Compiles the bundled update and render shaders.
    pub fn compile(device: &wgpu::Device) -> Self {
        let update = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Update Shader"),
            source: wgpu::ShaderSource::Wgsl(update_shader_source().into()),
        });
        let render = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Render Shader"),
            source: wgpu::ShaderSource::Wgsl(RENDER_SHADER.into()),
        });

        Self {
            render: Arc::new(render),
            render_vertex_entry: "vertex_main",
            render_fragment_entry: "fragment_main",
            update: Arc::new(update),
            update_entry: "update_particles",
        }
    }
}

/// Update kernel source with the workgroup width filled in.
pub fn update_shader_source() -> String {
    UPDATE_SHADER.replace("{{WORKGROUP_SIZE}}", &WORKGROUP_SIZE.to_string())
}
