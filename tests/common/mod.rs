#![allow(dead_code)]

use compute_particles::{ParticleError, ParticleManager};

pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A device with compute support, or `None` when the machine has no such adapter.
pub(crate) fn gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    let _ = env_logger::builder().is_test(true).try_init();

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let Ok(adapter) = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default())) else {
        log::warn!("No GPU adapter available; skipping GPU test");
        return None;
    };

    if !adapter
        .get_downlevel_capabilities()
        .flags
        .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
    {
        log::warn!("Adapter {:?} has no compute support; skipping GPU test", adapter.get_info().name);
        return None;
    }

    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Particle Test Device"),
        required_features: wgpu::Features::empty(),
        required_limits: adapter.limits(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: wgpu::Trace::Off,
    }))
    .ok()
}

/// Offscreen colour target for render passes.
pub(crate) fn target(device: &wgpu::Device) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Particle Test Target"),
        size: wgpu::Extent3d {
            width: 64,
            height: 64,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Records and submits one render of `manager` into `view`.
pub(crate) fn render(
    manager: &mut ParticleManager,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    view: &wgpu::TextureView,
) -> Result<u32, ParticleError> {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Particle Test Encoder"),
    });
    let drawn = manager.render_to(&mut encoder, view, Some(wgpu::Color::BLACK));
    queue.submit([encoder.finish()]);
    drawn
}

/// One update followed by one render.
pub(crate) fn frame(
    manager: &mut ParticleManager,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    view: &wgpu::TextureView,
    delta_time_sec: f32,
) -> u32 {
    manager.update(device, queue, delta_time_sec).unwrap();
    render(manager, device, queue, view).unwrap()
}
