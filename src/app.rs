use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use compute_particles::{ConfigError, ParticleManager, ParticlePrograms, SimulationParameters};

// Defaults for the demo, each overridable through a PARTICLES_* environment variable
const PARTICLE_COUNT: u32 = 20_000;
const MAX_EMITTED_PER_FRAME: u32 = 200;
const KILL_RADIUS: f32 = 0.9;
const MIN_VELOCITY: f32 = 0.05;
const MAX_VELOCITY: f32 = 0.5;

// Longest simulated step; the first frame and window drags produce large gaps
const MAX_DELTA_TIME: f32 = 0.1;

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.03,
    a: 1.0,
};

#[derive(Debug, Clone, Copy)]
struct DemoSettings {
    particle_count: u32,
    max_emitted_per_frame: u32,
    kill_radius: f32,
    min_velocity: f32,
    max_velocity: f32,
}

impl DemoSettings {
    fn from_env() -> Self {
        Self {
            particle_count: env_or("PARTICLES_COUNT", PARTICLE_COUNT),
            max_emitted_per_frame: env_or("PARTICLES_MAX_EMITTED", MAX_EMITTED_PER_FRAME),
            kill_radius: env_or("PARTICLES_RADIUS", KILL_RADIUS),
            min_velocity: env_or("PARTICLES_MIN_VELOCITY", MIN_VELOCITY),
            max_velocity: env_or("PARTICLES_MAX_VELOCITY", MAX_VELOCITY),
        }
    }

    fn params(&self) -> Result<SimulationParameters, ConfigError> {
        SimulationParameters::new(
            self.particle_count,
            self.max_emitted_per_frame,
            Vec2::ZERO,
            self.kill_radius,
            self.min_velocity,
            self.max_velocity,
        )
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring {}={:?}, using {}", name, value, default);
            default
        }),
        Err(_) => default,
    }
}

struct State {
    window: Arc<Window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: winit::dpi::PhysicalSize<u32>,
    surface: wgpu::Surface<'static>,
    surface_format: wgpu::TextureFormat,

    programs: ParticlePrograms,
    particles: ParticleManager,
    params: SimulationParameters,
    last_update: Instant,
}

impl State {
    async fn new(window: Arc<Window>, params: SimulationParameters) -> State {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .unwrap();
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .unwrap();

        let size = window.inner_size();

        let surface = instance.create_surface(window.clone()).unwrap();
        let cap = surface.get_capabilities(&adapter);
        let surface_format = cap.formats[0];

        let programs = ParticlePrograms::compile(&device);
        let mut particles = ParticleManager::new();
        particles
            .init(&device, programs.clone(), surface_format.add_srgb_suffix(), params)
            .expect("failed to initialize particles");

        let state = State {
            window,
            device,
            queue,
            size,
            surface,
            surface_format,
            programs,
            particles,
            params,
            last_update: Instant::now(),
        };

        state.configure_surface();

        state
    }

    fn get_window(&self) -> &Window {
        &self.window
    }

    fn configure_surface(&self) {
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.surface_format,
            view_formats: vec![self.surface_format.add_srgb_suffix()],
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            width: self.size.width,
            height: self.size.height,
            desired_maximum_frame_latency: 2,
            present_mode: wgpu::PresentMode::AutoVsync,
        };
        self.surface.configure(&self.device, &surface_config);
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.configure_surface();
        }
    }

    // Tears the particle pool down and builds it again from the same parameters
    fn restart(&mut self) {
        if let Err(e) = self.particles.cleanup() {
            log::error!("{}", e);
        }
        match self.particles.init(
            &self.device,
            self.programs.clone(),
            self.surface_format.add_srgb_suffix(),
            self.params,
        ) {
            Ok(()) => log::info!("Particles restarted"),
            Err(e) => log::error!("Failed to restart particles: {}", e),
        }
        self.last_update = Instant::now();
    }

    fn render(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f32().min(MAX_DELTA_TIME);
        self.last_update = now;

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("Failed to acquire swapchain texture: {}", e);
                self.configure_surface();
                return;
            }
        };
        let texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor {
                format: Some(self.surface_format.add_srgb_suffix()),
                ..Default::default()
            });

        // Only update once a frame to draw into is in hand, so every update is followed by a render
        if let Err(e) = self.particles.update(&self.device, &self.queue, dt) {
            log::error!("Particle update failed: {}", e);
            return;
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Frame Encoder"),
            });

        if let Err(e) = self.particles.render_to(&mut encoder, &texture_view, Some(BACKGROUND)) {
            log::error!("Particle render failed: {}", e);
        }

        self.queue.submit([encoder.finish()]);
        self.window.pre_present_notify();
        surface_texture.present();
    }
}

#[derive(Default)]
struct App {
    state: Option<State>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let settings = DemoSettings::from_env();
        let params = match settings.params() {
            Ok(params) => params,
            Err(e) => {
                log::error!("Invalid particle settings {:?}: {}", settings, e);
                event_loop.exit();
                return;
            }
        };

        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title("Compute Particles"))
                .unwrap(),
        );

        let state = pollster::block_on(State::new(window.clone(), params));
        self.state = Some(state);

        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                log::info!("The close button was pressed; stopping");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                state.render();
                state.get_window().request_redraw();
            }
            WindowEvent::Resized(size) => {
                state.resize(size);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match key_code {
                KeyCode::KeyR => state.restart(),
                KeyCode::Escape => event_loop.exit(),
                _ => (),
            },
            _ => (),
        }
    }
}

pub(crate) fn run() {
    env_logger::init();
    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::default();
    event_loop.run_app(&mut app).unwrap();
}
