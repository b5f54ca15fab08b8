use bytemuck::{Pod, Zeroable};
use glam::Vec2;

// Width of one compute workgroup. Substituted into the update kernel at compile
// time, so dispatch sizing and the kernel's @workgroup_size always agree.
pub const WORKGROUP_SIZE: u32 = 256;

// Radius of the disc new particles are spawned in, in the same units as the kill radius
pub const SPAWN_REGION_RADIUS: f32 = 0.1;

// Axis draws are reduced modulo this so the two components stay comparable
pub(crate) const DIRECTION_MODULUS: i32 = 100;

// Redraws allowed when both axis draws reduce to zero
pub const MAX_DIRECTION_ATTEMPTS: u32 = 8;

/// One particle as it sits in the shared GPU buffer.
///
/// The field order defines both the storage layout seen by the update kernel
/// and the vertex attribute offsets seen by the render pipeline. Do not
/// reorder fields without updating both shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub position: [f32; 4], // xy = position, zw unused
    pub velocity: [f32; 4], // xy = velocity, zw unused
    pub is_active: u32,     // 0 or 1
    pub _padding: [u32; 3], // Pads the record to the 16-byte storage array stride
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, active: bool) -> Self {
        Self {
            position: [position.x, position.y, 0.0, 0.0],
            velocity: [velocity.x, velocity.y, 0.0, 0.0],
            is_active: u32::from(active),
            _padding: [0; 3],
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.position[0], self.position[1])
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.velocity[0], self.velocity[1])
    }

    pub fn is_active(&self) -> bool {
        self.is_active != 0
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = [position.x, position.y, 0.0, 0.0];
    }

    pub(crate) fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = [velocity.x, velocity.y, 0.0, 0.0];
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.is_active = u32::from(active);
    }
}

// Uniform block read by the update kernel. Mirrors `SimulationUniforms` in update.wgsl.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct SimulationUniforms {
    pub(crate) emitter_center: [f32; 2],
    pub(crate) radius_sqr: f32,
    pub(crate) min_velocity: f32,
    pub(crate) velocity_delta: f32,
    pub(crate) max_emitted_per_frame: u32,
    pub(crate) max_particle_count: u32,
    pub(crate) delta_time_sec: f32,
    pub(crate) frame_seed: u32,
    pub(crate) _padding: [u32; 3], // Uniform structs are sized to a multiple of 16 bytes
}

// The part of `SimulationUniforms` rewritten every frame
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub(crate) delta_time_sec: f32,
    pub(crate) frame_seed: u32,
}
