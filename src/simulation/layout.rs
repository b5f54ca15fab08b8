//! Single source of truth for how a `Particle` is laid out in GPU memory.
//!
//! The update kernel reads the buffer as `array<Particle>` and the render
//! pipeline reads the same bytes as vertex attributes. Both views are derived
//! from the field table below, which is in turn derived from the Rust struct.

use std::mem::{offset_of, size_of};

use crate::simulation::types::Particle;

/// One field of the particle record as both consumers see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleField {
    pub name: &'static str,
    pub offset: u64,
    pub format: wgpu::VertexFormat,
    pub shader_location: u32,
}

pub struct ParticleLayout;

impl ParticleLayout {
    /// Size of one record, and the stride of both the storage array and the vertex buffer.
    pub const STRIDE: u64 = size_of::<Particle>() as u64;

    /// Record fields in memory order. Shader locations follow the same order.
    pub const FIELDS: [ParticleField; 3] = [
        ParticleField {
            name: "position",
            offset: offset_of!(Particle, position) as u64,
            format: wgpu::VertexFormat::Float32x4,
            shader_location: 0,
        },
        ParticleField {
            name: "velocity",
            offset: offset_of!(Particle, velocity) as u64,
            format: wgpu::VertexFormat::Float32x4,
            shader_location: 1,
        },
        ParticleField {
            name: "is_active",
            offset: offset_of!(Particle, is_active) as u64,
            format: wgpu::VertexFormat::Uint32,
            shader_location: 2,
        },
    ];

    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        Self::attribute(0),
        Self::attribute(1),
        Self::attribute(2),
    ];

    const fn attribute(index: usize) -> wgpu::VertexAttribute {
        let field = Self::FIELDS[index];
        wgpu::VertexAttribute {
            format: field.format,
            offset: field.offset,
            shader_location: field.shader_location,
        }
    }

    /// Vertex-attribute view of the shared buffer, one vertex per record.
    pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Bytes needed to hold `capacity` records.
    pub fn buffer_size(capacity: u32) -> u64 {
        Self::STRIDE * u64::from(capacity)
    }

    /// Minimum binding size of the storage view: at least one record.
    pub fn storage_binding_size() -> Option<wgpu::BufferSize> {
        wgpu::BufferSize::new(Self::STRIDE)
    }
}
