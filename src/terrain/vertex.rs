//! Terrain vertex format

use bytemuck::{Pod, Zeroable};

/// Grid-space vertex. World position is `position * scale + offset`, taken
/// from the per-draw `ScaleFactor`; height comes from the level's elevation
/// texture in the vertex shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [u16; 2],
}

impl TerrainVertex {
    pub fn new(x: i32, y: i32) -> Self {
        debug_assert!((0..=u16::MAX as i32).contains(&x) && (0..=u16::MAX as i32).contains(&y));
        Self { position: [x as u16, y as u16] }
    }

    pub fn x(&self) -> i32 {
        self.position[0] as i32
    }

    pub fn y(&self) -> i32 {
        self.position[1] as i32
    }

    /// wgpu vertex buffer layout descriptor
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Uint16x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Primitive topology of a shared mesh
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
}
