use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::paint::Color;

/// Vertex layout shared by the batcher and the GPU pipeline.
///
/// Stride is 28 bytes: `position` at offset 0 (z is always 0), `color` at 12.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ShapeVertex {
    pub position: [f32; 3],
    pub color: [f32; 4], // linear premultiplied
}

impl ShapeVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4  // color
    ];

    #[inline]
    pub fn new(position: Vec2, color: Color) -> Self {
        Self {
            position: [position.x, position.y, 0.0],
            color: color.to_array(),
        }
    }

    /// Planar position.
    #[inline]
    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.position[0], self.position[1])
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ShapeVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}
