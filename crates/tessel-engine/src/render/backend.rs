use glam::Mat4;

use crate::coords::Viewport;

use super::vertex::ShapeVertex;

/// View and projection matrices active for a batch (column-major).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewProjection {
    pub view: Mat4,
    pub projection: Mat4,
}

impl ViewProjection {
    #[inline]
    pub const fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    /// Pixel-space transform for `viewport`: identity view, top-left origin.
    #[inline]
    pub fn pixel_space(viewport: Viewport) -> Self {
        Self::new(Mat4::IDENTITY, viewport.orthographic())
    }

    /// `projection * view`, the matrix the vertex shader applies.
    #[inline]
    pub fn combined(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for ViewProjection {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

/// One indexed triangle-list submission.
///
/// `vertices` and `indices` are exactly the filled part of the batch buffers;
/// indices are relative to the start of `vertices`.
#[derive(Debug, Copy, Clone)]
pub struct DrawBatch<'a> {
    pub transform: ViewProjection,
    pub vertices: &'a [ShapeVertex],
    pub indices: &'a [u32],
}

impl DrawBatch<'_> {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Graphics device seam used by [`PrimitiveBatcher`](super::PrimitiveBatcher).
///
/// Implementations submit geometry immediately; the batcher reuses its buffers
/// as soon as `draw_indexed_triangles` returns.
pub trait GraphicsDevice {
    /// Size of the render target the next draw lands in, in pixels.
    fn viewport(&self) -> Viewport;

    /// Submits `batch` as a single indexed triangle-list draw.
    fn draw_indexed_triangles(&mut self, batch: &DrawBatch<'_>) -> anyhow::Result<()>;

    /// Frees GPU-side resources created for drawing. Called once on dispose.
    fn release(&mut self) {}
}

impl<D: GraphicsDevice + ?Sized> GraphicsDevice for Box<D> {
    fn viewport(&self) -> Viewport {
        (**self).viewport()
    }

    fn draw_indexed_triangles(&mut self, batch: &DrawBatch<'_>) -> anyhow::Result<()> {
        (**self).draw_indexed_triangles(batch)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
