use glam::Mat4;

/// Render-target size in pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Pixel-space orthographic projection: (0, 0) maps to the top-left corner,
    /// (width, height) to the bottom-right, depth 0..1.
    ///
    /// Degenerate sizes are widened to one pixel so the matrix stays invertible.
    pub fn orthographic(self) -> Mat4 {
        let w = self.width.max(1.0);
        let h = self.height.max(1.0);
        Mat4::orthographic_rh(0.0, w, h, 0.0, 0.0, 1.0)
    }
}
