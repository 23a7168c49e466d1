use glam::Vec2;

use crate::error::BatchResult;
use crate::paint::Color;
use crate::render::{GraphicsDevice, PrimitiveBatcher};

use super::common::{line_quad, QUAD_INDICES, QUAD_VERTEX_COUNT};

impl<D: GraphicsDevice> PrimitiveBatcher<D> {
    /// Draws a segment from `a` to `b` as a quad with square caps.
    ///
    /// `thickness` is clamped to the configured range. The quad overshoots each
    /// endpoint by half the thickness, so its long side is `|b - a| + thickness`.
    pub fn draw_line(&mut self, a: Vec2, b: Vec2, thickness: f32, color: Color) -> BatchResult<()> {
        self.ensure_started()?;

        let half = self.clamp_thickness(thickness) * 0.5;
        let quad = line_quad(a, b, half)?;

        self.write_shape(QUAD_VERTEX_COUNT, QUAD_INDICES.len(), |w| {
            w.indices(&QUAD_INDICES);
            for corner in quad {
                w.vertex(corner, color);
            }
        })
    }

    #[inline]
    pub fn draw_line_xy(
        &mut self,
        ax: f32,
        ay: f32,
        bx: f32,
        by: f32,
        thickness: f32,
        color: Color,
    ) -> BatchResult<()> {
        self.draw_line(Vec2::new(ax, ay), Vec2::new(bx, by), thickness, color)
    }
}
