use crate::coords::Rect;
use crate::error::{BatchError, BatchResult};
use crate::paint::Color;
use crate::render::{GraphicsDevice, PrimitiveBatcher};

use super::common::{DEGENERATE_EPSILON, QUAD_INDICES, QUAD_VERTEX_COUNT};

impl<D: GraphicsDevice> PrimitiveBatcher<D> {
    /// Draws the outline of `rect` as four lines (top, right, bottom, left).
    ///
    /// Negative sizes are flipped first. A rectangle with zero width or height is
    /// rejected before any edge is written.
    pub fn draw_rect(&mut self, rect: Rect, thickness: f32, color: Color) -> BatchResult<()> {
        self.ensure_started()?;

        let rect = rect.normalized();
        if !(rect.size.x > DEGENERATE_EPSILON && rect.size.y > DEGENERATE_EPSILON) || !rect.is_finite() {
            return Err(BatchError::DegenerateGeometry("rectangle outline has zero width or height"));
        }

        let c = rect.corners();
        for i in 0..c.len() {
            self.draw_line(c[i], c[(i + 1) % c.len()], thickness, color)?;
        }
        Ok(())
    }

    /// Fills `rect` with two triangles over its corners (TL, TR, BR, BL).
    ///
    /// Negative sizes are flipped first, so winding does not depend on the sign.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) -> BatchResult<()> {
        let rect = rect.normalized();
        self.write_shape(QUAD_VERTEX_COUNT, QUAD_INDICES.len(), |w| {
            w.indices(&QUAD_INDICES);
            for corner in rect.corners() {
                w.vertex(corner, color);
            }
        })
    }
}
