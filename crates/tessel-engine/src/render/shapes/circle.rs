use glam::Vec2;

use crate::error::{BatchError, BatchResult};
use crate::paint::Color;
use crate::render::{GraphicsDevice, PrimitiveBatcher};

use super::common::{CirclePoints, DEGENERATE_EPSILON, FILL_MIN_POINTS, MAX_POINTS, OUTLINE_MIN_POINTS};

impl<D: GraphicsDevice> PrimitiveBatcher<D> {
    /// Draws a circle outline tessellated into `points` segments (clamped to 8..=256).
    ///
    /// The sign of `radius` only mirrors the rim, as in [`fill_circle`](Self::fill_circle).
    pub fn draw_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        points: usize,
        thickness: f32,
        color: Color,
    ) -> BatchResult<()> {
        self.ensure_started()?;

        let points = points.clamp(OUTLINE_MIN_POINTS, MAX_POINTS);

        // Every segment has this length; nothing is written if it is degenerate.
        let chord = 2.0 * radius.abs() * (std::f32::consts::PI / points as f32).sin();
        if !chord.is_finite() || chord <= DEGENERATE_EPSILON {
            return Err(BatchError::DegenerateGeometry("circle radius too small to outline"));
        }

        let start = Vec2::new(radius, 0.0);
        let mut a = start;
        for b in CirclePoints::new(radius, points).skip(1).chain(std::iter::once(start)) {
            self.draw_line(center + a, center + b, thickness, color)?;
            a = b;
        }
        Ok(())
    }

    /// Fills a circle with `points` rim vertices (clamped to 3..=256), fan-triangulated
    /// from the first one: `points - 2` triangles.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, points: usize, color: Color) -> BatchResult<()> {
        let points = points.clamp(FILL_MIN_POINTS, MAX_POINTS);
        let triangles = points - 2;

        self.write_shape(points, triangles * 3, |w| {
            for i in 1..=triangles as u32 {
                w.indices(&[0, i, i + 1]);
            }
            for p in CirclePoints::new(radius, points) {
                w.vertex(center + p, color);
            }
        })
    }
}
