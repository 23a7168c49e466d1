use glam::{Mat4, Vec2};

use crate::error::{BatchError, BatchResult};
use crate::paint::Color;
use crate::render::{GraphicsDevice, PrimitiveBatcher};

use super::common::{direction, transform_point};

impl<D: GraphicsDevice> PrimitiveBatcher<D> {
    /// Draws a closed outline through `vertices` (local space) after applying
    /// `transform`, one line per edge including last → first.
    ///
    /// Every edge is checked for zero length before anything is written.
    pub fn draw_polygon(
        &mut self,
        vertices: &[Vec2],
        transform: Mat4,
        thickness: f32,
        color: Color,
    ) -> BatchResult<()> {
        self.ensure_started()?;

        if vertices.len() < 2 {
            return Err(BatchError::InvalidArgument(format!(
                "polygon outline needs at least 2 vertices, got {}",
                vertices.len()
            )));
        }

        for (a, b) in edges(vertices, &transform) {
            direction(a, b)?;
        }
        for (a, b) in edges(vertices, &transform) {
            self.draw_line(a, b, thickness, color)?;
        }
        Ok(())
    }

    /// Fills a polygon using the caller's triangulation.
    ///
    /// `triangles` holds index triples into `vertices`; no triangulation is done
    /// here. The list must have at least one triangle, a length divisible by
    /// three, and only in-range indices.
    pub fn fill_polygon(
        &mut self,
        vertices: &[Vec2],
        triangles: &[u32],
        transform: Mat4,
        color: Color,
    ) -> BatchResult<()> {
        self.ensure_started()?;

        if vertices.len() < 3 {
            return Err(BatchError::InvalidArgument(format!(
                "polygon fill needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if triangles.len() < 3 || triangles.len() % 3 != 0 {
            return Err(BatchError::InvalidArgument(format!(
                "polygon fill needs whole triangles, got {} indices",
                triangles.len()
            )));
        }
        if let Some(&bad) = triangles.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(BatchError::InvalidArgument(format!(
                "triangle index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }

        self.write_shape(vertices.len(), triangles.len(), |w| {
            w.indices(triangles);
            for &v in vertices {
                w.vertex(transform_point(&transform, v), color);
            }
        })
    }
}

/// Transformed edges of a closed polygon, wrapping last → first.
fn edges<'a>(vertices: &'a [Vec2], transform: &'a Mat4) -> impl Iterator<Item = (Vec2, Vec2)> + 'a {
    (0..vertices.len()).map(move |i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        (transform_point(transform, a), transform_point(transform, b))
    })
}
