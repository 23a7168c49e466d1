use glam::Vec2;

use crate::error::{BatchError, BatchResult, BufferKind};
use crate::paint::Color;

use super::vertex::ShapeVertex;

/// Index slots reserved per vertex slot.
pub const INDICES_PER_VERTEX: usize = 3;

/// Fixed-capacity vertex/index storage with write cursors.
///
/// Both buffers are allocated once. Callers check room with [`fits`](Self::fits)
/// and write whole shapes through [`begin_shape`](Self::begin_shape); the arena
/// itself never flushes.
#[derive(Debug)]
pub struct GeometryArena {
    vertices: Box<[ShapeVertex]>,
    indices: Box<[u32]>,
    vertex_count: usize,
    index_count: usize,
}

impl GeometryArena {
    /// Creates an arena holding `max_vertices` vertices and three times as many indices.
    pub fn new(max_vertices: usize) -> Self {
        Self {
            vertices: vec![ShapeVertex::default(); max_vertices].into_boxed_slice(),
            indices: vec![0; max_vertices * INDICES_PER_VERTEX].into_boxed_slice(),
            vertex_count: 0,
            index_count: 0,
        }
    }

    #[inline]
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_capacity(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0 && self.index_count == 0
    }

    /// Fails if a single shape of this size could never fit, even in an empty arena.
    pub fn check_shape(&self, vertices: usize, indices: usize) -> BatchResult<()> {
        if vertices > self.vertex_capacity() {
            return Err(BatchError::Capacity {
                buffer: BufferKind::Vertex,
                required: vertices,
                capacity: self.vertex_capacity(),
            });
        }
        if indices > self.index_capacity() {
            return Err(BatchError::Capacity {
                buffer: BufferKind::Index,
                required: indices,
                capacity: self.index_capacity(),
            });
        }
        Ok(())
    }

    /// Whether a shape of this size fits behind the current cursors.
    #[inline]
    pub fn fits(&self, vertices: usize, indices: usize) -> bool {
        self.vertex_count + vertices <= self.vertex_capacity()
            && self.index_count + indices <= self.index_capacity()
    }

    /// Starts writing a shape whose indices are relative to the current vertex cursor.
    ///
    /// The caller must have checked [`fits`](Self::fits) for the full shape.
    #[inline]
    pub fn begin_shape(&mut self) -> ShapeWriter<'_> {
        let base = self.vertex_count as u32;
        ShapeWriter { arena: self, base }
    }

    /// Filled portion of both buffers.
    #[inline]
    pub fn filled(&self) -> (&[ShapeVertex], &[u32]) {
        (
            &self.vertices[..self.vertex_count],
            &self.indices[..self.index_count],
        )
    }

    /// Rewinds both cursors. Slot contents are overwritten by later shapes.
    #[inline]
    pub fn reset(&mut self) {
        self.vertex_count = 0;
        self.index_count = 0;
    }
}

/// Appends one shape's vertices and indices to a [`GeometryArena`].
pub struct ShapeWriter<'a> {
    arena: &'a mut GeometryArena,
    base: u32,
}

impl ShapeWriter<'_> {
    #[inline]
    pub fn vertex(&mut self, position: Vec2, color: Color) {
        let arena = &mut *self.arena;
        arena.vertices[arena.vertex_count] = ShapeVertex::new(position, color);
        arena.vertex_count += 1;
    }

    /// Writes one index relative to the first vertex of this shape.
    #[inline]
    pub fn index(&mut self, relative: u32) {
        let arena = &mut *self.arena;
        arena.indices[arena.index_count] = self.base + relative;
        arena.index_count += 1;
    }

    #[inline]
    pub fn indices(&mut self, relative: &[u32]) {
        for &i in relative {
            self.index(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_capacity_is_three_per_vertex() {
        let arena = GeometryArena::new(16);
        assert_eq!(arena.vertex_capacity(), 16);
        assert_eq!(arena.index_capacity(), 48);
        assert!(arena.is_empty());
    }

    #[test]
    fn check_shape_rejects_oversized_shapes() {
        let arena = GeometryArena::new(4);
        assert!(arena.check_shape(4, 12).is_ok());
        assert!(matches!(
            arena.check_shape(5, 6),
            Err(BatchError::Capacity { buffer: BufferKind::Vertex, required: 5, capacity: 4 })
        ));
        assert!(matches!(
            arena.check_shape(3, 13),
            Err(BatchError::Capacity { buffer: BufferKind::Index, required: 13, capacity: 12 })
        ));
    }

    #[test]
    fn indices_are_offset_by_shape_base() {
        let mut arena = GeometryArena::new(8);

        let mut w = arena.begin_shape();
        for _ in 0..3 {
            w.vertex(Vec2::ZERO, Color::white());
        }
        w.indices(&[0, 1, 2]);

        let mut w = arena.begin_shape();
        for _ in 0..3 {
            w.vertex(Vec2::ONE, Color::white());
        }
        w.indices(&[0, 1, 2]);

        let (vertices, indices) = arena.filled();
        assert_eq!(vertices.len(), 6);
        assert_eq!(indices, &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn fits_tracks_both_cursors() {
        let mut arena = GeometryArena::new(4);
        let mut w = arena.begin_shape();
        w.vertex(Vec2::ZERO, Color::white());
        w.indices(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        assert!(arena.fits(3, 2));
        assert!(!arena.fits(4, 0));
        assert!(!arena.fits(0, 3));

        arena.reset();
        assert!(arena.is_empty());
        assert!(arena.fits(4, 12));
    }
}
