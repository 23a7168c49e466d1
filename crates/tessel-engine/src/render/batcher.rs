use crate::camera::Camera;
use crate::error::{BatchError, BatchResult};

use super::arena::{GeometryArena, ShapeWriter};
use super::backend::{DrawBatch, GraphicsDevice, ViewProjection};

/// Batch lifecycle state.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BatchState {
    #[default]
    Stopped,
    Started,
}

/// Batcher construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BatcherConfig {
    /// Vertex buffer capacity. The index buffer holds three times as many entries.
    pub max_vertices: usize,

    /// Line thickness range; requests outside it are clamped.
    pub min_thickness: f32,
    pub max_thickness: f32,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            max_vertices: 1024,
            min_thickness: 1.0,
            max_thickness: 10.0,
        }
    }
}

impl BatcherConfig {
    /// Smallest buffer that still holds one line quad.
    pub const MIN_VERTICES: usize = 4;

    pub fn validate(&self) -> BatchResult<()> {
        if self.max_vertices < Self::MIN_VERTICES {
            return Err(BatchError::InvalidArgument(format!(
                "max_vertices must be at least {}, got {}",
                Self::MIN_VERTICES,
                self.max_vertices
            )));
        }
        // Indices are u32 on the GPU side.
        if self.max_vertices > u32::MAX as usize / 3 {
            return Err(BatchError::InvalidArgument(format!(
                "max_vertices {} overflows 32-bit indices",
                self.max_vertices
            )));
        }
        let (min, max) = (self.min_thickness, self.max_thickness);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(BatchError::InvalidArgument(format!(
                "thickness range must satisfy 0 < min <= max, got [{min}, {max}]"
            )));
        }
        Ok(())
    }
}

/// Counters accumulated over the batcher's lifetime.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BatchStats {
    /// Draw calls submitted.
    pub flushes: u64,
    /// Flushes forced by a shape that did not fit.
    pub overflow_flushes: u64,
    /// Shapes written.
    pub shapes: u64,
}

/// Immediate-mode 2D shape batcher.
///
/// Shapes are tessellated into a fixed-size vertex/index arena and submitted to
/// the device as one indexed triangle list per flush. A shape that does not fit
/// behind the current cursors flushes the batch first, so large frames turn
/// into a handful of draw calls without any shape being split.
///
/// ```ignore
/// batcher.begin(None)?;
/// batcher.draw_line(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), 2.0, Color::white())?;
/// batcher.fill_circle(Vec2::new(50.0, 50.0), 20.0, 32, Color::red())?;
/// batcher.end()?;
/// ```
pub struct PrimitiveBatcher<D: GraphicsDevice> {
    device: D,
    config: BatcherConfig,
    arena: GeometryArena,
    shape_count: usize,
    state: BatchState,
    transform: ViewProjection,
    stats: BatchStats,
    disposed: bool,
}

impl<D: GraphicsDevice> PrimitiveBatcher<D> {
    /// Allocates the batch buffers. This is the only allocation the batcher makes.
    pub fn new(device: D, config: BatcherConfig) -> BatchResult<Self> {
        config.validate()?;

        log::debug!(
            "PrimitiveBatcher: {} vertices / {} indices per batch",
            config.max_vertices,
            config.max_vertices * 3
        );

        Ok(Self {
            device,
            arena: GeometryArena::new(config.max_vertices),
            config,
            shape_count: 0,
            state: BatchState::Stopped,
            transform: ViewProjection::default(),
            stats: BatchStats::default(),
            disposed: false,
        })
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn state(&self) -> BatchState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &BatcherConfig {
        &self.config
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.arena.vertex_count()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.arena.index_count()
    }

    #[inline]
    pub fn shape_count(&self) -> usize {
        self.shape_count
    }

    /// Vertex capacity; the index capacity is three times this.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.vertex_capacity()
    }

    #[inline]
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Transform adopted by the last `begin`.
    #[inline]
    pub fn transform(&self) -> ViewProjection {
        self.transform
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Starts a batch.
    ///
    /// Without a camera, shapes are in pixel space of the device's current
    /// viewport (top-left origin). With a camera, its matrices are refreshed and
    /// adopted.
    pub fn begin(&mut self, camera: Option<&mut Camera>) -> BatchResult<()> {
        if self.disposed {
            return Err(invalid_state("batcher has been disposed"));
        }
        if self.state == BatchState::Started {
            return Err(invalid_state("batching is already started"));
        }

        self.transform = match camera {
            None => ViewProjection::pixel_space(self.device.viewport()),
            Some(camera) => {
                camera.update_matrices();
                ViewProjection::new(camera.view(), camera.projection())
            }
        };

        self.state = BatchState::Started;
        Ok(())
    }

    /// Flushes whatever is buffered and stops the batch.
    ///
    /// The batch is stopped and the buffers rewound even if the device rejects
    /// the final draw; that error is still returned.
    pub fn end(&mut self) -> BatchResult<()> {
        if self.state != BatchState::Started {
            return Err(invalid_state("batching was never started"));
        }

        let result = self.flush();
        if result.is_err() {
            self.arena.reset();
            self.shape_count = 0;
        }
        self.state = BatchState::Stopped;
        result
    }

    /// Submits the buffered shapes as one draw call and rewinds the buffers.
    ///
    /// Does nothing when no shape has been written since the last flush.
    pub fn flush(&mut self) -> BatchResult<()> {
        self.submit(false)
    }

    /// Makes room for a shape of `vertices`/`indices`, flushing first if the
    /// current batch cannot take it. Returns whether a flush happened.
    ///
    /// A shape larger than the whole buffer is rejected; shapes are never split.
    pub fn ensure_space(&mut self, vertices: usize, indices: usize) -> BatchResult<bool> {
        if let Err(err) = self.arena.check_shape(vertices, indices) {
            log::warn!("{err}");
            return Err(err);
        }

        if self.arena.fits(vertices, indices) {
            return Ok(false);
        }

        self.submit(true)?;
        Ok(true)
    }

    fn submit(&mut self, overflow: bool) -> BatchResult<()> {
        if self.shape_count == 0 {
            return Ok(());
        }
        self.ensure_started()?;

        let (vertices, indices) = self.arena.filled();
        let batch = DrawBatch {
            transform: self.transform,
            vertices,
            indices,
        };

        log::trace!(
            "flush: {} shapes, {} vertices, {} triangles{}",
            self.shape_count,
            batch.vertex_count(),
            batch.triangle_count(),
            if overflow { " (buffer full)" } else { "" }
        );

        self.device.draw_indexed_triangles(&batch)?;

        self.arena.reset();
        self.shape_count = 0;
        self.stats.flushes += 1;
        if overflow {
            self.stats.overflow_flushes += 1;
        }
        Ok(())
    }

    /// Releases the device's GPU resources. Safe to call more than once; also
    /// runs on drop.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if self.shape_count > 0 {
            log::debug!("PrimitiveBatcher disposed with {} unflushed shapes", self.shape_count);
        }

        self.device.release();
        self.arena.reset();
        self.shape_count = 0;
        self.state = BatchState::Stopped;
        self.disposed = true;

        log::debug!("PrimitiveBatcher disposed");
    }

    // ── shape plumbing ────────────────────────────────────────────────────

    pub(crate) fn ensure_started(&self) -> BatchResult<()> {
        if self.state != BatchState::Started {
            return Err(invalid_state("batching was never started"));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn clamp_thickness(&self, thickness: f32) -> f32 {
        // NaN falls back to the thinnest line.
        if thickness.is_nan() {
            return self.config.min_thickness;
        }
        thickness.clamp(self.config.min_thickness, self.config.max_thickness)
    }

    /// Reserves room for one shape and lets `write` fill it.
    ///
    /// `write` must emit exactly `vertices` vertices and `indices` indices.
    pub(crate) fn write_shape<F>(&mut self, vertices: usize, indices: usize, write: F) -> BatchResult<()>
    where
        F: FnOnce(&mut ShapeWriter<'_>),
    {
        self.ensure_started()?;
        self.ensure_space(vertices, indices)?;

        let before = (self.arena.vertex_count(), self.arena.index_count());
        write(&mut self.arena.begin_shape());
        debug_assert_eq!(
            (self.arena.vertex_count() - before.0, self.arena.index_count() - before.1),
            (vertices, indices),
            "shape wrote a different amount than it reserved"
        );

        self.shape_count += 1;
        self.stats.shapes += 1;
        Ok(())
    }
}

impl<D: GraphicsDevice> Drop for PrimitiveBatcher<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn invalid_state(message: &'static str) -> BatchError {
    log::warn!("PrimitiveBatcher: {message}");
    BatchError::InvalidState(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::coords::{Rect, Vec2, Viewport};
    use crate::error::BufferKind;
    use crate::paint::Color;
    use crate::render::test_device::RecordingDevice;
    use glam::{Mat4, Vec3};

    fn batcher(max_vertices: usize) -> PrimitiveBatcher<RecordingDevice> {
        let config = BatcherConfig { max_vertices, ..BatcherConfig::default() };
        PrimitiveBatcher::new(RecordingDevice::new(Viewport::new(800.0, 600.0)), config)
            .expect("valid config")
    }

    fn unit_rect() -> Rect {
        Rect::new(0.0, 0.0, 10.0, 10.0)
    }

    // ── config ────────────────────────────────────────────────────────────

    #[test]
    fn default_config_matches_documented_values() {
        let b = batcher(1024);
        assert_eq!(b.capacity(), 1024);
        assert_eq!(b.config().min_thickness, 1.0);
        assert_eq!(b.config().max_thickness, 10.0);
        assert_eq!(BatcherConfig::default().max_vertices, 1024);
    }

    #[test]
    fn config_rejects_tiny_buffers_and_inverted_ranges() {
        let too_small = BatcherConfig { max_vertices: 3, ..BatcherConfig::default() };
        assert!(matches!(too_small.validate(), Err(BatchError::InvalidArgument(_))));

        let inverted = BatcherConfig { min_thickness: 5.0, max_thickness: 2.0, ..BatcherConfig::default() };
        assert!(matches!(inverted.validate(), Err(BatchError::InvalidArgument(_))));

        let zero = BatcherConfig { min_thickness: 0.0, ..BatcherConfig::default() };
        assert!(matches!(
            PrimitiveBatcher::new(RecordingDevice::default(), zero),
            Err(BatchError::InvalidArgument(_))
        ));
    }

    // ── state machine ─────────────────────────────────────────────────────

    #[test]
    fn shapes_before_begin_are_rejected() {
        let mut b = batcher(64);
        assert!(matches!(
            b.fill_rect(unit_rect(), Color::white()),
            Err(BatchError::InvalidState(_))
        ));
        assert!(matches!(
            b.draw_line(Vec2::ZERO, Vec2::X, 1.0, Color::white()),
            Err(BatchError::InvalidState(_))
        ));
        assert!(matches!(
            b.fill_circle(Vec2::ZERO, 5.0, 16, Color::white()),
            Err(BatchError::InvalidState(_))
        ));
        assert_eq!(b.vertex_count(), 0);
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut b = batcher(64);
        b.begin(None).unwrap();
        assert!(matches!(b.begin(None), Err(BatchError::InvalidState(_))));
        assert_eq!(b.state(), BatchState::Started);
    }

    #[test]
    fn end_without_begin_is_rejected() {
        let mut b = batcher(64);
        assert!(matches!(b.end(), Err(BatchError::InvalidState(_))));
    }

    #[test]
    fn batcher_is_reusable_across_frames() {
        let mut b = batcher(64);
        for _ in 0..3 {
            b.begin(None).unwrap();
            b.fill_rect(unit_rect(), Color::white()).unwrap();
            b.end().unwrap();
            assert_eq!(b.state(), BatchState::Stopped);
        }
        assert_eq!(b.device().draws.len(), 3);
    }

    // ── flush ─────────────────────────────────────────────────────────────

    #[test]
    fn flush_without_shapes_is_a_no_op() {
        let mut b = batcher(64);
        b.flush().unwrap(); // stopped, nothing buffered
        b.begin(None).unwrap();
        b.flush().unwrap();
        b.flush().unwrap();
        assert!(b.device().draws.is_empty());
        assert_eq!((b.vertex_count(), b.index_count(), b.shape_count()), (0, 0, 0));
        assert_eq!(b.stats().flushes, 0);
    }

    #[test]
    fn mid_batch_flush_keeps_batch_started() {
        let mut b = batcher(64);
        b.begin(None).unwrap();
        b.fill_rect(unit_rect(), Color::white()).unwrap();
        b.flush().unwrap();
        assert_eq!(b.state(), BatchState::Started);
        assert_eq!(b.vertex_count(), 0);

        b.fill_rect(unit_rect(), Color::white()).unwrap();
        b.end().unwrap();
        assert_eq!(b.device().draws.len(), 2);
    }

    #[test]
    fn end_flushes_everything_in_one_draw() {
        let mut b = batcher(1024);
        b.begin(None).unwrap();
        for i in 0..10 {
            b.fill_rect(Rect::new(i as f32 * 12.0, 0.0, 10.0, 10.0), Color::white()).unwrap();
        }
        b.end().unwrap();

        let draws = &b.device().draws;
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices.len(), 40);
        assert_eq!(draws[0].indices.len(), 60);
        assert_eq!(draws[0].triangle_count(), 20);
    }

    // ── overflow ──────────────────────────────────────────────────────────

    #[test]
    fn overflow_triggers_exactly_one_flush() {
        let mut b = batcher(4);
        b.begin(None).unwrap();

        b.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::red()).unwrap();
        assert!(b.device().draws.is_empty());

        b.fill_rect(Rect::new(20.0, 0.0, 10.0, 10.0), Color::blue()).unwrap();

        let draws = &b.device().draws;
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices.len(), 4);
        assert!(draws[0].vertices.iter().all(|v| v.color == Color::red().to_array()));
        assert_eq!(b.stats().overflow_flushes, 1);

        // Only the second rectangle is left, starting at cursor zero.
        assert_eq!(b.vertex_count(), 4);
        assert_eq!(b.index_count(), 6);
        assert_eq!(b.shape_count(), 1);
    }

    #[test]
    fn shape_after_overflow_starts_at_index_zero() {
        let mut b = batcher(4);
        b.begin(None).unwrap();
        b.fill_rect(unit_rect(), Color::white()).unwrap();
        b.fill_rect(unit_rect(), Color::white()).unwrap();
        b.end().unwrap();

        let draws = &b.device().draws;
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[1].indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn cursors_never_exceed_capacity() {
        let mut b = batcher(10);
        b.begin(None).unwrap();
        for i in 0..50 {
            match i % 3 {
                0 => b.fill_rect(unit_rect(), Color::white()).unwrap(),
                1 => b.fill_circle(Vec2::new(5.0, 5.0), 4.0, 7, Color::white()).unwrap(),
                _ => b.draw_line(Vec2::ZERO, Vec2::new(3.0, 4.0), 2.0, Color::white()).unwrap(),
            }
            assert!(b.vertex_count() <= b.capacity());
            assert!(b.index_count() <= 3 * b.capacity());
        }
        b.end().unwrap();
        for draw in &b.device().draws {
            assert!(draw.vertices.len() <= 10);
            assert!(draw.indices.iter().all(|&i| (i as usize) < draw.vertices.len()));
        }
    }

    #[test]
    fn ensure_space_rejects_shapes_larger_than_buffer() {
        let mut b = batcher(8);
        b.begin(None).unwrap();
        b.fill_rect(unit_rect(), Color::white()).unwrap();

        assert!(matches!(
            b.ensure_space(9, 3),
            Err(BatchError::Capacity { buffer: BufferKind::Vertex, required: 9, capacity: 8 })
        ));
        // No flush and no writes happened.
        assert!(b.device().draws.is_empty());
        assert_eq!(b.vertex_count(), 4);
    }

    #[test]
    fn oversized_circle_fails_without_partial_writes() {
        let mut b = batcher(8);
        b.begin(None).unwrap();
        b.fill_rect(unit_rect(), Color::white()).unwrap();

        let err = b.fill_circle(Vec2::ZERO, 10.0, 16, Color::white()).unwrap_err();
        assert!(matches!(err, BatchError::Capacity { buffer: BufferKind::Vertex, .. }));
        assert_eq!(b.vertex_count(), 4);
        assert_eq!(b.shape_count(), 1);
        assert!(b.device().draws.is_empty());
    }

    #[test]
    fn ensure_space_reports_whether_it_flushed() {
        let mut b = batcher(8);
        b.begin(None).unwrap();
        assert!(!b.ensure_space(4, 6).unwrap());
        b.fill_rect(unit_rect(), Color::white()).unwrap();
        b.fill_rect(unit_rect(), Color::white()).unwrap();
        assert!(b.ensure_space(1, 3).unwrap());
        assert_eq!(b.vertex_count(), 0);
    }

    #[test]
    fn index_overflow_flushes_while_vertices_still_fit() {
        // 8 vertices, 24 indices: the second triangle set fits by vertex count only.
        let mut b = batcher(8);
        b.begin(None).unwrap();
        let tri = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)];
        let indices = [0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2];

        b.fill_polygon(&tri, &indices, Mat4::IDENTITY, Color::white()).unwrap();
        assert!(b.device().draws.is_empty());
        b.fill_polygon(&tri, &indices, Mat4::IDENTITY, Color::white()).unwrap();

        assert_eq!(b.device().draws.len(), 1);
        assert_eq!(b.device().draws[0].vertices.len(), 3);
        assert_eq!(b.device().draws[0].indices.len(), 15);
        assert_eq!(b.vertex_count(), 3);
        assert_eq!(b.index_count(), 15);
        assert_eq!(b.stats().overflow_flushes, 1);
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn begin_without_camera_uses_pixel_space_projection() {
        let mut b = batcher(64);
        b.begin(None).unwrap();
        b.fill_rect(unit_rect(), Color::white()).unwrap();
        b.end().unwrap();

        let t = b.device().draws[0].transform;
        assert_eq!(t.view, Mat4::IDENTITY);
        assert_eq!(t.projection, Viewport::new(800.0, 600.0).orthographic());
    }

    #[test]
    fn begin_with_camera_adopts_refreshed_matrices() {
        let mut b = batcher(64);
        let mut camera = Camera::new(Viewport::new(800.0, 600.0));
        camera.move_by(Vec2::new(100.0, 0.0));

        b.begin(Some(&mut camera)).unwrap();
        b.fill_rect(unit_rect(), Color::white()).unwrap();
        b.end().unwrap();

        let t = b.device().draws[0].transform;
        assert_eq!(t.view, camera.view());
        assert_eq!(t.projection, camera.projection());

        // The moved camera now looks at x = 500.
        let ndc = t.combined().project_point3(Vec3::new(500.0, 300.0, 0.0));
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }

    // ── device failures & disposal ────────────────────────────────────────

    #[test]
    fn device_failure_propagates_and_end_still_stops() {
        let mut b = batcher(64);
        b.begin(None).unwrap();
        b.fill_rect(unit_rect(), Color::white()).unwrap();
        b.device_mut().fail_draws = true;

        let err = b.end().unwrap_err();
        assert!(matches!(err, BatchError::Device(_)));
        assert_eq!(b.state(), BatchState::Stopped);
        assert_eq!(b.vertex_count(), 0);

        b.device_mut().fail_draws = false;
        b.begin(None).unwrap();
        b.end().unwrap();
    }

    #[test]
    fn dispose_is_idempotent_and_runs_on_drop() {
        let device = RecordingDevice::default();
        let releases = device.release_counter();

        let mut b = PrimitiveBatcher::new(device, BatcherConfig::default()).unwrap();
        b.dispose();
        b.dispose();
        assert_eq!(releases.get(), 1);
        assert!(matches!(b.begin(None), Err(BatchError::InvalidState(_))));
        drop(b);
        assert_eq!(releases.get(), 1);

        let device = RecordingDevice::default();
        let releases = device.release_counter();
        drop(PrimitiveBatcher::new(device, BatcherConfig::default()).unwrap());
        assert_eq!(releases.get(), 1);
    }
}
