//! In-memory [`GraphicsDevice`] that records every submitted batch.

use std::cell::Cell;
use std::rc::Rc;

use crate::coords::Viewport;

use super::backend::{DrawBatch, GraphicsDevice, ViewProjection};
use super::vertex::ShapeVertex;

/// Owned copy of one submitted draw.
#[derive(Debug, Clone)]
pub(crate) struct RecordedDraw {
    pub transform: ViewProjection,
    pub vertices: Vec<ShapeVertex>,
    pub indices: Vec<u32>,
}

impl RecordedDraw {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertices referenced by triangle `t`, in index order.
    pub fn triangle(&self, t: usize) -> [ShapeVertex; 3] {
        let i = &self.indices[t * 3..t * 3 + 3];
        [
            self.vertices[i[0] as usize],
            self.vertices[i[1] as usize],
            self.vertices[i[2] as usize],
        ]
    }
}

#[derive(Debug)]
pub(crate) struct RecordingDevice {
    pub viewport: Viewport,
    pub draws: Vec<RecordedDraw>,
    pub fail_draws: bool,
    releases: Rc<Cell<usize>>,
}

impl RecordingDevice {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            draws: Vec::new(),
            fail_draws: false,
            releases: Rc::new(Cell::new(0)),
        }
    }

    /// Shared release counter that outlives the device.
    pub fn release_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.releases)
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new(Viewport::new(640.0, 480.0))
    }
}

impl GraphicsDevice for RecordingDevice {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn draw_indexed_triangles(&mut self, batch: &DrawBatch<'_>) -> anyhow::Result<()> {
        if self.fail_draws {
            anyhow::bail!("recording device told to fail");
        }
        self.draws.push(RecordedDraw {
            transform: batch.transform,
            vertices: batch.vertices.to_vec(),
            indices: batch.indices.to_vec(),
        });
        Ok(())
    }

    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}
