//! Batched shape rendering.
//!
//! Shapes are tessellated on the CPU into [`ShapeVertex`] triangles and handed
//! to a [`GraphicsDevice`] one batch at a time.
//!
//! Convention:
//! - Without a camera, geometry is in pixels (top-left origin, +Y down).
//! - The vertex shader applies `projection * view` from the active batch.

mod arena;
mod backend;
mod batcher;
mod gpu;
mod shapes;
mod vertex;

#[cfg(test)]
mod test_device;

pub use arena::{GeometryArena, ShapeWriter, INDICES_PER_VERTEX};
pub use backend::{DrawBatch, GraphicsDevice, ViewProjection};
pub use batcher::{BatchState, BatchStats, BatcherConfig, PrimitiveBatcher};
pub use gpu::WgpuShapeDevice;
pub use vertex::ShapeVertex;
