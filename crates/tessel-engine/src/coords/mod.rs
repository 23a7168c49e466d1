//! Coordinate and geometry types shared by the batcher, camera, and targets.
//!
//! Canonical pixel space:
//! - Origin top-left
//! - +X right, +Y down
//!
//! Vectors and matrices come from `glam`; matrices are column-major everywhere.

mod rect;
mod viewport;

pub use glam::{Mat4, Vec2, Vec3};
pub use rect::Rect;
pub use viewport::Viewport;
