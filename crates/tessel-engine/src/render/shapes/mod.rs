//! Shape generators.
//!
//! Each module adds `draw_*` / `fill_*` methods to
//! [`PrimitiveBatcher`](super::PrimitiveBatcher). Lines are the primitive every
//! outline is built from; fills write their own triangles.

mod common;

mod circle;
mod line;
mod polygon;
mod rect;
