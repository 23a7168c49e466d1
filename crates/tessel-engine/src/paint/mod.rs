//! Color model shared by the batcher and GPU backends.
//!
//! Colors are linear with premultiplied alpha, which is what the shape pipeline
//! blends with.

pub mod color;

pub use color::Color;
