//! Tessel engine crate.
//!
//! Immediate-mode 2D shape batching on top of wgpu: shapes are tessellated on
//! the CPU into fixed-size buffers and submitted as a few large triangle draws.

pub mod camera;
pub mod device;
pub mod error;

pub mod coords;
pub mod logging;
pub mod paint;
pub mod render;
