//! Headless GPU setup and offscreen render targets.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a surface
//! - owning the fixed-size texture scenes are drawn into
//! - reading rendered pixels back to the CPU

mod gpu;
mod target;

pub use gpu::{Gpu, GpuInit};
pub use target::{fit_rect, OffscreenTarget};
