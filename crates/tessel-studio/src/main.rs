//! Renders a sample scene with every shape the batcher supports and writes it
//! to a PNG.
//!
//! Usage: `tessel-studio [out.png] [width] [height]`

use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3};

use tessel_engine::camera::Camera;
use tessel_engine::coords::{Rect, Viewport};
use tessel_engine::device::{Gpu, GpuInit, OffscreenTarget};
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::paint::Color;
use tessel_engine::render::{BatcherConfig, GraphicsDevice, PrimitiveBatcher, WgpuShapeDevice};

struct StudioArgs {
    output: String,
    width: u32,
    height: u32,
}

impl Default for StudioArgs {
    fn default() -> Self {
        Self {
            output: "tessel.png".to_string(),
            width: 960,
            height: 540,
        }
    }
}

impl StudioArgs {
    fn from_env() -> Result<Self> {
        let mut args = Self::default();
        let mut it = std::env::args().skip(1);

        if let Some(output) = it.next() {
            args.output = output;
        }
        if let Some(width) = it.next() {
            args.width = width.parse().with_context(|| format!("invalid width {width:?}"))?;
        }
        if let Some(height) = it.next() {
            args.height = height.parse().with_context(|| format!("invalid height {height:?}"))?;
        }
        Ok(args)
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args = StudioArgs::from_env()?;
    let gpu = Gpu::new_headless_blocking(GpuInit::default())?;

    let target = OffscreenTarget::new(&gpu, args.width, args.height);
    target.clear(&gpu, Color::from_srgb_u8(24, 26, 33, 255));

    let mut device = WgpuShapeDevice::new(gpu.device().clone(), gpu.queue().clone());
    device.set_target(target.view().clone(), target.format(), target.viewport());

    let mut batcher = PrimitiveBatcher::new(device, BatcherConfig::default())?;

    draw_pixel_pass(&mut batcher)?;

    let mut camera = Camera::new(target.viewport());
    camera.set_zoom(4.0 / 3.0);
    camera.move_by(Vec2::new(-80.0, -40.0));
    draw_camera_pass(&mut batcher, &mut camera)?;

    let stats = batcher.stats();
    log::info!(
        "{} shapes in {} draw calls ({} forced by a full buffer)",
        stats.shapes,
        stats.flushes,
        stats.overflow_flushes
    );
    batcher.dispose();

    let pixels = target.read_rgba8(&gpu)?;
    let image = image::RgbaImage::from_raw(target.width(), target.height(), pixels)
        .context("readback size does not match the target")?;
    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output))?;

    let shown = target.fit_rect(Viewport::new(1920.0, 1080.0));
    log::info!(
        "wrote {} ({}x{}); on a 1920x1080 display it fills {}x{} at ({}, {})",
        args.output,
        target.width(),
        target.height(),
        shown.size.x,
        shown.size.y,
        shown.origin.x,
        shown.origin.y
    );
    Ok(())
}

/// Pixel-space pass: a grid of lines, rectangles, circles and polygons.
fn draw_pixel_pass<D: GraphicsDevice>(batcher: &mut PrimitiveBatcher<D>) -> Result<()> {
    let size = batcher.device().viewport();
    batcher.begin(None)?;

    // With the shapes below, the grid spills past one buffer.
    let grid = Color::from_srgb_u8(60, 64, 78, 255);
    let mut x = 0.0;
    while x <= size.width {
        batcher.draw_line_xy(x, 0.0, x, size.height, 1.0, grid)?;
        x += 8.0;
    }
    let mut y = 0.0;
    while y <= size.height {
        batcher.draw_line_xy(0.0, y, size.width, y, 1.0, grid)?;
        y += 8.0;
    }

    batcher.fill_rect(Rect::new(40.0, 40.0, 180.0, 110.0), Color::from_srgb_u8(46, 134, 222, 255))?;
    batcher.draw_rect(Rect::new(40.0, 40.0, 180.0, 110.0), 4.0, Color::white())?;

    batcher.fill_circle(Vec2::new(340.0, 95.0), 55.0, 64, Color::from_srgb_u8(235, 77, 75, 255))?;
    batcher.draw_circle(Vec2::new(340.0, 95.0), 70.0, 48, 3.0, Color::white())?;

    for (i, thickness) in [1.0, 2.0, 4.0, 7.0, 10.0].into_iter().enumerate() {
        let y = 200.0 + i as f32 * 24.0;
        batcher.draw_line_xy(40.0, y, 260.0, y + 12.0, thickness, Color::from_srgb_u8(249, 202, 36, 255))?;
    }

    let star = star_points(5, 60.0, 26.0);
    let at = Mat4::from_translation(Vec3::new(360.0, 270.0, 0.0));
    batcher.fill_polygon(&star, &star_triangles(5), at, Color::from_srgb_u8(106, 176, 76, 255))?;
    batcher.draw_polygon(&star, at, 2.0, Color::white())?;

    // Translucent overlap to exercise premultiplied blending.
    batcher.fill_circle(Vec2::new(400.0, 120.0), 40.0, 48, Color::white().with_opacity(0.35))?;

    batcher.end()?;
    Ok(())
}

/// World-space pass through a zoomed perspective camera.
fn draw_camera_pass<D: GraphicsDevice>(
    batcher: &mut PrimitiveBatcher<D>,
    camera: &mut Camera,
) -> Result<()> {
    batcher.begin(Some(camera))?;

    let origin = Vec2::new(620.0, 320.0);
    for ring in 0..6 {
        let radius = 20.0 + ring as f32 * 14.0;
        let color = Color::from_srgb_u8(130 + ring * 20, 90, 220 - ring * 25, 255);
        batcher.draw_circle(origin, radius, 32 + ring as usize * 16, 2.0, color)?;
    }

    let hexagon: Vec<Vec2> = (0..6)
        .map(|i| {
            let a = i as f32 * std::f32::consts::TAU / 6.0;
            Vec2::new(a.cos(), a.sin()) * 30.0
        })
        .collect();
    let fan = [0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 5];
    for col in 0..4 {
        let at = Mat4::from_translation(Vec3::new(560.0 + col as f32 * 70.0, 470.0, 0.0))
            * Mat4::from_rotation_z(col as f32 * 0.2);
        batcher.fill_polygon(&hexagon, &fan, at, Color::from_srgb_u8(72, 219, 251, 200))?;
    }

    batcher.end()?;
    Ok(())
}

/// Alternating outer/inner points of a star centered on the origin.
fn star_points(tips: usize, outer: f32, inner: f32) -> Vec<Vec2> {
    (0..tips * 2)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let a = i as f32 * std::f32::consts::PI / tips as f32 - std::f32::consts::FRAC_PI_2;
            Vec2::new(a.cos(), a.sin()) * r
        })
        .collect()
}

/// Triangulation of a `star_points` outline: one triangle per tip, plus a fan
/// over the inner points.
fn star_triangles(tips: usize) -> Vec<u32> {
    let n = (tips * 2) as u32;
    let mut indices = Vec::new();
    for i in (0..n).step_by(2) {
        indices.extend_from_slice(&[(i + n - 1) % n, i, i + 1]);
    }
    // Inner points are the odd ones.
    let inner: Vec<u32> = (1..n).step_by(2).collect();
    for w in 1..inner.len() - 1 {
        indices.extend_from_slice(&[inner[0], inner[w], inner[w + 1]]);
    }
    indices
}
