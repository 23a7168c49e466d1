use anyhow::{Context, Result};

use crate::coords::{Rect, Viewport};
use crate::paint::Color;

use super::Gpu;

/// Fixed-size render texture that stands in for the screen.
///
/// Scenes are drawn at this logical resolution and later scaled into whatever
/// backbuffer presents them, see [`fit_rect`](Self::fit_rect).
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub const MIN_DIMENSION: u32 = 64;
    pub const MAX_DIMENSION: u32 = 4096;
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Creates a `width × height` target; both sides are clamped to 64..=4096.
    pub fn new(gpu: &Gpu, width: u32, height: u32) -> Self {
        let width = clamp_dimension(width);
        let height = clamp_dimension(height);

        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("tessel offscreen target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("OffscreenTarget: {width}x{height} {:?}", Self::FORMAT);

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        Self::FORMAT
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }

    /// Fills the whole target with `color`.
    pub fn clear(&self, gpu: &Gpu, color: Color) {
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessel clear encoder"),
            });

        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tessel clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r as f64,
                            g: color.g as f64,
                            b: color.b as f64,
                            a: color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        gpu.queue().submit(std::iter::once(encoder.finish()));
    }

    /// Copies the target back to the CPU as tightly packed RGBA8 rows. Blocks
    /// until the GPU is done.
    pub fn read_rgba8(&self, gpu: &Gpu) -> Result<Vec<u8>> {
        let unpadded_bytes_per_row = self.width * 4;
        let bytes_per_row = padded_bytes_per_row(self.width);

        let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel readback buffer"),
            size: (bytes_per_row * self.height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessel readback encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        gpu.queue().submit(std::iter::once(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        let slice = buffer.slice(..);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        gpu.device()
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .context("failed waiting for the GPU to finish readback")?;

        rx.recv()
            .context("readback callback was dropped")?
            .context("failed to map readback buffer")?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * self.height) as usize);
        for row in data.chunks(bytes_per_row as usize).take(self.height as usize) {
            pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        drop(data);
        buffer.unmap();

        Ok(pixels)
    }

    /// Largest rectangle with this target's aspect ratio that fits centered in
    /// a `backbuffer` of another size. Bars go left/right or top/bottom.
    pub fn fit_rect(&self, backbuffer: Viewport) -> Rect {
        fit_rect(self.viewport(), backbuffer)
    }
}

#[inline]
fn clamp_dimension(value: u32) -> u32 {
    value.clamp(OffscreenTarget::MIN_DIMENSION, OffscreenTarget::MAX_DIMENSION)
}

/// Row pitch for texture → buffer copies of an RGBA8 texture.
fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

/// Letterbox/pillarbox placement of `source` inside `dest`, snapped to whole pixels.
pub fn fit_rect(source: Viewport, dest: Viewport) -> Rect {
    let dest_aspect = dest.width / dest.height;
    let source_aspect = source.width / source.height;

    let (mut x, mut y, mut w, mut h) = (0.0, 0.0, dest.width, dest.height);
    if dest_aspect > source_aspect {
        w = h * source_aspect;
        x = (dest.width - w) / 2.0;
    } else if dest_aspect < source_aspect {
        h = w / source_aspect;
        y = (dest.height - h) / 2.0;
    }

    Rect::new(x.trunc(), y.trunc(), w.trunc(), h.trunc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_are_clamped() {
        assert_eq!(clamp_dimension(1), 64);
        assert_eq!(clamp_dimension(640), 640);
        assert_eq!(clamp_dimension(10_000), 4096);
    }

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(640), 2560);
    }

    #[test]
    fn wider_backbuffer_gets_side_bars() {
        let r = fit_rect(Viewport::new(800.0, 400.0), Viewport::new(1000.0, 400.0));
        assert_eq!(r, Rect::new(100.0, 0.0, 800.0, 400.0));
    }

    #[test]
    fn taller_backbuffer_gets_top_and_bottom_bars() {
        let r = fit_rect(Viewport::new(1600.0, 800.0), Viewport::new(800.0, 800.0));
        assert_eq!(r, Rect::new(0.0, 200.0, 800.0, 400.0));
    }

    #[test]
    fn matching_aspect_fills_the_backbuffer() {
        let r = fit_rect(Viewport::new(320.0, 180.0), Viewport::new(1280.0, 720.0));
        assert_eq!(r, Rect::new(0.0, 0.0, 1280.0, 720.0));
    }
}
