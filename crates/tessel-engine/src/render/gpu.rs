use anyhow::Context;
use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;

use super::backend::{DrawBatch, GraphicsDevice, ViewProjection};
use super::vertex::ShapeVertex;

/// Smallest vertex buffer the backend allocates.
const MIN_VERTEX_CAPACITY: usize = 1024;

/// wgpu implementation of [`GraphicsDevice`].
///
/// Draws land in whatever target was last bound with
/// [`set_target`](Self::set_target). Every draw records and submits its own
/// render pass with `LoadOp::Load`, so flushes in the middle of a frame keep
/// earlier geometry and see the buffer contents written for them.
///
/// GPU resources are created lazily on the first draw and rebuilt when the
/// target format changes.
pub struct WgpuShapeDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,

    target: Option<BoundTarget>,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    view_proj_ubo: Option<wgpu::Buffer>,

    vertex_buffer: Option<wgpu::Buffer>,
    vertex_capacity: usize,
    index_buffer: Option<wgpu::Buffer>,
    index_capacity: usize,
}

struct BoundTarget {
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    viewport: Viewport,
}

impl WgpuShapeDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            target: None,
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            view_proj_ubo: None,
            vertex_buffer: None,
            vertex_capacity: 0,
            index_buffer: None,
            index_capacity: 0,
        }
    }

    /// Binds the texture that subsequent draws render into.
    pub fn set_target(&mut self, view: wgpu::TextureView, format: wgpu::TextureFormat, viewport: Viewport) {
        self.target = Some(BoundTarget { view, format, viewport });
    }

    /// Unbinds the current target. Draws fail until a new one is bound.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    #[inline]
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    fn ensure_pipeline(&mut self, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessel shape shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shape.wgsl").into()),
        });

        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tessel shape bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ViewProjUniform>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("tessel shape pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessel shape pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[ShapeVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            // Outlines and fans wind both ways; nothing is culled.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("WgpuShapeDevice: built pipeline for {format:?}");

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.view_proj_ubo = None;
    }

    fn ensure_bindings(&mut self) {
        if self.bind_group.is_some() && self.view_proj_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let ubo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel shape view-proj ubo"),
            size: std::mem::size_of::<ViewProjUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessel shape bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        self.view_proj_ubo = Some(ubo);
        self.bind_group = Some(bind_group);
    }

    fn ensure_geometry_capacity(&mut self, vertices: usize, indices: usize) {
        if vertices > self.vertex_capacity || self.vertex_buffer.is_none() {
            let cap = vertices.next_power_of_two().max(MIN_VERTEX_CAPACITY);
            log::debug!("WgpuShapeDevice: vertex buffer grows to {cap}");
            self.vertex_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessel shape vbo"),
                size: (cap * std::mem::size_of::<ShapeVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vertex_capacity = cap;
        }

        if indices > self.index_capacity || self.index_buffer.is_none() {
            let cap = indices.next_power_of_two().max(MIN_VERTEX_CAPACITY * 3);
            log::debug!("WgpuShapeDevice: index buffer grows to {cap}");
            self.index_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessel shape ibo"),
                size: (cap * std::mem::size_of::<u32>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.index_capacity = cap;
        }
    }

    fn write_view_proj(&self, transform: ViewProjection) {
        let Some(ubo) = self.view_proj_ubo.as_ref() else { return };
        let u = ViewProjUniform {
            view_proj: transform.combined().to_cols_array_2d(),
        };
        self.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }
}

impl GraphicsDevice for WgpuShapeDevice {
    fn viewport(&self) -> Viewport {
        self.target.as_ref().map(|t| t.viewport).unwrap_or_default()
    }

    fn draw_indexed_triangles(&mut self, batch: &DrawBatch<'_>) -> anyhow::Result<()> {
        let format = self
            .target
            .as_ref()
            .map(|t| t.format)
            .context("no render target bound to the shape device")?;

        if batch.index_count() == 0 {
            return Ok(());
        }

        // Mutating setup must happen before borrowing pipeline/buffers immutably.
        self.ensure_pipeline(format);
        self.ensure_bindings();
        self.ensure_geometry_capacity(batch.vertex_count(), batch.index_count());
        self.write_view_proj(batch.transform);

        let (Some(target), Some(pipeline), Some(bind_group), Some(vbo), Some(ibo)) = (
            self.target.as_ref(),
            self.pipeline.as_ref(),
            self.bind_group.as_ref(),
            self.vertex_buffer.as_ref(),
            self.index_buffer.as_ref(),
        ) else {
            anyhow::bail!("shape device resources were not created");
        };

        let vertex_bytes: &[u8] = bytemuck::cast_slice(batch.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(batch.indices);
        self.queue.write_buffer(vbo, 0, vertex_bytes);
        self.queue.write_buffer(ibo, 0, index_bytes);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessel shape encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tessel shape pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.set_vertex_buffer(0, vbo.slice(..vertex_bytes.len() as u64));
            rpass.set_index_buffer(ibo.slice(..index_bytes.len() as u64), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..batch.index_count() as u32, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn release(&mut self) {
        self.pipeline = None;
        self.pipeline_format = None;
        self.bind_group = None;
        self.bind_group_layout = None;
        self.view_proj_ubo = None;
        self.vertex_buffer = None;
        self.vertex_capacity = 0;
        self.index_buffer = None;
        self.index_capacity = 0;
        self.target = None;
        log::debug!("WgpuShapeDevice: GPU resources released");
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewProjUniform {
    view_proj: [[f32; 4]; 4], // column-major
}
