//! The textured-quad submission path.
//!
//! Every on-screen draw goes through here: the compositor sweep fills a
//! [`QuadBatch`], the frame then flushes it through the lazily created
//! [`QuadPipeline`] as instanced indexed draws over one shared unit quad.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use runic_core::{Mat4, QuadSink, Rect, TextureHandle};

use crate::store::WgpuTextureStore;

// ---------------------------------------------------------------------------
// GPU types (must match quad.wgsl)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    corner: [f32; 2],
}

// Two CCW triangles over the unit square.
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { corner: [0.0, 0.0] },
    QuadVertex { corner: [1.0, 0.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [0.0, 1.0] },
];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Per-quad instance data.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct QuadInstance {
    pub dest: [f32; 4], // x, y, w, h in grid pixels
    pub clip: [f32; 4], // u, v, w, h normalized
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    mvp: [f32; 16],
}

// ---------------------------------------------------------------------------
// QuadBatch
// ---------------------------------------------------------------------------

/// [`QuadSink`] that buffers one frame's draws for the flush.
#[derive(Default)]
pub(crate) struct QuadBatch {
    pub quads: Vec<(TextureHandle, QuadInstance)>,
}

impl QuadBatch {
    pub fn clear(&mut self) {
        self.quads.clear();
    }
}

impl QuadSink for QuadBatch {
    fn submit(&mut self, texture: TextureHandle, dest: Rect, clip: Rect) {
        // The sentinel draws nothing.
        if texture.is_none() {
            return;
        }
        self.quads.push((
            texture,
            QuadInstance {
                dest: [dest.x, dest.y, dest.w, dest.h],
                clip: [clip.x, clip.y, clip.w, clip.h],
            },
        ));
    }
}

// ---------------------------------------------------------------------------
// QuadPipeline
// ---------------------------------------------------------------------------

/// The shared quad pipeline, created on first flush and cached for the
/// process lifetime.
pub(crate) struct QuadPipeline {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
}

impl QuadPipeline {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        log::debug!("creating quad pipeline for {format:?}");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("quad.wgsl").into()),
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quad globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad globals bg"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad pipeline layout"),
            bind_group_layouts: &[&globals_layout, texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quad pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<QuadVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 0,
                            shader_location: 0,
                        }],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<QuadInstance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[
                            // dest
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x4,
                                offset: 0,
                                shader_location: 1,
                            },
                            // clip
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x4,
                                offset: 16,
                                shader_location: 2,
                            },
                        ],
                    },
                ],
                compilation_options: Default::default(),
            },
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
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            globals_buffer,
            globals_bind_group,
        }
    }

    /// Draw one frame's batch into `view`, clearing it first.
    ///
    /// Quads sharing the unit-quad geometry differ only in instance data and
    /// texture bind group, so each is a one-instance indexed draw.
    pub fn flush(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        store: &WgpuTextureStore,
        batch: &QuadBatch,
        mvp: &Mat4,
    ) {
        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals {
                mvp: mvp.to_cols_array(),
            }),
        );

        let instances: Vec<QuadInstance> = batch.quads.iter().map(|(_, i)| *i).collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, instance_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        for (i, (texture, _)) in batch.quads.iter().enumerate() {
            let Some(bind_group) = store.bind_group(*texture) else {
                continue;
            };
            pass.set_bind_group(1, bind_group, &[]);
            let i = i as u32;
            pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, i..i + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_drops_the_sentinel() {
        let mut batch = QuadBatch::default();
        batch.submit(TextureHandle::NONE, Rect::new(0.0, 0.0, 32.0, 32.0), Rect::UNIT);
        batch.submit(TextureHandle(7), Rect::new(32.0, 0.0, 32.0, 32.0), Rect::UNIT);
        assert_eq!(batch.quads.len(), 1);
        assert_eq!(batch.quads[0].0, TextureHandle(7));
        assert_eq!(batch.quads[0].1.dest, [32.0, 0.0, 32.0, 32.0]);
    }
}
