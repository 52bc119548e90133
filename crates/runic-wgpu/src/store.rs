//! GPU texture ownership.

use runic_core::{Bitmap, TextureHandle, TextureStore};

/// One uploaded texture with its per-texture bind group.
struct GpuTexture {
    // Held so the view in the bind group stays alive.
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// [`TextureStore`] backed by wgpu.
///
/// Handles are indices into an append-only table; nothing is ever evicted,
/// matching the compositor's at-most-once cache discipline. Dropping the
/// store drops every texture exactly once.
pub struct WgpuTextureStore {
    device: wgpu::Device,
    queue: wgpu::Queue,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: Vec<GpuTexture>,
}

impl WgpuTextureStore {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("runic texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // Nearest filtering for the crisp fixed-cell look.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("runic texture sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device,
            queue,
            layout,
            sampler,
            textures: Vec::new(),
        }
    }

    /// Layout of the per-texture bind group (group 1 in `quad.wgsl`).
    pub(crate) fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Bind group for a handle. `None` for the sentinel or a stale index.
    pub(crate) fn bind_group(&self, handle: TextureHandle) -> Option<&wgpu::BindGroup> {
        if handle.is_none() {
            return None;
        }
        self.textures.get(handle.0 as usize).map(|t| &t.bind_group)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureStore for WgpuTextureStore {
    fn upload(&mut self, bitmap: &Bitmap) -> TextureHandle {
        let extent = wgpu::Extent3d {
            width: bitmap.width.max(1),
            height: bitmap.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("runic texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bitmap.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * bitmap.width),
                rows_per_image: Some(bitmap.height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("runic texture bg"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(GpuTexture {
            _texture: texture,
            bind_group,
        });
        log::debug!(
            "uploaded texture {} ({}x{})",
            handle.0,
            bitmap.width,
            bitmap.height
        );
        handle
    }
}
