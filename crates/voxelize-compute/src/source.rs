use voxelize_core::TextureDims;
use voxelize_xraw::EncodedVoxelTexture;

use crate::error::ResourceError;

/// An encoded voxel texture uploaded as `Rgba8Unorm`, read by the append kernel
/// with `textureLoad`.
pub struct SourceTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    dims: TextureDims,
}

impl SourceTexture {
    /// Upload `pixels` (tightly packed RGBA8 rows). An empty texture is stored as
    /// one transparent pixel, since the device cannot hold a zero-sized one.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        dims: TextureDims,
        pixels: &[u8],
    ) -> Result<Self, ResourceError> {
        let max = device.limits().max_texture_dimension_2d;
        if dims.width > max || dims.height > max {
            return Err(ResourceError::TextureTooLarge {
                width: dims.width,
                height: dims.height,
                max,
            });
        }
        let expected = dims.pixel_count() * 4;
        if pixels.len() as u64 != expected {
            return Err(ResourceError::Validation(format!(
                "source texture {}x{} needs {} bytes, got {}",
                dims.width,
                dims.height,
                expected,
                pixels.len()
            )));
        }

        let (width, height, data): (u32, u32, &[u8]) = if dims.is_empty() {
            (1, 1, &[0u8; 4])
        } else {
            (dims.width, dims.height, pixels)
        };
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("voxelize-source-texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("Uploaded {}x{} source texture", dims.width, dims.height);

        Ok(Self {
            texture,
            view,
            dims,
        })
    }

    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoded: &EncodedVoxelTexture,
    ) -> Result<Self, ResourceError> {
        Self::from_rgba8(device, queue, encoded.dims(), &encoded.to_rgba8())
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Dimensions as uploaded; `0x0` for an empty texture.
    pub fn dims(&self) -> TextureDims {
        self.dims
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}
