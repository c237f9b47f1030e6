use voxelize_core::constants::MAX_TEXTURE_DIMENSION;
use voxelize_core::math::{ceil_sqrt, pixel_coord, pixel_index, texture_dims_for};
use voxelize_core::{Rgba, TextureDims, TextureMetadata, VolumeDims};

use crate::error::FormatError;
use crate::format::VoxelVolume;

/// Diagnostic counters gathered while packing a volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct EncodeStats {
    /// Voxels visited, transparent ones included.
    pub total_voxels: u64,
    /// Voxels whose color has a nonzero RGB magnitude. Alpha is ignored.
    pub opaque_voxels: u64,
    /// Voxels whose palette index had no palette entry.
    pub unmapped: u64,
}

/// A volume packed into a 2-D power-of-two color texture.
///
/// Pixel `idx = x + y*W + z*W*H` sits at `(idx mod texW, idx div texW)`;
/// pixels past `W*H*D` stay transparent.
#[derive(Debug, Clone)]
pub struct EncodedVoxelTexture {
    pub metadata: TextureMetadata,
    pub canonical_name: String,
    /// Row-major, `texW * texH` entries.
    pub pixels: Vec<Rgba>,
    pub stats: EncodeStats,
}

impl EncodedVoxelTexture {
    pub fn dims(&self) -> TextureDims {
        self.metadata.texture()
    }

    pub fn volume(&self) -> VolumeDims {
        self.metadata.volume()
    }

    pub fn pixel(&self, tx: u32, ty: u32) -> Option<Rgba> {
        let dims = self.dims();
        if tx >= dims.width || ty >= dims.height {
            return None;
        }
        self.pixels
            .get(pixel_index(tx, ty, dims.width) as usize)
            .copied()
    }

    /// Pixels with a nonzero alpha, the ones a compaction pass allocates slots for.
    pub fn visible_count(&self) -> u64 {
        self.pixels.iter().filter(|p| p.is_visible()).count() as u64
    }

    /// Quantize to tightly packed RGBA8 rows, as uploaded and persisted.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_rgba8()).collect()
    }

    /// Rebuild from RGBA8 rows. Encoder statistics are recomputed from the pixels
    /// covering the source volume.
    pub fn from_rgba8(
        canonical_name: String,
        metadata: TextureMetadata,
        rgba: &[u8],
    ) -> Result<Self, FormatError> {
        let expected = metadata.texture().pixel_count() as usize * 4;
        if rgba.len() != expected {
            return Err(FormatError::Truncated {
                expected,
                actual: rgba.len(),
            });
        }
        let pixels: Vec<Rgba> = rgba
            .chunks_exact(4)
            .map(|c| Rgba::from_rgba8([c[0], c[1], c[2], c[3]]))
            .collect();
        let total_voxels = metadata.volume().voxel_count().min(pixels.len() as u64);
        let opaque_voxels = pixels[..total_voxels as usize]
            .iter()
            .filter(|p| p.rgb_magnitude() > 0.0)
            .count() as u64;
        Ok(Self {
            metadata,
            canonical_name,
            pixels,
            stats: EncodeStats {
                total_voxels,
                opaque_voxels,
                unmapped: 0,
            },
        })
    }
}

/// Pack a decoded volume into a texture named after `source_name`.
pub fn encode(volume: &VoxelVolume, source_name: &str) -> Result<EncodedVoxelTexture, FormatError> {
    let dims = volume.dims;
    let total = dims.voxel_count();
    if volume.indices.len() as u64 != total {
        return Err(FormatError::IndexCountMismatch {
            expected: usize::try_from(total).unwrap_or(usize::MAX),
            actual: volume.indices.len(),
        });
    }

    let texture = texture_dims_for(total);
    if total > 0 && (texture.width == 0 || texture.height > MAX_TEXTURE_DIMENSION) {
        return Err(FormatError::VolumeTooLarge {
            voxels: total,
            side: ceil_sqrt(total),
            max: MAX_TEXTURE_DIMENSION,
        });
    }

    let mut pixels = vec![Rgba::TRANSPARENT; texture.pixel_count() as usize];
    let mut stats = EncodeStats::default();

    for (idx, &palette_index) in volume.indices.iter().enumerate() {
        let color = match volume.palette.get(palette_index as usize) {
            Some(&c) => c,
            None => {
                stats.unmapped += 1;
                Rgba::TRANSPARENT
            }
        };
        let (tx, ty) = pixel_coord(idx as u64, texture.width);
        pixels[pixel_index(tx, ty, texture.width) as usize] = color;

        stats.total_voxels += 1;
        if color.rgb_magnitude() > 0.0 {
            stats.opaque_voxels += 1;
        }
    }

    if stats.unmapped > 0 {
        log::warn!(
            "{} voxels reference palette entries past {}; written transparent",
            stats.unmapped,
            volume.palette.len()
        );
    }

    let metadata = TextureMetadata::new(dims, texture);
    let canonical_name = metadata.canonical_name(source_name);
    log::info!(
        "Encoded {} -> {}x{} texture: {} voxels, {} opaque",
        canonical_name,
        texture.width,
        texture.height,
        stats.total_voxels,
        stats.opaque_voxels
    );

    Ok(EncodedVoxelTexture {
        metadata,
        canonical_name,
        pixels,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;
    use voxelize_core::math::linear_index;
    use crate::format::XRawHeader;
    use voxelize_core::math::grid_coord;

    fn volume(dims: VolumeDims, indices: Vec<u8>, palette: Vec<Rgba>) -> VoxelVolume {
        VoxelVolume {
            header: XRawHeader::rgba8(dims, palette.len()),
            dims,
            indices,
            palette,
        }
    }

    fn red() -> Rgba {
        Rgba::from_rgba8([255, 0, 0, 255])
    }

    #[test]
    fn test_texture_size_and_name() {
        let dims = VolumeDims::new(20, 12, 30);
        let v = volume(dims, vec![0; 7200], vec![Rgba::TRANSPARENT]);
        let tex = encode(&v, "knight").expect("encode should succeed");
        // sqrt(7200) ~ 84.9 -> 85 -> 128
        assert_eq!(tex.dims(), TextureDims::new(128, 128));
        assert_eq!(tex.canonical_name, "knight_20-12-30_128-128");
        assert_eq!(tex.pixels.len(), 128 * 128);
    }

    #[test]
    fn test_voxel_lands_on_its_linear_pixel() {
        let dims = VolumeDims::new(3, 4, 5);
        let mut indices = vec![0u8; 60];
        let coord = UVec3::new(2, 1, 3);
        let idx = linear_index(coord, dims);
        indices[idx as usize] = 1;
        let v = volume(dims, indices, vec![Rgba::TRANSPARENT, red()]);
        let tex = encode(&v, "one").expect("encode should succeed");

        let (tx, ty) = pixel_coord(idx, tex.dims().width);
        assert_eq!(tex.pixel(tx, ty), Some(red()));
        assert_eq!(tex.visible_count(), 1);

        // Runtime reconstruction recovers the same grid coordinate
        let back = pixel_index(tx, ty, tex.dims().width);
        assert_eq!(grid_coord(back, dims), coord);
    }

    #[test]
    fn test_padding_pixels_stay_transparent() {
        let dims = VolumeDims::new(5, 1, 1);
        let v = volume(dims, vec![1; 5], vec![Rgba::TRANSPARENT, red()]);
        let tex = encode(&v, "row").expect("encode should succeed");
        // 5 voxels -> ceil sqrt 3 -> 4x4 texture
        assert_eq!(tex.pixels.len(), 16);
        assert!(tex.pixels[..5].iter().all(|&p| p == red()));
        assert!(tex.pixels[5..].iter().all(|&p| p == Rgba::TRANSPARENT));
    }

    #[test]
    fn test_stats_use_rgb_not_alpha() {
        let dims = VolumeDims::new(4, 1, 1);
        let palette = vec![
            Rgba::TRANSPARENT,
            red(),
            // Black but opaque: visible at runtime, not counted as opaque here
            Rgba::from_rgba8([0, 0, 0, 255]),
            // Colored but fully transparent: counted here, skipped at runtime
            Rgba::from_rgba8([0, 255, 0, 0]),
        ];
        let v = volume(dims, vec![0, 1, 2, 3], palette);
        let tex = encode(&v, "mix").expect("encode should succeed");
        assert_eq!(tex.stats.total_voxels, 4);
        assert_eq!(tex.stats.opaque_voxels, 2);
        assert_eq!(tex.visible_count(), 2);
    }

    #[test]
    fn test_unmapped_index_is_transparent() {
        let dims = VolumeDims::new(2, 1, 1);
        let v = volume(dims, vec![1, 9], vec![Rgba::TRANSPARENT, red()]);
        let tex = encode(&v, "short").expect("encode should succeed");
        assert_eq!(tex.stats.unmapped, 1);
        assert_eq!(tex.pixels[1], Rgba::TRANSPARENT);
    }

    #[test]
    fn test_empty_volume() {
        let v = volume(VolumeDims::new(0, 4, 4), vec![], vec![]);
        let tex = encode(&v, "empty").expect("encode should succeed");
        assert!(tex.dims().is_empty());
        assert!(tex.pixels.is_empty());
        assert_eq!(tex.canonical_name, "empty_0-4-4_0-0");
    }

    #[test]
    fn test_index_count_mismatch_rejected() {
        let v = volume(VolumeDims::new(2, 2, 2), vec![0; 3], vec![]);
        let result = encode(&v, "bad");
        assert!(matches!(
            result,
            Err(FormatError::IndexCountMismatch {
                expected: 8,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_rgba8_rebuild_matches() {
        let dims = VolumeDims::new(3, 3, 1);
        let indices = vec![0, 1, 2, 1, 0, 2, 2, 1, 0];
        let palette = vec![
            Rgba::TRANSPARENT,
            red(),
            Rgba::from_rgba8([10, 20, 30, 40]),
        ];
        let tex = encode(&volume(dims, indices, palette), "grid").expect("encode");
        let rebuilt = EncodedVoxelTexture::from_rgba8(
            tex.canonical_name.clone(),
            tex.metadata,
            &tex.to_rgba8(),
        )
        .expect("rebuild");
        assert_eq!(rebuilt.pixels, tex.pixels);
        assert_eq!(rebuilt.stats.total_voxels, 9);
        assert_eq!(rebuilt.stats.opaque_voxels, tex.stats.opaque_voxels);
    }

    #[test]
    fn test_zero_depth_huge_plane_encodes_empty() {
        let dims = VolumeDims::new(i32::MAX as u32, i32::MAX as u32, 0);
        let tex = encode(&volume(dims, Vec::new(), Vec::new()), "flat").expect("encode");
        assert!(tex.dims().is_empty());
        assert!(tex.pixels.is_empty());
        assert_eq!(tex.stats.total_voxels, 0);
    }
}
