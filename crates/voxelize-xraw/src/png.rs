//! PNG transport for encoded voxel textures.

use std::path::Path;

use image::ImageEncoder;
use voxelize_core::TextureMetadata;

use crate::encode::EncodedVoxelTexture;
use crate::error::FormatError;

/// Encode tightly packed RGBA8 rows as a PNG.
pub fn encode_rgba8_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FormatError> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(rgba, width, height, image::ColorType::Rgba8)
        .map_err(|e| FormatError::Image(e.to_string()))?;
    Ok(out)
}

/// Encode the texture as an 8-bit RGBA PNG.
pub fn encode_png(texture: &EncodedVoxelTexture) -> Result<Vec<u8>, FormatError> {
    let dims = texture.dims();
    if dims.is_empty() {
        return Err(FormatError::Image(format!(
            "{}: empty texture has no PNG form",
            texture.canonical_name
        )));
    }
    encode_rgba8_png(&texture.to_rgba8(), dims.width, dims.height)
}

/// Decode a PNG whose dimensions are given by `metadata`.
pub fn decode_png_with(
    bytes: &[u8],
    canonical_name: &str,
    metadata: TextureMetadata,
) -> Result<EncodedVoxelTexture, FormatError> {
    let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| FormatError::Image(e.to_string()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    let declared = metadata.texture();
    if (width, height) != (declared.width, declared.height) {
        return Err(FormatError::Image(format!(
            "{canonical_name}: image is {width}x{height}, metadata declares {}x{}",
            declared.width, declared.height
        )));
    }
    EncodedVoxelTexture::from_rgba8(canonical_name.to_string(), metadata, image.as_raw())
}

/// Decode a PNG, recovering its dimensions from the canonical name.
pub fn decode_png(bytes: &[u8], canonical_name: &str) -> Result<EncodedVoxelTexture, FormatError> {
    let metadata = TextureMetadata::resolve(canonical_name)?;
    decode_png_with(bytes, canonical_name, metadata)
}

/// Load a persisted texture. The canonical name is the file stem; a `.ron`
/// sidecar next to the image takes precedence over the name when present.
pub fn load_png(path: &Path) -> Result<EncodedVoxelTexture, FormatError> {
    let canonical_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = std::fs::read(path)?;

    let sidecar = path.with_extension("ron");
    if sidecar.is_file() {
        let text = std::fs::read_to_string(&sidecar)?;
        let metadata = TextureMetadata::from_sidecar(&text)?;
        log::debug!("Using sidecar metadata from {}", sidecar.display());
        return decode_png_with(&bytes, &canonical_name, metadata);
    }
    decode_png(&bytes, &canonical_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;
    use crate::format::{VoxelVolume, XRawHeader};
    use voxelize_core::{MetadataError, Rgba, VolumeDims};

    fn sample_texture() -> EncodedVoxelTexture {
        let dims = VolumeDims::new(4, 3, 2);
        let indices = (0..24).map(|i| (i % 4) as u8).collect();
        let palette = vec![
            Rgba::TRANSPARENT,
            Rgba::from_rgba8([255, 0, 0, 255]),
            Rgba::from_rgba8([0, 255, 0, 200]),
            Rgba::from_rgba8([1, 2, 3, 4]),
        ];
        let volume = VoxelVolume {
            header: XRawHeader::rgba8(dims, palette.len()),
            dims,
            indices,
            palette,
        };
        encode(&volume, "sample").expect("encode should succeed")
    }

    #[test]
    fn test_png_roundtrip_is_exact() {
        let tex = sample_texture();
        let png = encode_png(&tex).expect("png encode");
        assert_eq!(&png[1..4], b"PNG");
        let back = decode_png(&png, &tex.canonical_name).expect("png decode");
        assert_eq!(back.metadata, tex.metadata);
        assert_eq!(back.pixels, tex.pixels);
        assert_eq!(back.visible_count(), tex.visible_count());
    }

    #[test]
    fn test_decode_requires_canonical_name() {
        let tex = sample_texture();
        let png = encode_png(&tex).expect("png encode");
        let result = decode_png(&png, "renamed");
        assert!(matches!(
            result,
            Err(FormatError::Metadata(MetadataError::NoMatch(_)))
        ));
    }

    #[test]
    fn test_decode_rejects_dimension_mismatch() {
        let tex = sample_texture();
        let png = encode_png(&tex).expect("png encode");
        let result = decode_png(&png, "sample_4-3-2_16-16");
        assert!(matches!(result, Err(FormatError::Image(_))));
    }

    #[test]
    fn test_decode_garbage_rejected() {
        let result = decode_png(b"not a png", "x_1-1-1_1-1");
        assert!(matches!(result, Err(FormatError::Image(_))));
    }

    #[test]
    fn test_empty_texture_has_no_png() {
        let dims = VolumeDims::new(0, 4, 4);
        let volume = VoxelVolume {
            header: XRawHeader::rgba8(dims, 0),
            dims,
            indices: Vec::new(),
            palette: Vec::new(),
        };
        let tex = encode(&volume, "empty").expect("encode should succeed");
        assert!(matches!(encode_png(&tex), Err(FormatError::Image(_))));
    }
}
