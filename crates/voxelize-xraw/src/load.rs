use std::io::Read;

use voxelize_core::{Rgba, VolumeDims};

use crate::error::FormatError;
use crate::format::*;

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn non_negative(axis: &'static str, value: i32) -> Result<u32, FormatError> {
    u32::try_from(value).map_err(|_| FormatError::NegativeDimension { axis, value })
}

fn parse_header(bytes: &[u8]) -> XRawHeader {
    XRawHeader {
        magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
        color_channel_type: bytes[4],
        num_channels: bytes[5],
        bits_per_channel: bytes[6],
        bits_per_index: bytes[7],
        width: read_i32(bytes, 8),
        height: read_i32(bytes, 12),
        depth: read_i32(bytes, 16),
        palette_count: read_i32(bytes, 20),
    }
}

/// Decode an XRAW volume from raw bytes.
///
/// Voxel bytes are stored x outer, y middle, z inner; each is placed at
/// `x + y*W + z*W*H` in the returned index grid.
pub fn decode(bytes: &[u8]) -> Result<VoxelVolume, FormatError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FormatError::TooSmall(bytes.len(), HEADER_SIZE));
    }

    let header = parse_header(bytes);
    if header.magic != MAGIC {
        log::warn!(
            "XRAW magic mismatch: found {:?}, decoding anyway",
            header.magic_str()
        );
    }
    if header.bits_per_index != 8 {
        log::warn!(
            "XRAW declares {} bits per index; indices are read as single bytes",
            header.bits_per_index
        );
    }

    let dims = VolumeDims::new(
        non_negative("width", header.width)?,
        non_negative("height", header.height)?,
        non_negative("depth", header.depth)?,
    );
    let palette_count = usize::try_from(header.palette_count)
        .ok()
        .filter(|&n| n <= voxelize_core::constants::MAX_PALETTE_COLORS)
        .ok_or(FormatError::PaletteTooLarge(header.palette_count))?;

    // Validate the declared payload fits before allocating anything
    let voxel_count = usize::try_from(dims.voxel_count()).unwrap_or(usize::MAX);
    let voxels_end = HEADER_SIZE.saturating_add(voxel_count);
    let expected = voxels_end.saturating_add(palette_count * PALETTE_ENTRY_SIZE);
    if bytes.len() < expected {
        return Err(FormatError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }

    // Driven by the payload, so a zero axis costs nothing however large the others are
    let voxel_bytes = &bytes[HEADER_SIZE..voxels_end];
    let mut indices = vec![0u8; voxel_count];
    for (i, &index) in voxel_bytes.iter().enumerate() {
        indices[file_order_to_linear(i, dims)] = index;
    }

    let palette: Vec<Rgba> = bytes[voxels_end..expected]
        .chunks_exact(PALETTE_ENTRY_SIZE)
        .map(|c| Rgba::from_rgba8([c[0], c[1], c[2], c[3]]))
        .collect();

    if bytes.len() > expected {
        log::debug!("XRAW has {} trailing bytes", bytes.len() - expected);
    }
    log::debug!(
        "XRAW {} type={} channels={} bits/channel={} bits/index={} dims={}x{}x{} palette={}",
        header.magic_str(),
        header.color_channel_type,
        header.num_channels,
        header.bits_per_channel,
        header.bits_per_index,
        dims.width,
        dims.height,
        dims.depth,
        palette.len()
    );

    Ok(VoxelVolume {
        header,
        dims,
        indices,
        palette,
    })
}

/// Read a whole XRAW stream and decode it. The reader is consumed and dropped
/// on every path.
pub fn read_xraw<R: Read>(mut reader: R) -> Result<VoxelVolume, FormatError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes)
}
