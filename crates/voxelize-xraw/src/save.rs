use crate::format::*;

/// Serialize a volume into the XRAW binary format.
///
/// Layout: header (24B) + W*H*D index bytes (x outer, z inner) + palette (4B x N).
/// The header's format bytes are written as stored on the volume; its
/// dimensions and palette count are taken from the data.
pub fn encode_xraw(volume: &VoxelVolume) -> Vec<u8> {
    let dims = volume.dims;
    let header = XRawHeader {
        width: dims.width as i32,
        height: dims.height as i32,
        depth: dims.depth as i32,
        palette_count: volume.palette.len() as i32,
        ..volume.header
    };

    let voxel_count = volume.indices.len();
    let mut output =
        Vec::with_capacity(HEADER_SIZE + voxel_count + volume.palette.len() * PALETTE_ENTRY_SIZE);

    output.extend_from_slice(&header.magic);
    output.extend_from_slice(&[
        header.color_channel_type,
        header.num_channels,
        header.bits_per_channel,
        header.bits_per_index,
    ]);
    output.extend_from_slice(&header.width.to_le_bytes());
    output.extend_from_slice(&header.height.to_le_bytes());
    output.extend_from_slice(&header.depth.to_le_bytes());
    output.extend_from_slice(&header.palette_count.to_le_bytes());

    for i in 0..usize::try_from(dims.voxel_count()).unwrap_or(0) {
        let index = volume.indices.get(file_order_to_linear(i, dims));
        output.push(index.copied().unwrap_or(0));
    }

    for color in &volume.palette {
        output.extend_from_slice(&color.to_rgba8());
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelize_core::{Rgba, VolumeDims};

    #[test]
    fn test_encoded_size() {
        let dims = VolumeDims::new(4, 4, 2);
        let volume = VoxelVolume {
            header: XRawHeader::rgba8(dims, 2),
            dims,
            indices: vec![1; 32],
            palette: vec![Rgba::TRANSPARENT, Rgba::new(1.0, 1.0, 1.0, 1.0)],
        };
        let bytes = encode_xraw(&volume);
        assert_eq!(bytes.len(), HEADER_SIZE + 32 + 8);
        assert_eq!(&bytes[bytes.len() - 4..], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_header_counts_follow_data() {
        let dims = VolumeDims::new(1, 1, 1);
        let mut header = XRawHeader::rgba8(VolumeDims::new(9, 9, 9), 200);
        header.color_channel_type = 2;
        let volume = VoxelVolume {
            header,
            dims,
            indices: vec![0],
            palette: vec![],
        };
        let bytes = encode_xraw(&volume);
        assert_eq!(bytes[4], 2);
        assert_eq!(&bytes[8..12], &1i32.to_le_bytes());
        assert_eq!(&bytes[20..24], &0i32.to_le_bytes());
        assert_eq!(bytes.len(), HEADER_SIZE + 1);
    }

    #[test]
    fn test_zero_depth_huge_plane_writes_header_only() {
        let dims = VolumeDims::new(i32::MAX as u32, i32::MAX as u32, 0);
        let volume = VoxelVolume {
            header: XRawHeader::rgba8(dims, 0),
            dims,
            indices: Vec::new(),
            palette: Vec::new(),
        };
        assert_eq!(encode_xraw(&volume).len(), HEADER_SIZE);
    }
}
