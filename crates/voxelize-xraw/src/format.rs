use voxelize_core::math::linear_index;
use voxelize_core::{Rgba, VolumeDims};

/// Magic bytes identifying an XRAW volume.
pub const MAGIC: [u8; 4] = *b"XRAW";

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Bytes per palette entry (R, G, B, A).
pub const PALETTE_ENTRY_SIZE: usize = 4;

/// XRAW file header. Fixed 24 bytes, little-endian on disk.
///
/// The four format bytes are carried for diagnostics only; voxel indices are
/// always read as one byte each.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct XRawHeader {
    pub magic: [u8; 4],
    /// 0 = unsigned int, 1 = signed int, 2 = float.
    pub color_channel_type: u8,
    pub num_channels: u8,
    pub bits_per_channel: u8,
    pub bits_per_index: u8,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub palette_count: i32,
}

impl XRawHeader {
    /// Header for an 8-bit RGBA palette volume, the only layout the encoder consumes.
    pub fn rgba8(dims: VolumeDims, palette_count: usize) -> Self {
        Self {
            magic: MAGIC,
            color_channel_type: 0,
            num_channels: 4,
            bits_per_channel: 8,
            bits_per_index: 8,
            width: dims.width as i32,
            height: dims.height as i32,
            depth: dims.depth as i32,
            palette_count: palette_count as i32,
        }
    }

    pub fn magic_str(&self) -> String {
        String::from_utf8_lossy(&self.magic).into_owned()
    }
}

/// Position in `VoxelVolume::indices` of the `i`-th voxel byte in file order
/// (x outer, y middle, z inner). Only meaningful for `i < dims.voxel_count()`.
pub fn file_order_to_linear(i: usize, dims: VolumeDims) -> usize {
    let w = dims.width as usize;
    let h = dims.height.max(1) as usize;
    let d = dims.depth.max(1) as usize;
    let z = i % d;
    let y = (i / d) % h;
    let x = i / (d * h);
    x + y * w + z * w * h
}

/// A decoded volume: dense palette indices plus the palette.
///
/// `indices[x + y*W + z*W*H]` is the palette index of voxel (x, y, z).
#[derive(Debug, Clone)]
pub struct VoxelVolume {
    pub header: XRawHeader,
    pub dims: VolumeDims,
    pub indices: Vec<u8>,
    pub palette: Vec<Rgba>,
}

impl VoxelVolume {
    pub fn index_at(&self, x: u32, y: u32, z: u32) -> Option<u8> {
        if x >= self.dims.width || y >= self.dims.height || z >= self.dims.depth {
            return None;
        }
        let idx = linear_index(glam::UVec3::new(x, y, z), self.dims) as usize;
        self.indices.get(idx).copied()
    }

    /// Palette color of voxel (x, y, z). `None` outside the volume or past the palette.
    pub fn color_at(&self, x: u32, y: u32, z: u32) -> Option<Rgba> {
        let index = self.index_at(x, y, z)?;
        self.palette.get(index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(std::mem::size_of::<XRawHeader>(), HEADER_SIZE);
    }

    #[test]
    fn test_header_field_offsets() {
        let header = XRawHeader::rgba8(VolumeDims::new(1, 2, 3), 7);
        let bytes = bytemuck::bytes_of(&header);
        assert_eq!(&bytes[0..4], b"XRAW");
        assert_eq!(bytes[5], 4);
        assert_eq!(&bytes[8..12], &1i32.to_le_bytes());
        assert_eq!(&bytes[16..20], &3i32.to_le_bytes());
        assert_eq!(&bytes[20..24], &7i32.to_le_bytes());
    }

    #[test]
    fn test_index_lookup_bounds() {
        let dims = VolumeDims::new(2, 2, 1);
        let volume = VoxelVolume {
            header: XRawHeader::rgba8(dims, 2),
            dims,
            indices: vec![0, 1, 1, 5],
            palette: vec![Rgba::TRANSPARENT, Rgba::new(1.0, 0.0, 0.0, 1.0)],
        };
        assert_eq!(volume.index_at(1, 0, 0), Some(1));
        assert_eq!(volume.index_at(2, 0, 0), None);
        assert_eq!(volume.color_at(0, 1, 0), Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(volume.color_at(1, 1, 0), None);
    }

    #[test]
    fn test_file_order_to_linear() {
        let dims = VolumeDims::new(3, 2, 4);
        // File byte 1 is (x=0, y=0, z=1)
        assert_eq!(file_order_to_linear(1, dims), 6);
        // File byte 4 is (x=0, y=1, z=0)
        assert_eq!(file_order_to_linear(4, dims), 3);
        // File byte 8 is (x=1, y=0, z=0)
        assert_eq!(file_order_to_linear(8, dims), 1);
        let mut seen: Vec<usize> = (0..24).map(|i| file_order_to_linear(i, dims)).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..24).collect::<Vec<_>>());
    }
}
