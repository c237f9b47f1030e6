use crate::constants::ALPHA_EPSILON;

/// Normalized RGBA color, each channel in [0, 1].
///
/// 16 bytes, repr(C) so palettes and pixel rows can be cast to bytes directly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black. Default content of unwritten texture pixels.
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Decode four 8-bit channels by dividing each by 255.
    pub fn from_rgba8(bytes: [u8; 4]) -> Self {
        Self {
            r: bytes[0] as f32 / 255.0,
            g: bytes[1] as f32 / 255.0,
            b: bytes[2] as f32 / 255.0,
            a: bytes[3] as f32 / 255.0,
        }
    }

    /// Quantize back to 8-bit channels. Inverse of `from_rgba8` for any value it produced.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Euclidean length of the RGB part. Used by the encoder's non-black count.
    pub fn rgb_magnitude(self) -> f32 {
        (self.r * self.r + self.g * self.g + self.b * self.b).sqrt()
    }

    /// Alpha test used by the compaction pass.
    pub fn is_visible(self) -> bool {
        self.a > ALPHA_EPSILON
    }
}

/// Voxel counts per axis of a source volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct VolumeDims {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl VolumeDims {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// W * H * D, widened and saturating so hostile headers cannot overflow.
    pub fn voxel_count(self) -> u64 {
        (self.width as u64 * self.height as u64).saturating_mul(self.depth as u64)
    }

    /// Longest axis, at least 1.
    pub fn max_axis(self) -> u32 {
        self.width.max(self.height).max(self.depth).max(1)
    }

    pub fn to_array(self) -> [u32; 3] {
        [self.width, self.height, self.depth]
    }
}

impl From<[u32; 3]> for VolumeDims {
    fn from(v: [u32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Pixel dimensions of an encoded voxel texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct TextureDims {
    pub width: u32,
    pub height: u32,
}

impl TextureDims {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}
