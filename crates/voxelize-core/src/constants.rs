//! Single source of truth for shared constants.
//! Values needed by WGSL are injected into shader preambles at pipeline creation.

/// Threads per workgroup of the reset kernel (1-D).
pub const RESET_WORKGROUP_SIZE: u32 = 256;

/// Edge length of the append kernel's 2-D workgroup (8x8 threads).
pub const APPEND_WORKGROUP_EDGE: u32 = 8;

/// Pixels with alpha at or below this value are empty and consume no slot.
/// Half an 8-bit step, so only a stored alpha of exactly 0 is skipped.
pub const ALPHA_EPSILON: f32 = 1.0 / 512.0;

/// Palette indices are single bytes.
pub const MAX_PALETTE_COLORS: usize = 256;

/// Largest texture edge the encoder will produce. Also the widest value the
/// 4-digit texture fields of a canonical name can carry.
pub const MAX_TEXTURE_DIMENSION: u32 = 8192;

/// Identity quaternion (x, y, z, w).
pub const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Runtime voxel grid shipped by default: 64 voxels per axis.
pub const DEFAULT_VOXEL_NUM: [u32; 3] = [64, 64, 64];

/// Default primitive size of one voxel instance.
pub const DEFAULT_VOXEL_SCALE: f32 = 0.25;

/// Default world-space edge of the cube the source volume is fitted into.
pub const DEFAULT_TOTAL_GRID_SCALE: f32 = 16.0;
