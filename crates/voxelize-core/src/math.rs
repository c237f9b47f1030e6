use crate::types::{TextureDims, VolumeDims};
use glam::{UVec3, Vec3};

/// Smallest power of two >= n. `0` maps to `0`; a power of two maps to itself.
///
/// Values above 2^31 have no u32 power of two and also map to `0`.
pub fn next_pow2(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    n.checked_next_power_of_two().unwrap_or(0)
}

/// Integer ceil(sqrt(n)), exact for every u64.
pub fn ceil_sqrt(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut r = (n as f64).sqrt() as u64;
    // f64 rounding can land one off either way near large squares
    while r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).map_or(false, |sq| sq <= n) {
        r += 1;
    }
    if r * r == n {
        r
    } else {
        r + 1
    }
}

/// Texture size for a volume of `voxel_count` voxels:
/// `width = next_pow2(ceil(sqrt(count)))`, `height = next_pow2(width)`.
pub fn texture_dims_for(voxel_count: u64) -> TextureDims {
    let side = u32::try_from(ceil_sqrt(voxel_count)).unwrap_or(u32::MAX);
    let width = next_pow2(side);
    TextureDims::new(width, next_pow2(width))
}

/// Linear index of voxel (x, y, z): `x + y*W + z*W*H`.
pub fn linear_index(coord: UVec3, dims: VolumeDims) -> u64 {
    let w = dims.width as u64;
    let h = dims.height as u64;
    coord.x as u64 + coord.y as u64 * w + coord.z as u64 * w * h
}

/// Inverse of `linear_index`. Must match `grid_coord` in `shaders/common/coords.wgsl`.
///
/// Zero-sized axes are treated as 1 so a degenerate header cannot divide by zero.
pub fn grid_coord(idx: u64, dims: VolumeDims) -> UVec3 {
    let w = dims.width.max(1) as u64;
    let h = dims.height.max(1) as u64;
    UVec3::new(
        (idx % w) as u32,
        ((idx / w) % h) as u32,
        (idx / (w * h)) as u32,
    )
}

/// Texture pixel holding linear index `idx`: `(idx mod texW, idx div texW)`.
pub fn pixel_coord(idx: u64, tex_width: u32) -> (u32, u32) {
    let w = tex_width.max(1) as u64;
    ((idx % w) as u32, (idx / w) as u32)
}

/// Linear index stored at texture pixel (tx, ty).
pub fn pixel_index(tx: u32, ty: u32, tex_width: u32) -> u64 {
    tx as u64 + ty as u64 * tex_width as u64
}

/// World-space position of a voxel instance.
///
/// The grid coordinate is centered on the volume's centroid and the whole
/// volume is fitted into a cube of edge `grid_scale` along its longest axis.
/// Must match `voxel_position` in `shaders/compaction/voxelize.wgsl`.
pub fn voxel_world_position(coord: UVec3, dims: VolumeDims, grid_scale: f32) -> Vec3 {
    let unit = grid_scale / dims.max_axis() as f32;
    let extent = Vec3::new(
        dims.width.max(1) as f32,
        dims.height.max(1) as f32,
        dims.depth.max(1) as f32,
    );
    let center = (extent - Vec3::ONE) * 0.5;
    (coord.as_vec3() - center) * unit
}
