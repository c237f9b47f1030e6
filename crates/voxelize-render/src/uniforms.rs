use glam::{Mat4, Vec3};
use voxelize_core::RenderConfig;

/// Point shading uniforms. Must match PointUniforms in points.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub local_to_world: [[f32; 4]; 4],
    /// xyz = camera position, w unused.
    pub eye: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    /// xyz = distractor center in grid space, w = 1 when a distractor is active.
    pub distractor_position: [f32; 4],
    /// (r, 1/r, pi/2, 0)
    pub distractor_radius: [f32; 4],
    /// (ka, kd, ks, shininess)
    pub material: [f32; 4],
    /// x = voxel scale rate, yzw unused.
    pub params: [f32; 4],
}

pub const POINT_UNIFORMS_SIZE: u64 = std::mem::size_of::<PointUniforms>() as u64;

impl PointUniforms {
    pub fn new(config: &RenderConfig, view_proj: Mat4, local_to_world: Mat4, eye: Vec3) -> Self {
        let (distractor_position, distractor_radius) = match &config.distractor {
            Some(d) if d.radius > 0.0 => {
                let [x, y, z] = d.position;
                (
                    [x, y, z, 1.0],
                    [d.radius, 1.0 / d.radius, std::f32::consts::FRAC_PI_2, 0.0],
                )
            }
            Some(d) => {
                log::warn!("Ignoring distractor with non-positive radius {}", d.radius);
                ([0.0; 4], [0.0, 0.0, std::f32::consts::FRAC_PI_2, 0.0])
            }
            None => ([0.0; 4], [0.0, 0.0, std::f32::consts::FRAC_PI_2, 0.0]),
        };

        Self {
            view_proj: view_proj.to_cols_array_2d(),
            local_to_world: local_to_world.to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            ambient: config.ambient,
            specular: config.specular,
            distractor_position,
            distractor_radius,
            material: [config.ka, config.kd, config.ks, config.shininess],
            params: [config.voxel_scale_rate, 0.0, 0.0, 0.0],
        }
    }

    pub fn has_distractor(&self) -> bool {
        self.distractor_position[3] > 0.0
    }
}
