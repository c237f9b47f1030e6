use glam::{Mat4, Vec3};
use voxelize_core::GridConfig;

/// Orbit camera around the grid center. The compaction pass centers the grid
/// on the origin, so the default target is `Vec3::ZERO`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_rad: f32,
}

impl OrbitCamera {
    /// Frame a grid of `config.total_grid_scale` world units.
    pub fn framing(config: &GridConfig) -> Self {
        Self {
            target: Vec3::ZERO,
            distance: config.total_grid_scale.max(1.0) * 1.6,
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: -0.4,
            fov_y_rad: std::f32::consts::FRAC_PI_4,
        }
    }

    pub fn eye_position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = -self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * 0.005;
        self.pitch = (self.pitch - dy * 0.005).clamp(-1.5, 1.5);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta * self.distance * 0.1).clamp(0.5, 1000.0);
    }

    pub fn view_proj(&self, width: u32, height: u32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y);
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let far = self.distance * 4.0;
        let proj = Mat4::perspective_rh(self.fov_y_rad, aspect, 0.05, far.max(1.0));
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_above_grid_by_default() {
        let camera = OrbitCamera::framing(&GridConfig::default());
        let eye = camera.eye_position();
        assert!(eye.y > 0.0);
        assert!((eye.length() - camera.distance).abs() < 1e-3);
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let camera = OrbitCamera::framing(&GridConfig::default());
        let clip = camera.view_proj(640, 480) * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = OrbitCamera::framing(&GridConfig::default());
        camera.orbit(0.0, -10_000.0);
        assert_eq!(camera.pitch, 1.5);
    }
}
