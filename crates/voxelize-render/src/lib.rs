pub mod camera;
pub mod points;
pub mod target;
pub mod uniforms;

pub use camera::OrbitCamera;
pub use points::PointRenderer;
pub use target::OffscreenTarget;
pub use uniforms::PointUniforms;
