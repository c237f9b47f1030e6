pub mod config;
pub mod constants;
pub mod error;
pub mod math;
pub mod metadata;
pub mod types;

pub use config::{ConfigError, GridConfig, RenderConfig, VoxelizeConfig};
pub use error::VoxelizeError;
pub use metadata::{MetadataError, TextureMetadata};
pub use types::{Rgba, TextureDims, VolumeDims};
