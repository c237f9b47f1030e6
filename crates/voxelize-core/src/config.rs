use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_TOTAL_GRID_SCALE, DEFAULT_VOXEL_NUM, DEFAULT_VOXEL_SCALE};
use crate::types::VolumeDims;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse voxelize config RON: {0}")]
    ParseError(String),
}

/// Runtime voxel grid. Its voxel count is the capacity of the instance pool,
/// independent of any source volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub voxel_num: [u32; 3],
    pub voxel_scale: f32,
    pub total_grid_scale: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            voxel_num: DEFAULT_VOXEL_NUM,
            voxel_scale: DEFAULT_VOXEL_SCALE,
            total_grid_scale: DEFAULT_TOTAL_GRID_SCALE,
        }
    }
}

impl GridConfig {
    pub fn dims(&self) -> VolumeDims {
        VolumeDims::from(self.voxel_num)
    }

    /// Number of instance slots (`W * H * D` of the runtime grid).
    pub fn total_slot_count(&self) -> u64 {
        self.dims().voxel_count()
    }
}

/// A point in world space that the shading stage pushes voxels away from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractorConfig {
    pub position: [f32; 3],
    pub radius: f32,
}

/// Material and lighting parameters of the point renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub voxel_scale_rate: f32,
    pub ambient: [f32; 4],
    pub ka: f32,
    pub kd: f32,
    pub specular: [f32; 4],
    pub ks: f32,
    pub shininess: f32,
    pub distractor: Option<DistractorConfig>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            voxel_scale_rate: 1.0,
            ambient: [0.3, 0.3, 1.0, 1.0],
            ka: 0.5,
            kd: 0.8,
            specular: [1.0, 1.0, 1.0, 1.0],
            ks: 1.0,
            shininess: 0.7,
            distractor: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelizeConfig {
    pub grid: GridConfig,
    pub render: RenderConfig,
}

/// Parse a `VoxelizeConfig` from a RON string. Omitted fields keep their defaults.
pub fn load_config_from_str(ron_str: &str) -> Result<VoxelizeConfig, ConfigError> {
    let options = ron::Options::default();
    options
        .from_str(ron_str)
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
