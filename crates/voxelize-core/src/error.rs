use thiserror::Error;

/// Errors that can occur while bringing up a GPU device for voxelization.
#[derive(Debug, Error)]
pub enum VoxelizeError {
    #[error("GPU adapter not found: {0}")]
    AdapterNotFound(String),

    #[error("Failed to request GPU device: {0}")]
    DeviceRequestFailed(String),
}
