use voxelize_core::{MetadataError, VoxelizeError};

/// Device-side failures of the compaction pipeline. Fatal for the pass that hit them.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("{label} needs {size} bytes, device allows {max}")]
    BufferTooLarge {
        label: &'static str,
        size: u64,
        max: u64,
    },

    #[error("{kernel} dispatch needs {groups} workgroups, device allows {max}")]
    DispatchTooLarge {
        kernel: &'static str,
        groups: u64,
        max: u32,
    },

    #[error("source texture {width}x{height} exceeds device limit {max}")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[error("GPU out of memory: {0}")]
    OutOfMemory(String),

    #[error("GPU validation error: {0}")]
    Validation(String),

    #[error("readback failed: {0}")]
    Readback(String),

    #[error("texture metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Device(#[from] VoxelizeError),
}
