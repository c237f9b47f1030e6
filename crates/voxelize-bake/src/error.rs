use voxelize_compute::ResourceError;
use voxelize_core::{ConfigError, MetadataError, VoxelizeError};
use voxelize_xraw::FormatError;

#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    #[error("{path}: {source}")]
    Format {
        path: String,
        #[source]
        source: FormatError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] VoxelizeError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("report serialization failed: {0}")]
    Report(String),
}

impl BakeError {
    pub fn format(path: &std::path::Path, source: FormatError) -> Self {
        Self::Format {
            path: path.display().to_string(),
            source,
        }
    }
}
