/// Errors that can occur while decoding, encoding or persisting a voxel volume.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("file too small ({0} bytes, minimum {1})")]
    TooSmall(usize, usize),

    #[error("truncated file: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("negative {axis} dimension: {value}")]
    NegativeDimension { axis: &'static str, value: i32 },

    #[error("palette count {0} outside 0..=256")]
    PaletteTooLarge(i32),

    #[error("volume of {voxels} voxels needs a {side}-pixel texture (maximum {max})")]
    VolumeTooLarge { voxels: u64, side: u64, max: u32 },

    #[error("index buffer holds {actual} entries, volume needs {expected}")]
    IndexCountMismatch { expected: usize, actual: usize },

    #[error("metadata error: {0}")]
    Metadata(#[from] voxelize_core::MetadataError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(String),
}
