pub mod encode;
pub mod error;
pub mod format;
pub mod load;
pub mod png;
pub mod save;

pub use encode::{encode, EncodeStats, EncodedVoxelTexture};
pub use error::FormatError;
pub use format::{VoxelVolume, XRawHeader};
pub use load::{decode, read_xraw};
pub use png::{decode_png, encode_png, encode_rgba8_png, load_png};
pub use save::encode_xraw;
