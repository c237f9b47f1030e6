pub mod buffers;
pub mod device;
pub mod error;
pub mod grid;
pub mod passes;
pub mod pipeline;
pub mod readback;
pub mod reference;
pub mod source;

#[cfg(test)]
mod test_harness;

pub use buffers::{FreeSlotPool, SlotCounters, VoxelInstance, VoxelInstanceStore};
pub use device::request_headless_device;
pub use error::ResourceError;
pub use grid::{ProcessedRequests, VoxelGrid, VoxelizeRequest};
pub use passes::Kernel;
pub use pipeline::{CompactionPipeline, VoxelizeParams};
pub use readback::VoxelizeStats;
pub use source::SourceTexture;
