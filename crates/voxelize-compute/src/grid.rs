use std::collections::VecDeque;

use voxelize_core::{GridConfig, MetadataError, TextureMetadata};
use voxelize_xraw::EncodedVoxelTexture;

use crate::buffers::{FreeSlotPool, VoxelInstanceStore};
use crate::device::with_error_scope;
use crate::error::ResourceError;
use crate::pipeline::{CompactionPipeline, VoxelizeParams};
use crate::readback::{StatsReadback, VoxelizeStats};
use crate::source::SourceTexture;

/// Work queued for the next `process_requests` call.
#[derive(Debug, Clone, PartialEq)]
pub enum VoxelizeRequest {
    /// Resolve source dimensions from a canonical texture name.
    SetSourceParams(String),
    /// Use dimensions from a sidecar record instead of a name.
    SetSourceMetadata(TextureMetadata),
    /// Rebuild the instance pool from the current source.
    Voxelize,
}

/// What one `process_requests` call did.
#[derive(Debug, Default)]
pub struct ProcessedRequests {
    /// Voxelization passes recorded into the encoder.
    pub passes: u32,
    /// Voxelize requests skipped because no source was ready.
    pub skipped: u32,
    /// Parameter requests whose name did not resolve; the previous metadata stays.
    pub rejected: Vec<MetadataError>,
}

struct BoundSource {
    texture: SourceTexture,
    bind_group: wgpu::BindGroup,
}

/// One runtime voxel grid: exclusively owns its free-slot pool, instance store
/// and the uploaded source texture.
///
/// Requests are queued from anywhere in the frame and applied in submission
/// order, each exactly once, when the frame loop calls `process_requests`.
pub struct VoxelGrid {
    config: GridConfig,
    pipeline: CompactionPipeline,
    pool: FreeSlotPool,
    store: VoxelInstanceStore,
    readback: StatsReadback,
    source: Option<BoundSource>,
    /// Replaced sources, destroyed at the start of the next `process_requests`.
    retired: Vec<SourceTexture>,
    metadata: Option<TextureMetadata>,
    pending: VecDeque<VoxelizeRequest>,
    pass_count: u64,
}

impl VoxelGrid {
    /// Allocate the pool and store for `config.voxel_num` slots.
    pub fn new(device: &wgpu::Device, config: &GridConfig) -> Result<Self, ResourceError> {
        let slot_count = config.total_slot_count();
        let capacity = u32::try_from(slot_count).map_err(|_| ResourceError::BufferTooLarge {
            label: "voxel-instance-store",
            size: slot_count,
            max: u32::MAX as u64,
        })?;

        let (pipeline, pool, store) = with_error_scope(device, || {
            let pipeline = CompactionPipeline::new(device);
            let pool = FreeSlotPool::new(device, capacity)?;
            let store = VoxelInstanceStore::new(device, capacity)?;
            Ok((pipeline, pool, store))
        })?;

        log::info!(
            "VoxelGrid: {}x{}x{} slots, voxel scale {}, grid scale {}",
            config.voxel_num[0],
            config.voxel_num[1],
            config.voxel_num[2],
            config.voxel_scale,
            config.total_grid_scale
        );

        Ok(Self {
            config: config.clone(),
            pipeline,
            pool,
            store,
            readback: StatsReadback::new(device),
            source: None,
            retired: Vec::new(),
            metadata: None,
            pending: VecDeque::new(),
            pass_count: 0,
        })
    }

    /// Upload the texture the next passes read. Its dimensions still come from
    /// a `SetSourceParams` or `SetSourceMetadata` request.
    ///
    /// A replaced texture stays alive until the next `process_requests`, so an
    /// encoder already recorded against it must be submitted before that call.
    pub fn set_source(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoded: &EncodedVoxelTexture,
    ) -> Result<(), ResourceError> {
        let texture = with_error_scope(device, || SourceTexture::upload(device, queue, encoded))?;
        let bind_group = self
            .pipeline
            .create_bind_group(device, &self.pool, &self.store, &texture);
        if let Some(old) = self.source.replace(BoundSource {
            texture,
            bind_group,
        }) {
            self.retired.push(old.texture);
        }
        Ok(())
    }

    /// Upload `encoded` and queue its name and a voxelization.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoded: &EncodedVoxelTexture,
    ) -> Result<(), ResourceError> {
        self.set_source(device, queue, encoded)?;
        self.request(VoxelizeRequest::SetSourceParams(
            encoded.canonical_name.clone(),
        ));
        self.request(VoxelizeRequest::Voxelize);
        Ok(())
    }

    pub fn request(&mut self, request: VoxelizeRequest) {
        self.pending.push_back(request);
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Drain the request queue, recording a pass into `encoder` per `Voxelize`.
    /// The counters of the last recorded pass are copied for `read_stats`.
    pub fn process_requests(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
    ) -> Result<ProcessedRequests, ResourceError> {
        self.release_retired();
        let mut processed = ProcessedRequests::default();

        while let Some(request) = self.pending.pop_front() {
            match request {
                VoxelizeRequest::SetSourceParams(name) => match TextureMetadata::resolve(&name) {
                    Ok(metadata) => self.apply_metadata(metadata),
                    Err(e) => {
                        log::warn!("Keeping previous source parameters: {e}");
                        processed.rejected.push(e);
                    }
                },
                VoxelizeRequest::SetSourceMetadata(metadata) => self.apply_metadata(metadata),
                VoxelizeRequest::Voxelize => {
                    if self.record_pass(device, encoder)? {
                        processed.passes += 1;
                    } else {
                        processed.skipped += 1;
                    }
                }
            }
        }

        if processed.passes > 0 {
            self.readback.request(encoder, self.pool.counters());
        }
        Ok(processed)
    }

    fn release_retired(&mut self) {
        if self.retired.is_empty() {
            return;
        }
        log::debug!("Destroying {} replaced source textures", self.retired.len());
        for texture in self.retired.drain(..) {
            texture.destroy();
        }
    }

    fn apply_metadata(&mut self, metadata: TextureMetadata) {
        log::debug!("Source parameters: {:?}", metadata);
        self.metadata = Some(metadata);
    }

    fn record_pass(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
    ) -> Result<bool, ResourceError> {
        let (Some(source), Some(metadata)) = (&self.source, &self.metadata) else {
            log::warn!("Voxelize requested before a source texture and parameters were set");
            return Ok(false);
        };

        let mut params = VoxelizeParams::new(self.pool.capacity(), &self.config, metadata);
        let uploaded = source.texture.dims();
        if uploaded != metadata.texture() {
            log::warn!(
                "Source parameters declare a {}x{} texture, uploaded texture is {}x{}",
                metadata.texture_width,
                metadata.texture_height,
                uploaded.width,
                uploaded.height
            );
            params.texture_width = params.texture_width.min(uploaded.width);
            params.texture_height = params.texture_height.min(uploaded.height);
        }

        self.pipeline
            .record(device, encoder, &self.pool, &source.bind_group, &params)?;
        self.pass_count += 1;
        log::info!(
            "Voxelization pass {}: {}x{}x{} source, {}x{} texture",
            self.pass_count,
            params.source_width,
            params.source_height,
            params.source_depth,
            params.texture_width,
            params.texture_height
        );
        Ok(true)
    }

    /// Wait for the counters of the last processed frame. `None` if that frame
    /// recorded no pass.
    pub fn read_stats(
        &mut self,
        device: &wgpu::Device,
    ) -> Result<Option<VoxelizeStats>, ResourceError> {
        let Some(counters) = self.readback.wait(device)? else {
            return Ok(None);
        };
        let stats = VoxelizeStats::from_counters(counters, self.pool.capacity());
        if stats.capacity_exceeded() {
            log::warn!(
                "Instance pool exhausted: {} voxels dropped ({} slots)",
                stats.dropped,
                self.pool.capacity()
            );
        }
        Ok(Some(stats))
    }

    /// Process queued requests, submit, and wait for the resulting stats.
    pub fn voxelize_now(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Option<VoxelizeStats>, ResourceError> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("voxelize-encoder"),
        });
        let processed = with_error_scope(device, || self.process_requests(device, &mut encoder))?;
        queue.submit(std::iter::once(encoder.finish()));
        if processed.passes == 0 {
            return Ok(None);
        }
        self.read_stats(device)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Metadata of the last accepted parameter request.
    pub fn metadata(&self) -> Option<&TextureMetadata> {
        self.metadata.as_ref()
    }

    pub fn capacity(&self) -> u32 {
        self.pool.capacity()
    }

    /// Replaced source textures not yet destroyed.
    pub fn retired_sources(&self) -> usize {
        self.retired.len()
    }

    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    /// Instance buffer consumed by the point renderer every frame.
    pub fn instance_buffer(&self) -> &wgpu::Buffer {
        self.store.buffer()
    }

    pub fn free_slot_buffer(&self) -> &wgpu::Buffer {
        self.pool.slots()
    }
}

impl Drop for VoxelGrid {
    fn drop(&mut self) {
        if let Some(source) = &self.source {
            source.texture.destroy();
        }
        self.release_retired();
        self.pool.destroy();
        self.store.destroy();
    }
}
