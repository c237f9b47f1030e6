use crate::buffers::{SlotCounters, VoxelInstance, COUNTERS_SIZE, INSTANCE_SIZE};
use crate::error::ResourceError;

/// Outcome of one voxelization pass, read back from the pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoxelizeStats {
    /// Slots handed out to visible pixels.
    pub allocated: u32,
    /// Visible pixels that found the pool empty.
    pub dropped: u32,
    /// Slots left on the free list.
    pub free_remaining: u32,
}

impl VoxelizeStats {
    pub fn from_counters(counters: SlotCounters, capacity: u32) -> Self {
        Self {
            allocated: capacity.saturating_sub(counters.live),
            dropped: counters.dropped,
            free_remaining: counters.live,
        }
    }

    pub fn capacity_exceeded(&self) -> bool {
        self.dropped > 0
    }
}

/// Map `staging` and copy its contents out, blocking until the GPU is done.
/// The buffer must carry `MAP_READ` and already have its copy submitted.
pub fn map_blocking(device: &wgpu::Device, staging: &wgpu::Buffer) -> Result<Vec<u8>, ResourceError> {
    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    match rx.recv() {
        Ok(Ok(())) => {
            let data = slice.get_mapped_range();
            let bytes = data.to_vec();
            drop(data);
            staging.unmap();
            Ok(bytes)
        }
        Ok(Err(e)) => Err(ResourceError::Readback(e.to_string())),
        Err(e) => Err(ResourceError::Readback(e.to_string())),
    }
}

/// Staging buffer for the pool counters. One readback in flight at a time.
pub struct StatsReadback {
    staging: wgpu::Buffer,
    pending: bool,
}

impl StatsReadback {
    pub fn new(device: &wgpu::Device) -> Self {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("voxelize-stats-staging"),
            size: COUNTERS_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            staging,
            pending: false,
        }
    }

    /// Copy the counters after the last recorded pass.
    pub fn request(&mut self, encoder: &mut wgpu::CommandEncoder, counters: &wgpu::Buffer) {
        encoder.copy_buffer_to_buffer(counters, 0, &self.staging, 0, COUNTERS_SIZE);
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Block until the requested copy lands. `None` if nothing was requested.
    pub fn wait(&mut self, device: &wgpu::Device) -> Result<Option<SlotCounters>, ResourceError> {
        if !self.pending {
            return Ok(None);
        }
        let bytes = map_blocking(device, &self.staging)?;
        self.pending = false;
        let counters: SlotCounters = bytemuck::pod_read_unaligned(&bytes[..COUNTERS_SIZE as usize]);
        Ok(Some(counters))
    }
}

/// Copy a whole GPU buffer back to the host. Submits its own command buffer.
pub fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
) -> Result<Vec<u8>, ResourceError> {
    let size = source.size();
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("voxelize-readback-staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("voxelize-readback-encoder"),
    });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));
    let bytes = map_blocking(device, &staging);
    staging.destroy();
    bytes
}

/// Read every instance record of a store buffer.
pub fn read_instances(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    store: &wgpu::Buffer,
) -> Result<Vec<VoxelInstance>, ResourceError> {
    let bytes = read_buffer(device, queue, store)?;
    Ok(bytes
        .chunks_exact(INSTANCE_SIZE as usize)
        .map(bytemuck::pod_read_unaligned::<VoxelInstance>)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_counters() {
        let counters = SlotCounters {
            live: 90,
            dropped: 0,
            ..Default::default()
        };
        let stats = VoxelizeStats::from_counters(counters, 100);
        assert_eq!(stats.allocated, 10);
        assert_eq!(stats.free_remaining, 90);
        assert!(!stats.capacity_exceeded());
    }

    #[test]
    fn test_stats_when_pool_runs_dry() {
        let counters = SlotCounters {
            live: 0,
            dropped: 7,
            ..Default::default()
        };
        let stats = VoxelizeStats::from_counters(counters, 64);
        assert_eq!(stats.allocated, 64);
        assert_eq!(stats.dropped, 7);
        assert!(stats.capacity_exceeded());
    }
}
