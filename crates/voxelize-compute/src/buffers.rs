use voxelize_core::constants::IDENTITY_ROTATION;
use wgpu::util::DeviceExt;

use crate::error::ResourceError;

/// One renderable voxel. 48 bytes. Must match VoxelInstance in types.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VoxelInstance {
    pub position: [f32; 3],
    pub scale: f32,
    /// Quaternion (x, y, z, w).
    pub rotation: [f32; 4],
    pub color: [f32; 4],
}

impl VoxelInstance {
    /// Content of every slot no pass has allocated: zero scale, zero alpha.
    pub const DEAD: VoxelInstance = VoxelInstance {
        position: [0.0; 3],
        scale: 0.0,
        rotation: IDENTITY_ROTATION,
        color: [1.0, 1.0, 1.0, 0.0],
    };

    pub fn is_dead(&self) -> bool {
        self.scale == 0.0 && self.color[3] == 0.0
    }
}

/// Pool counters. Must match SlotCounters in voxelize.wgsl.
///
/// `live` is the stack height of the free list; `dropped` counts pixels that
/// found the list empty.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SlotCounters {
    pub live: u32,
    pub dropped: u32,
    pub _pad0: u32,
    pub _pad1: u32,
}

/// Byte size of one pool entry.
pub const SLOT_INDEX_SIZE: u64 = 4;
/// Byte size of one instance record.
pub const INSTANCE_SIZE: u64 = std::mem::size_of::<VoxelInstance>() as u64;
/// Byte size of the counter block.
pub const COUNTERS_SIZE: u64 = std::mem::size_of::<SlotCounters>() as u64;

/// Reject a storage buffer the device cannot bind in one piece.
pub(crate) fn check_storage_size(
    device: &wgpu::Device,
    label: &'static str,
    size: u64,
) -> Result<(), ResourceError> {
    let limits = device.limits();
    let max = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
    if size > max {
        return Err(ResourceError::BufferTooLarge { label, size, max });
    }
    Ok(())
}

/// GPU-resident stack of free slot indices (the dead list).
///
/// `slots[0..counters.live]` holds the free indices. The reset kernel refills
/// it with every index; the append kernel pops one per visible pixel.
pub struct FreeSlotPool {
    slots: wgpu::Buffer,
    counters: wgpu::Buffer,
    capacity: u32,
}

impl FreeSlotPool {
    pub fn new(device: &wgpu::Device, capacity: u32) -> Result<Self, ResourceError> {
        // A zero-length storage binding is invalid; keep one entry
        let size = capacity.max(1) as u64 * SLOT_INDEX_SIZE;
        check_storage_size(device, "free-slot-pool", size)?;

        let slots = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("free-slot-pool"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let counters = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("free-slot-counters"),
            size: COUNTERS_SIZE,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("FreeSlotPool: {} slots, {} KB", capacity, size / 1024);

        Ok(Self {
            slots,
            counters,
            capacity,
        })
    }

    pub fn slots(&self) -> &wgpu::Buffer {
        &self.slots
    }

    pub fn counters(&self) -> &wgpu::Buffer {
        &self.counters
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Zero `live` and `dropped`. Recorded ahead of the reset kernel.
    pub fn clear_counters(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.clear_buffer(&self.counters, 0, None);
    }

    pub fn destroy(&self) {
        self.slots.destroy();
        self.counters.destroy();
    }
}

/// GPU-resident array of `capacity` instance records, indexed by slot.
pub struct VoxelInstanceStore {
    instances: wgpu::Buffer,
    capacity: u32,
}

impl VoxelInstanceStore {
    /// Allocate the store with every slot dead, so a frame drawn before the
    /// first voxelization shows nothing.
    pub fn new(device: &wgpu::Device, capacity: u32) -> Result<Self, ResourceError> {
        let size = capacity.max(1) as u64 * INSTANCE_SIZE;
        check_storage_size(device, "voxel-instance-store", size)?;

        let dead = vec![VoxelInstance::DEAD; capacity.max(1) as usize];
        let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxel-instance-store"),
            contents: bytemuck::cast_slice(&dead),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });

        log::info!(
            "VoxelInstanceStore: {} slots, {} MB",
            capacity,
            size / (1024 * 1024)
        );

        Ok(Self {
            instances,
            capacity,
        })
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.instances
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn byte_size(&self) -> u64 {
        self.instances.size()
    }

    pub fn destroy(&self) {
        self.instances.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_size() {
        assert_eq!(std::mem::size_of::<VoxelInstance>(), 48);
        assert_eq!(INSTANCE_SIZE, 48);
    }

    #[test]
    fn test_instance_field_offsets() {
        let instance = VoxelInstance {
            position: [1.0, 2.0, 3.0],
            scale: 4.0,
            rotation: [5.0, 6.0, 7.0, 8.0],
            color: [9.0, 10.0, 11.0, 12.0],
        };
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&instance));
        assert_eq!(floats[3], 4.0);
        assert_eq!(floats[7], 8.0);
        assert_eq!(floats[11], 12.0);
    }

    #[test]
    fn test_counters_size() {
        assert_eq!(std::mem::size_of::<SlotCounters>(), 16);
    }

    #[test]
    fn test_dead_record() {
        assert!(VoxelInstance::DEAD.is_dead());
        assert_eq!(VoxelInstance::DEAD.rotation, [0.0, 0.0, 0.0, 1.0]);
        let mut live = VoxelInstance::DEAD;
        live.scale = 0.25;
        live.color[3] = 1.0;
        assert!(!live.is_dead());
    }
}
