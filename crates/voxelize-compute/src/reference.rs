//! CPU mirror of the compaction kernels.
//!
//! Identical algorithm exists in `shaders/compaction/voxelize.wgsl`: the free
//! list is a stack of slot indices behind one atomic height, pushed by the
//! reset phase and popped with a compare-exchange loop by the append phase.
//! `compact_parallel` runs the append phase on several threads to exercise
//! the same contention the GPU sees.

use std::sync::atomic::{AtomicU32, Ordering};

use voxelize_core::math::{grid_coord, pixel_index, voxel_world_position};
use voxelize_core::Rgba;

use crate::buffers::VoxelInstance;
use crate::pipeline::VoxelizeParams;
use crate::readback::VoxelizeStats;

/// Free list shared by every worker of one pass.
pub struct SlotStack {
    slots: Vec<AtomicU32>,
    live: AtomicU32,
    dropped: AtomicU32,
}

impl SlotStack {
    pub fn new(capacity: u32) -> Self {
        Self {
            slots: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            live: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Reset-phase push: reserve the top with a fetch-add, then store.
    pub fn push(&self, slot: u32) {
        let top = self.live.fetch_add(1, Ordering::AcqRel);
        self.slots[top as usize].store(slot, Ordering::Release);
    }

    /// Append-phase pop. `None` (and one more drop) when the stack is empty.
    pub fn pop(&self) -> Option<u32> {
        let mut height = self.live.load(Ordering::Acquire);
        loop {
            if height == 0 {
                self.dropped.fetch_add(1, Ordering::AcqRel);
                return None;
            }
            match self.live.compare_exchange_weak(
                height,
                height - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(self.slots[height as usize - 1].load(Ordering::Acquire)),
                Err(observed) => height = observed,
            }
        }
    }

    pub fn live(&self) -> u32 {
        self.live.load(Ordering::Acquire)
    }

    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Acquire)
    }

    /// Indices still on the stack, bottom first.
    pub fn remaining(&self) -> Vec<u32> {
        self.slots[..self.live() as usize]
            .iter()
            .map(|s| s.load(Ordering::Acquire))
            .collect()
    }
}

/// Result of one reference pass.
#[derive(Debug, Clone)]
pub struct Compaction {
    pub instances: Vec<VoxelInstance>,
    /// Slots handed out, in the order the pops completed.
    pub allocated_slots: Vec<u32>,
    pub free_slots: Vec<u32>,
    pub stats: VoxelizeStats,
}

/// Instance written for the visible pixel at `(tx, ty)`.
pub fn instance_for_pixel(tx: u32, ty: u32, color: Rgba, params: &VoxelizeParams) -> VoxelInstance {
    let dims = params.source_dims();
    let coord = grid_coord(pixel_index(tx, ty, params.texture_width), dims);
    let position = voxel_world_position(coord, dims, params.grid_scale);
    VoxelInstance {
        position: position.to_array(),
        scale: params.voxel_scale,
        rotation: voxelize_core::constants::IDENTITY_ROTATION,
        color: color.to_array(),
    }
}

fn pixel_at(pixels: &[Rgba], tx: u32, ty: u32, texture_width: u32) -> Rgba {
    pixels
        .get(pixel_index(tx, ty, texture_width) as usize)
        .copied()
        .unwrap_or(Rgba::TRANSPARENT)
}

/// Append phase over rows `rows` of the texture.
fn append_rows(
    stack: &SlotStack,
    pixels: &[Rgba],
    params: &VoxelizeParams,
    rows: std::ops::Range<u32>,
) -> Vec<(u32, VoxelInstance)> {
    let mut written = Vec::new();
    for ty in rows {
        for tx in 0..params.texture_width {
            let color = pixel_at(pixels, tx, ty, params.texture_width);
            if !color.is_visible() {
                continue;
            }
            if let Some(slot) = stack.pop() {
                written.push((slot, instance_for_pixel(tx, ty, color, params)));
            }
        }
    }
    written
}

fn finish(stack: SlotStack, written: Vec<(u32, VoxelInstance)>, capacity: u32) -> Compaction {
    let mut instances = vec![VoxelInstance::DEAD; capacity as usize];
    let mut allocated_slots = Vec::with_capacity(written.len());
    for (slot, instance) in written {
        instances[slot as usize] = instance;
        allocated_slots.push(slot);
    }
    let stats = VoxelizeStats {
        allocated: capacity - stack.live(),
        dropped: stack.dropped(),
        free_remaining: stack.live(),
    };
    Compaction {
        instances,
        allocated_slots,
        free_slots: stack.remaining(),
        stats,
    }
}

fn reset(capacity: u32) -> SlotStack {
    let stack = SlotStack::new(capacity);
    for slot in 0..capacity {
        stack.push(slot);
    }
    stack
}

/// Run one pass on the calling thread.
pub fn compact(pixels: &[Rgba], params: &VoxelizeParams) -> Compaction {
    let capacity = params.total_slot_count;
    let stack = reset(capacity);
    let written = append_rows(&stack, pixels, params, 0..params.texture_height);
    finish(stack, written, capacity)
}

/// Run one pass with the append phase split across `threads` workers by row.
pub fn compact_parallel(pixels: &[Rgba], params: &VoxelizeParams, threads: u32) -> Compaction {
    let capacity = params.total_slot_count;
    let stack = reset(capacity);
    let rows_per_worker = params.texture_height.div_ceil(threads.max(1)).max(1);

    let written: Vec<(u32, VoxelInstance)> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..params.texture_height)
            .step_by(rows_per_worker as usize)
            .map(|start| {
                let end = (start + rows_per_worker).min(params.texture_height);
                let stack = &stack;
                scope.spawn(move || append_rows(stack, pixels, params, start..end))
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    finish(stack, written, capacity)
}
