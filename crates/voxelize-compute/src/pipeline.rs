use voxelize_core::constants::{ALPHA_EPSILON, APPEND_WORKGROUP_EDGE, RESET_WORKGROUP_SIZE};
use voxelize_core::{GridConfig, TextureDims, TextureMetadata, VolumeDims};
use wgpu::util::DeviceExt;

use crate::buffers::{FreeSlotPool, VoxelInstanceStore};
use crate::error::ResourceError;
use crate::passes::{self, append, reset, Kernel};
use crate::source::SourceTexture;

/// Per-pass uniforms. 32 bytes. Must match VoxelizeParams in types.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VoxelizeParams {
    pub total_slot_count: u32,
    pub source_width: u32,
    pub source_height: u32,
    pub source_depth: u32,
    pub texture_width: u32,
    pub texture_height: u32,
    pub voxel_scale: f32,
    pub grid_scale: f32,
}

impl VoxelizeParams {
    pub fn new(total_slot_count: u32, grid: &GridConfig, metadata: &TextureMetadata) -> Self {
        Self {
            total_slot_count,
            source_width: metadata.volume_width,
            source_height: metadata.volume_height,
            source_depth: metadata.volume_depth,
            texture_width: metadata.texture_width,
            texture_height: metadata.texture_height,
            voxel_scale: grid.voxel_scale,
            grid_scale: grid.total_grid_scale,
        }
    }

    pub fn source_dims(&self) -> VolumeDims {
        VolumeDims::new(self.source_width, self.source_height, self.source_depth)
    }

    pub fn texture_dims(&self) -> TextureDims {
        TextureDims::new(self.texture_width, self.texture_height)
    }
}

const PARAMS_SIZE: u64 = std::mem::size_of::<VoxelizeParams>() as u64;

/// Compose the compaction shader: injected constants, shared types, the kernels.
pub fn shader_source() -> String {
    let constants_preamble = format!(
        "const RESET_WORKGROUP_SIZE: u32 = {}u;\nconst APPEND_WORKGROUP_EDGE: u32 = {}u;\nconst ALPHA_EPSILON: f32 = {:?};\n",
        RESET_WORKGROUP_SIZE, APPEND_WORKGROUP_EDGE, ALPHA_EPSILON,
    );
    let types_wgsl = include_str!("../../../shaders/common/types.wgsl");
    let coords_wgsl = include_str!("../../../shaders/common/coords.wgsl");
    let voxelize_wgsl = include_str!("../../../shaders/compaction/voxelize.wgsl");
    format!("{constants_preamble}\n{types_wgsl}\n{coords_wgsl}\n{voxelize_wgsl}")
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// The Reset and Append kernels plus their shared bindings.
///
/// Bindings: 0 params (uniform), 1 free slots, 2 counters, 3 instances,
/// 4 source texture.
pub struct CompactionPipeline {
    bind_group_layout: wgpu::BindGroupLayout,
    reset_pipeline: wgpu::ComputePipeline,
    append_pipeline: wgpu::ComputePipeline,
    params_buffer: wgpu::Buffer,
}

impl CompactionPipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("voxelize-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
                storage_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("voxelize-shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source().into()),
        });

        let reset_pipeline =
            passes::create_kernel_pipeline(device, &module, &bind_group_layout, Kernel::Reset);
        let append_pipeline =
            passes::create_kernel_pipeline(device, &module, &bind_group_layout, Kernel::Append);

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("voxelize-params"),
            size: PARAMS_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            bind_group_layout,
            reset_pipeline,
            append_pipeline,
            params_buffer,
        }
    }

    /// Bind a pool, store and source texture. Rebuilt whenever the source changes.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        pool: &FreeSlotPool,
        store: &VoxelInstanceStore,
        source: &SourceTexture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("voxelize-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: pool.slots().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: pool.counters().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: store.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(source.view()),
                },
            ],
        })
    }

    /// Record one voxelization: clear counters, Reset pass, Append pass.
    ///
    /// Each kernel gets its own compute pass, so every Reset write is visible
    /// before the first Append pop.
    pub fn record(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        pool: &FreeSlotPool,
        bind_group: &wgpu::BindGroup,
        params: &VoxelizeParams,
    ) -> Result<(), ResourceError> {
        let max_groups = device.limits().max_compute_workgroups_per_dimension;
        let reset_groups = reset::reset_workgroups(params.total_slot_count, max_groups)?;
        let append_groups = append::append_workgroups(params.texture_dims(), max_groups)?;

        // Staged through the encoder so several passes in one submission each
        // see their own parameters
        let staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxelize-params-staging"),
            contents: bytemuck::bytes_of(params),
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        encoder.copy_buffer_to_buffer(&staging, 0, &self.params_buffer, 0, PARAMS_SIZE);

        pool.clear_counters(encoder);

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("voxelize-reset-pass"),
                timestamp_writes: None,
            });
            reset::dispatch_reset(&mut pass, &self.reset_pipeline, bind_group, reset_groups);
        }

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("voxelize-append-pass"),
                timestamp_writes: None,
            });
            append::dispatch_append(&mut pass, &self.append_pipeline, bind_group, append_groups);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelize_core::Rgba;

    #[test]
    fn test_params_size() {
        assert_eq!(std::mem::size_of::<VoxelizeParams>(), 32);
    }

    #[test]
    fn test_params_from_metadata() {
        let grid = GridConfig::default();
        let metadata = TextureMetadata::resolve("k_20-12-30_128-128").expect("valid name");
        let params = VoxelizeParams::new(grid.total_slot_count() as u32, &grid, &metadata);
        assert_eq!(params.total_slot_count, 262_144);
        assert_eq!(params.source_dims(), VolumeDims::new(20, 12, 30));
        assert_eq!(params.texture_dims(), TextureDims::new(128, 128));
        assert_eq!(params.voxel_scale, 0.25);
        assert_eq!(params.grid_scale, 16.0);
    }

    #[test]
    fn test_shader_source_has_constants() {
        let source = shader_source();
        assert!(source.contains("const RESET_WORKGROUP_SIZE: u32 = 256u;"));
        assert!(source.contains("const APPEND_WORKGROUP_EDGE: u32 = 8u;"));
        assert!(source.contains("const ALPHA_EPSILON: f32 = 0.001953125;"));
        // Types precede the kernels that use them
        let types_at = source.find("struct VoxelInstance").expect("types included");
        let kernel_at = source.find("fn reset_instances").expect("kernels included");
        assert!(types_at < kernel_at);
    }

    #[test]
    fn test_alpha_threshold_matches_cpu_test() {
        assert!(!Rgba::from_rgba8([255, 255, 255, 0]).is_visible());
        assert!(Rgba::from_rgba8([0, 0, 0, 1]).is_visible());
    }
}
