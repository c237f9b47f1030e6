use voxelize_compute::buffers::INSTANCE_SIZE;

use crate::uniforms::{PointUniforms, POINT_UNIFORMS_SIZE};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Compose the point shader: shared types + points.wgsl.
pub fn shader_source() -> String {
    let types_wgsl = include_str!("../../../shaders/common/types.wgsl");
    let points_wgsl = include_str!("../../../shaders/render/points.wgsl");
    format!("{types_wgsl}\n{points_wgsl}")
}

/// Slots to draw for a store of `capacity` records. The buffer may be padded
/// past its capacity, so its size only caps the count.
pub fn drawn_slot_count(capacity: u32, buffer_size: u64) -> u32 {
    let held = u32::try_from(buffer_size / INSTANCE_SIZE).unwrap_or(u32::MAX);
    capacity.min(held)
}

struct BoundInstances {
    bind_group: wgpu::BindGroup,
    slot_count: u32,
}

/// Draws every slot of an instance store as one point. Dead slots land
/// outside the clip volume in the vertex stage; nothing is culled on the host.
pub struct PointRenderer {
    pipeline: wgpu::RenderPipeline,
    bgl: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    instances: Option<BoundInstances>,
}

impl PointRenderer {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("points-shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source().into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("point-uniforms"),
            size: POINT_UNIFORMS_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("points-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("points-pipeline-layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("points-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bgl,
            uniform_buffer,
            instances: None,
        }
    }

    /// Bind an instance store of `capacity` slots. Every frame then draws all of them.
    pub fn bind_instances(
        &mut self,
        device: &wgpu::Device,
        instance_buffer: &wgpu::Buffer,
        capacity: u32,
    ) {
        let slot_count = drawn_slot_count(capacity, instance_buffer.size());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("points-bg"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: instance_buffer.as_entire_binding(),
                },
            ],
        });
        log::debug!("PointRenderer: bound {} instance slots", slot_count);
        self.instances = Some(BoundInstances {
            bind_group,
            slot_count,
        });
    }

    pub fn slot_count(&self) -> u32 {
        self.instances.as_ref().map_or(0, |i| i.slot_count)
    }

    pub fn update_uniforms(&self, queue: &wgpu::Queue, uniforms: &PointUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Record the point pass. Clears color and depth first.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        clear: wgpu::Color,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("points-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(instances) = &self.instances else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &instances.bind_group, &[]);
        pass.draw(0..instances.slot_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_declares_entry_points() {
        let source = shader_source();
        assert!(source.contains("fn vs_main"));
        assert!(source.contains("fn fs_main"));
        assert!(source.contains("struct VoxelInstance"));
    }

    #[test]
    fn test_shader_uniform_fields_in_order() {
        let source = shader_source();
        let fields = [
            "view_proj:",
            "local_to_world:",
            "eye:",
            "ambient:",
            "specular:",
            "distractor_position:",
            "distractor_radius:",
            "material:",
            "params:",
        ];
        let start = source.find("struct PointUniforms").expect("uniform struct");
        let mut cursor = start;
        for field in fields {
            let at = source[cursor..].find(field).expect(field) + cursor;
            cursor = at;
        }
    }

    #[test]
    fn test_empty_grid_draws_no_slots() {
        // A zero-capacity store is still padded to one record
        assert_eq!(drawn_slot_count(0, INSTANCE_SIZE), 0);
    }

    #[test]
    fn test_drawn_slots_capped_by_buffer() {
        assert_eq!(drawn_slot_count(64, 64 * INSTANCE_SIZE), 64);
        assert_eq!(drawn_slot_count(64, 10 * INSTANCE_SIZE), 10);
    }
}
