pub mod append;
pub mod reset;

/// The two compaction kernels, resolved to entry points of one shader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    Reset,
    Append,
}

impl Kernel {
    pub const ALL: [Kernel; 2] = [Kernel::Reset, Kernel::Append];

    pub fn entry_point(self) -> &'static str {
        match self {
            Kernel::Reset => "reset_instances",
            Kernel::Append => "append_instances",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Kernel::Reset => "voxelize-reset",
            Kernel::Append => "voxelize-append",
        }
    }
}

/// Create the compute pipeline for one kernel.
pub fn create_kernel_pipeline(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    bind_group_layout: &wgpu::BindGroupLayout,
    kernel: Kernel,
) -> wgpu::ComputePipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("voxelize-pipeline-layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(kernel.label()),
        layout: Some(&layout),
        module,
        entry_point: Some(kernel.entry_point()),
        compilation_options: Default::default(),
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_are_distinct() {
        assert_ne!(Kernel::Reset.entry_point(), Kernel::Append.entry_point());
    }

    #[test]
    fn test_entry_points_exist_in_shader() {
        let source = include_str!("../../../../shaders/compaction/voxelize.wgsl");
        for kernel in Kernel::ALL {
            let needle = format!("fn {}(", kernel.entry_point());
            assert!(source.contains(&needle), "missing {needle}");
        }
    }
}
