use voxelize_core::constants::APPEND_WORKGROUP_EDGE;
use voxelize_core::TextureDims;

use crate::error::ResourceError;

/// Workgroups for the append kernel: one thread per texture pixel in 8x8 tiles.
pub fn append_workgroups(
    texture: TextureDims,
    max_per_dimension: u32,
) -> Result<(u32, u32, u32), ResourceError> {
    let x = texture.width.div_ceil(APPEND_WORKGROUP_EDGE);
    let y = texture.height.div_ceil(APPEND_WORKGROUP_EDGE);
    let largest = x.max(y);
    if largest > max_per_dimension {
        return Err(ResourceError::DispatchTooLarge {
            kernel: "append",
            groups: largest as u64,
            max: max_per_dimension,
        });
    }
    Ok((x, y, 1))
}

/// Dispatch the append kernel over the source texture.
pub fn dispatch_append(
    pass: &mut wgpu::ComputePass,
    pipeline: &wgpu::ComputePipeline,
    bind_group: &wgpu::BindGroup,
    groups: (u32, u32, u32),
) {
    if groups.0 == 0 || groups.1 == 0 {
        return;
    }
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.dispatch_workgroups(groups.0, groups.1, groups.2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_groups_cover_texture() {
        let groups = append_workgroups(TextureDims::new(1024, 1024), 65535).ok();
        assert_eq!(groups, Some((128, 128, 1)));
        let groups = append_workgroups(TextureDims::new(4, 4), 65535).ok();
        assert_eq!(groups, Some((1, 1, 1)));
        let groups = append_workgroups(TextureDims::new(0, 0), 65535).ok();
        assert_eq!(groups, Some((0, 0, 1)));
    }

    #[test]
    fn test_append_groups_limit() {
        let result = append_workgroups(TextureDims::new(8192, 8), 512);
        assert!(matches!(
            result,
            Err(ResourceError::DispatchTooLarge { groups: 1024, .. })
        ));
    }
}
