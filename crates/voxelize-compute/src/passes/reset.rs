use voxelize_core::constants::RESET_WORKGROUP_SIZE;

use crate::error::ResourceError;

/// Workgroups for the reset kernel: one thread per slot, 256 per group.
pub fn reset_workgroups(slot_count: u32, max_per_dimension: u32) -> Result<u32, ResourceError> {
    let groups = slot_count.div_ceil(RESET_WORKGROUP_SIZE);
    if groups > max_per_dimension {
        return Err(ResourceError::DispatchTooLarge {
            kernel: "reset",
            groups: groups as u64,
            max: max_per_dimension,
        });
    }
    Ok(groups)
}

/// Dispatch the reset kernel over every slot.
pub fn dispatch_reset(
    pass: &mut wgpu::ComputePass,
    pipeline: &wgpu::ComputePipeline,
    bind_group: &wgpu::BindGroup,
    groups: u32,
) {
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.dispatch_workgroups(groups, 1, 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_groups_round_up() {
        assert_eq!(reset_workgroups(0, 65535).ok(), Some(0));
        assert_eq!(reset_workgroups(1, 65535).ok(), Some(1));
        assert_eq!(reset_workgroups(256, 65535).ok(), Some(1));
        assert_eq!(reset_workgroups(257, 65535).ok(), Some(2));
        assert_eq!(reset_workgroups(64 * 64 * 64, 65535).ok(), Some(1024));
    }

    #[test]
    fn test_reset_groups_limit() {
        let result = reset_workgroups(256 * 10 + 1, 10);
        assert!(matches!(
            result,
            Err(ResourceError::DispatchTooLarge { groups: 11, .. })
        ));
    }
}
