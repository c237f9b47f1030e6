//! GPU pass tests, checked against the CPU reference in `reference.rs`.
//!
//! Gated behind `#[cfg(feature = "gpu_tests")]` since they need a GPU adapter;
//! they return early when none is available.

#[cfg(all(test, feature = "gpu_tests"))]
mod tests {
    use voxelize_core::math::grid_coord;
    use voxelize_core::{GridConfig, Rgba, VolumeDims};
    use voxelize_xraw::format::{VoxelVolume, XRawHeader};
    use voxelize_xraw::EncodedVoxelTexture;

    use crate::device::request_headless_device;
    use crate::grid::{VoxelGrid, VoxelizeRequest};
    use crate::pipeline::VoxelizeParams;
    use crate::readback::read_instances;
    use crate::reference;

    fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
        match request_headless_device("voxelize-test-device") {
            Ok((_, device, queue)) => Some((device, queue)),
            Err(e) => {
                eprintln!("skipping GPU test: {e}");
                None
            }
        }
    }

    fn checker(dims: VolumeDims) -> EncodedVoxelTexture {
        let indices = (0..dims.voxel_count())
            .map(|i| {
                let c = grid_coord(i, dims);
                ((c.x + c.y + c.z) % 2) as u8
            })
            .collect();
        let palette = vec![Rgba::TRANSPARENT, Rgba::from_rgba8([255, 128, 0, 255])];
        let volume = VoxelVolume {
            header: XRawHeader::rgba8(dims, palette.len()),
            dims,
            indices,
            palette,
        };
        voxelize_xraw::encode(&volume, "checker").expect("encode should succeed")
    }

    fn grid_config(edge: u32) -> GridConfig {
        GridConfig {
            voxel_num: [edge, edge, edge],
            ..Default::default()
        }
    }

    fn sorted_positions(instances: &[crate::buffers::VoxelInstance]) -> Vec<[i64; 3]> {
        let mut positions: Vec<[i64; 3]> = instances
            .iter()
            .filter(|i| !i.is_dead())
            .map(|i| i.position.map(|c| (c * 1024.0).round() as i64))
            .collect();
        positions.sort_unstable();
        positions
    }

    #[test]
    fn test_gpu_pass_matches_reference() {
        let Some((device, queue)) = device() else {
            return;
        };
        let tex = checker(VolumeDims::new(6, 5, 4));
        let config = grid_config(8);
        let mut grid = VoxelGrid::new(&device, &config).expect("grid");
        grid.load(&device, &queue, &tex).expect("upload");

        let stats = grid
            .voxelize_now(&device, &queue)
            .expect("pass")
            .expect("stats");
        assert_eq!(stats.allocated as u64, tex.visible_count());
        assert_eq!(stats.dropped, 0);

        let gpu = read_instances(&device, &queue, grid.instance_buffer()).expect("readback");
        let params = VoxelizeParams::new(grid.capacity(), &config, &tex.metadata);
        let cpu = reference::compact(&tex.pixels, &params);

        // Each pop wrote a distinct slot, so live records equal allocations
        assert_eq!(gpu.iter().filter(|i| !i.is_dead()).count() as u32, stats.allocated);
        assert_eq!(sorted_positions(&gpu), sorted_positions(&cpu.instances));
    }

    #[test]
    fn test_gpu_overflow_is_counted() {
        let Some((device, queue)) = device() else {
            return;
        };
        let tex = checker(VolumeDims::new(8, 8, 8));
        let mut grid = VoxelGrid::new(&device, &grid_config(4)).expect("grid");
        grid.load(&device, &queue, &tex).expect("upload");

        let stats = grid
            .voxelize_now(&device, &queue)
            .expect("pass")
            .expect("stats");
        assert_eq!(stats.allocated, 64);
        assert_eq!(stats.dropped as u64, tex.visible_count() - 64);
        assert_eq!(stats.free_remaining, 0);
    }

    #[test]
    fn test_bad_name_keeps_previous_parameters() {
        let Some((device, queue)) = device() else {
            return;
        };
        let tex = checker(VolumeDims::new(4, 4, 4));
        let mut grid = VoxelGrid::new(&device, &grid_config(8)).expect("grid");
        grid.load(&device, &queue, &tex).expect("upload");
        grid.voxelize_now(&device, &queue).expect("first pass");

        grid.request(VoxelizeRequest::SetSourceParams("not-canonical".into()));
        grid.request(VoxelizeRequest::Voxelize);
        let stats = grid
            .voxelize_now(&device, &queue)
            .expect("second pass")
            .expect("stats");
        assert_eq!(grid.metadata(), Some(&tex.metadata));
        assert_eq!(stats.allocated as u64, tex.visible_count());
        assert_eq!(grid.pass_count(), 2);
    }

    #[test]
    fn test_voxelize_without_source_is_skipped() {
        let Some((device, queue)) = device() else {
            return;
        };
        let mut grid = VoxelGrid::new(&device, &grid_config(4)).expect("grid");
        grid.request(VoxelizeRequest::Voxelize);
        let stats = grid.voxelize_now(&device, &queue).expect("no error");
        assert!(stats.is_none());
        assert_eq!(grid.pending_requests(), 0);

        // Fresh store is all dead records
        let instances = read_instances(&device, &queue, grid.instance_buffer()).expect("readback");
        assert!(instances.iter().all(|i| i.is_dead()));
    }

    #[test]
    fn test_replaced_source_outlives_recorded_encoder() {
        let Some((device, queue)) = device() else {
            return;
        };
        let first = checker(VolumeDims::new(4, 4, 4));
        let second = checker(VolumeDims::new(2, 2, 2));
        let mut grid = VoxelGrid::new(&device, &grid_config(8)).expect("grid");
        grid.load(&device, &queue, &first).expect("first upload");

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("recorded-before-replace"),
        });
        let processed = grid
            .process_requests(&device, &mut encoder)
            .expect("record");
        assert_eq!(processed.passes, 1);

        // Replace the source while the encoder still references the first texture
        grid.load(&device, &queue, &second).expect("second upload");
        assert_eq!(grid.retired_sources(), 1);
        queue.submit(std::iter::once(encoder.finish()));
        grid.read_stats(&device).expect("first stats");

        let stats = grid
            .voxelize_now(&device, &queue)
            .expect("second pass")
            .expect("stats");
        assert_eq!(grid.retired_sources(), 0);
        assert_eq!(stats.allocated as u64, second.visible_count());
    }
}
