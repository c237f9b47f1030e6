//! One voxelization pass (and optionally one rendered frame) without a window.

use std::path::{Path, PathBuf};

use glam::Mat4;
use voxelize_compute::{request_headless_device, VoxelGrid};
use voxelize_core::config::load_config_from_str;
use voxelize_core::VoxelizeConfig;
use voxelize_render::target::COLOR_FORMAT;
use voxelize_render::{OffscreenTarget, OrbitCamera, PointRenderer, PointUniforms};
use voxelize_xraw::{encode_rgba8_png, load_png};

use crate::bake::write_atomic;
use crate::error::BakeError;
use crate::report::VoxelizeReport;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

#[derive(Debug, Clone)]
pub struct FrameOptions {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Read a RON config file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<VoxelizeConfig, BakeError> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(load_config_from_str(&text)?)
        }
        None => Ok(VoxelizeConfig::default()),
    }
}

/// Load a baked texture, run one pass on a native adapter and report the counts.
pub fn run_voxelize(
    input: &Path,
    config: &VoxelizeConfig,
    frame: Option<&FrameOptions>,
) -> Result<VoxelizeReport, BakeError> {
    let texture = load_png(input).map_err(|e| BakeError::format(input, e))?;
    let (_adapter, device, queue) = request_headless_device("xraw-bake-device")?;

    let mut grid = VoxelGrid::new(&device, &config.grid)?;
    grid.load(&device, &queue, &texture)?;
    let stats = grid.voxelize_now(&device, &queue)?.unwrap_or_default();

    let mut report = VoxelizeReport::new(input, &texture, grid.capacity(), stats);

    if let Some(frame) = frame {
        let target = OffscreenTarget::new(&device, frame.width, frame.height)?;
        let mut renderer = PointRenderer::new(&device, COLOR_FORMAT);
        renderer.bind_instances(&device, grid.instance_buffer(), grid.capacity());

        let camera = OrbitCamera::framing(&config.grid);
        let uniforms = PointUniforms::new(
            &config.render,
            camera.view_proj(frame.width, frame.height),
            Mat4::IDENTITY,
            camera.eye_position(),
        );
        renderer.update_uniforms(&queue, &uniforms);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("xraw-bake-frame"),
        });
        renderer.render(
            &mut encoder,
            target.color_view(),
            target.depth_view(),
            CLEAR_COLOR,
        );
        queue.submit(std::iter::once(encoder.finish()));

        let rgba = target.read_rgba8(&device, &queue)?;
        let png = encode_rgba8_png(&rgba, frame.width, frame.height)
            .map_err(|e| BakeError::format(&frame.path, e))?;
        write_atomic(&frame.path, &png)?;
        log::info!("Wrote frame {}", frame.path.display());
        report.frame = Some(frame.path.display().to_string());
    }

    Ok(report)
}
