use voxelize_core::VoxelizeError;

use crate::error::ResourceError;

/// Bring up a device with no surface. Blocks on the async adapter request.
pub fn request_headless_device(
    label: &str,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), VoxelizeError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok_or_else(|| VoxelizeError::AdapterNotFound("no suitable GPU adapter found".into()))?;

    log::info!("Voxelize adapter: {}", adapter.get_info().name);

    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
        },
        None,
    ))
    .map_err(|e| VoxelizeError::DeviceRequestFailed(e.to_string()))?;

    Ok((adapter, device, queue))
}

/// Run `f` inside out-of-memory and validation error scopes and turn any
/// captured error into a `ResourceError`.
pub fn with_error_scope<T>(
    device: &wgpu::Device,
    f: impl FnOnce() -> Result<T, ResourceError>,
) -> Result<T, ResourceError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());

    if let Some(err) = out_of_memory {
        return Err(ResourceError::OutOfMemory(err.to_string()));
    }
    if let Some(err) = validation {
        return Err(ResourceError::Validation(err.to_string()));
    }
    value
}
