//! GPU device/queue helper.

use wgpu::{Device, Instance, Queue};

use crate::error::{RegionError, Result};

/// wgpu instance, device and queue shared by the GPU backend.
pub struct GpuContext {
    /// Instance used to create adapters
    pub instance: Instance,
    /// Logical device
    pub device: Device,
    /// Submission queue
    pub queue: Queue,
}

impl GpuContext {
    /// Create a context on a high-performance adapter. Missing adapters are an
    /// error, not a panic, so callers can fall back to the host backend.
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RegionError::NoAdapter)?;
        // Ask for everything the adapter offers: region maps can be large.
        let required_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("magrid-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                },
                None,
            )
            .await?;
        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "gpu.context");
        Ok(Self { instance, device, queue })
    }

    /// Blocking variant of [`GpuContext::new`].
    pub fn blocking() -> Result<Self> {
        pollster::block_on(Self::new())
    }
}
