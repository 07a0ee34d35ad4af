//! GPU device acquisition
//!
//! Headless wgpu setup. The shadow passes only need a device and a queue;
//! surface/window management belongs to the host application.

use std::fmt;

/// Device and queue for headless rendering
pub struct RenderContext {
    /// The wgpu device
    pub device: wgpu::Device,
    /// The submission queue
    pub queue: wgpu::Queue,
}

/// GPU initialization failure
#[derive(Debug, Clone)]
pub enum GpuError {
    /// No adapter matched the request
    NoAdapter,
    /// The adapter refused the device request
    DeviceRequest(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "no suitable GPU adapter found"),
            Self::DeviceRequest(msg) => write!(f, "device request failed: {msg}"),
        }
    }
}

impl std::error::Error for GpuError {}

impl RenderContext {
    /// Acquire a device without a window surface.
    ///
    /// # Errors
    ///
    /// Returns an error when no adapter is available (common on headless
    /// CI machines) or the device request is refused. Callers treat this
    /// as "run without shadows", not as a fatal condition.
    pub fn headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;

        log::info!("using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("umbra_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| GpuError::DeviceRequest(e.to_string()))?;

        Ok(Self { device, queue })
    }
}
