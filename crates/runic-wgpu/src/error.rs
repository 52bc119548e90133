//! Backend error types.

use thiserror::Error;

/// Startup and event-loop failures.
///
/// Everything here is fatal: without an adapter, device, surface or font
/// there is no usable frontend, so init aborts instead of limping on with a
/// partial one. Per-resource load failures during a frame are *not* of this
/// kind; those go through `runic_core::LoadError` and resolve to the
/// no-texture sentinel.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("surface creation: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("device request: {0}")]
    NoDevice(#[from] wgpu::RequestDeviceError),

    #[error("font: {0}")]
    Font(String),

    #[error("screen setup: {0}")]
    Screen(#[from] runic_core::MutationError),
}
