//! wgpu/winit backend for the runic cell-grid compositor.
//!
//! Owns the window, the GPU device and the render path: every dirty anchor
//! the [`Screen`] sweep dispatches ends up as one textured quad drawn
//! through a shared unit-quad pipeline. Mesh runes are pre-rendered into
//! sprite textures by an off-screen pass.
//!
//! Uses:
//! - [`wgpu`] for GPU rendering
//! - [`winit`] for window creation and input events
//! - [`fontdue`] for glyph rasterization
//! - [`image`] for page-image decode

pub mod assets;
mod error;
mod offscreen;
mod quad;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use runic_core::{Assets, Mat4, Screen};

use assets::{FontLoader, PageLoader};
use quad::{QuadBatch, QuadPipeline};

pub use error::BackendError;
pub use offscreen::{OffscreenRenderer, SPRITE_SIZE};
pub use store::WgpuTextureStore;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the frontend.
pub struct Config {
    /// Window title.
    pub title: String,
    /// Font bytes (TTF/OTF). Required; init fails without a font.
    pub font_data: Option<Vec<u8>>,
    /// Font size in pixels.
    pub font_size: f32,
    /// Initial grid columns.
    pub cols: usize,
    /// Initial grid rows.
    pub rows: usize,
    /// Square cell edge in pixels.
    pub cell_size: u32,
    /// Directory page images and meshes are resolved against.
    pub asset_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "runic".into(),
            font_data: None,
            font_size: 28.0,
            cols: 80,
            rows: 24,
            cell_size: 32,
            asset_dir: ".".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// GPU state
// ---------------------------------------------------------------------------

struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    store: WgpuTextureStore,
    offscreen: OffscreenRenderer,
    /// Created on the first flush, cached for the process lifetime.
    pipeline: Option<QuadPipeline>,
    batch: QuadBatch,
}

// ---------------------------------------------------------------------------
// Frontend
// ---------------------------------------------------------------------------

/// The window + GPU frontend driving a [`Screen`].
///
/// Owns the main-thread event loop. Grid mutations happen through
/// [`screen_mut`](Frontend::screen_mut) before [`run`](Frontend::run) or
/// from event handling between frames; each `RedrawRequested` runs the
/// update pass and then composes a full frame.
pub struct Frontend {
    config: Config,
    screen: Screen,
    glyphs: FontLoader,
    pages: PageLoader,
    gpu: Option<GpuState>,
    window: Option<Arc<Window>>,
    cursor: (f64, f64),
    quit: bool,
}

impl Frontend {
    pub fn new(config: Config) -> Result<Self, BackendError> {
        let screen = Screen::new(config.cols, config.rows)?
            .with_cell_size(config.cell_size as f32);
        let font_data = config
            .font_data
            .as_deref()
            .ok_or_else(|| BackendError::Font("no font data supplied".into()))?;
        let glyphs = FontLoader::new(font_data, config.font_size, config.cell_size)?;
        let pages = PageLoader::new(&config.asset_dir);
        Ok(Self {
            config,
            screen,
            glyphs,
            pages,
            gpu: None,
            window: None,
            cursor: (0.0, 0.0),
            quit: false,
        })
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    /// Run the event loop until quit. Consumes the frontend.
    pub fn run(mut self) -> Result<(), BackendError> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    /// Request shutdown; the event loop exits after the current event.
    pub fn quit(&mut self) {
        log::info!("quit requested");
        self.quit = true;
    }

    /// Create the window and GPU state. All failures here are fatal.
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), BackendError> {
        let (pw, ph) = self.screen.pixel_size();
        let (pw, ph) = (pw as u32, ph as u32);

        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(pw.max(1), ph.max(1)))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        let (device, queue) =
            block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: pw.max(1),
            height: ph.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let store = WgpuTextureStore::new(device.clone(), queue.clone());
        let offscreen = OffscreenRenderer::new(device.clone(), queue.clone());

        log::info!(
            "frontend up: {}x{} cells, {}px cells, {:?} surface",
            self.screen.cols(),
            self.screen.rows(),
            self.config.cell_size,
            surface_format
        );

        self.gpu = Some(GpuState {
            device,
            queue,
            surface,
            surface_config,
            store,
            offscreen,
            pipeline: None,
            batch: QuadBatch::default(),
        });
        self.window = Some(window);
        Ok(())
    }

    /// Update pass then a full redraw.
    fn update(&mut self) {
        self.screen.update_runes();
        self.redraw();
    }

    /// Compose the screen and present one frame.
    fn redraw(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        gpu.batch.clear();
        {
            let mut assets = Assets {
                glyphs: &mut self.glyphs,
                pages: &mut self.pages,
                meshes: &mut gpu.offscreen,
                store: &mut gpu.store,
            };
            self.screen.compose(&mut assets, &mut gpu.batch);
        }

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("no surface frame: {e}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let format = gpu.surface_config.format;
        let pipeline = gpu
            .pipeline
            .get_or_insert_with(|| QuadPipeline::new(&gpu.device, format, gpu.store.texture_layout()));

        // Pixel space with the origin at the top-left cell.
        let (pw, ph) = self.screen.pixel_size();
        let mvp = Mat4::orthographic(0.0, pw, 0.0, ph, -1.0, 1.0);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("runic encoder"),
            });
        pipeline.flush(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &view,
            &gpu.store,
            &gpu.batch,
            &mvp,
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }

    /// Hit-test hook for button presses. Resolves the pressed cell and logs
    /// it; editor-side dispatch hangs off this later.
    fn on_mouse_press(&mut self, x: f64, y: f64) {
        match self.screen.cell_at_pixel(x as f32, y as f32) {
            Some(cell) => log::info!("mouse press on cell ({}, {})", cell.y, cell.x),
            None => log::debug!("mouse press outside the grid at ({x:.0}, {y:.0})"),
        }
    }

    fn on_mouse_release(&mut self, x: f64, y: f64) {
        if let Some(cell) = self.screen.cell_at_pixel(x as f32, y as f32) {
            log::info!("mouse release on cell ({}, {})", cell.y, cell.x);
        }
    }

    /// Surface resize: reconfigure and rescale the logical grid extent.
    fn resize(&mut self, width: u32, height: u32) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        gpu.surface_config.width = width.max(1);
        gpu.surface_config.height = height.max(1);
        gpu.surface.configure(&gpu.device, &gpu.surface_config);

        let cell = self.config.cell_size.max(1) as usize;
        let cols = width as usize / cell;
        let rows = height as usize / cell;
        if let Err(e) = self.screen.resize(cols, rows) {
            log::warn!("window outgrew the grid: {e}");
        }
    }
}

impl ApplicationHandler for Frontend {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("init failed: {e}");
            event_loop.exit();
            return;
        }
        self.redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.quit();
            }

            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.resize(width, height);
                self.redraw();
            }

            WindowEvent::RedrawRequested => {
                self.update();
                // Animation runs continuously; ask for the next frame.
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
            }

            WindowEvent::MouseInput { state, .. } => {
                let (x, y) = self.cursor;
                match state {
                    ElementState::Pressed => self.on_mouse_press(x, y),
                    ElementState::Released => self.on_mouse_release(x, y),
                }
            }

            _ => {}
        }

        if self.quit {
            event_loop.exit();
        }
    }
}

// ---------------------------------------------------------------------------
// Minimal block_on (avoids pulling in an async runtime)
// ---------------------------------------------------------------------------

/// Spin-poll a future to completion. The adapter/device requests resolve
/// almost immediately on desktop.
fn block_on<F: std::future::Future>(f: F) -> F::Output {
    let mut f = std::pin::pin!(f);
    let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
    loop {
        match f.as_mut().poll(&mut cx) {
            std::task::Poll::Ready(v) => return v,
            std::task::Poll::Pending => std::thread::yield_now(),
        }
    }
}
