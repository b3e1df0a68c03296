//! geomip - clipmap terrain demo

use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use geomip::core::{
    camera::Camera,
    camera_controller::FlyCameraController,
    config::{HeightmapSource, TerrainConfig},
    input::InputState,
    logging,
    time::FrameTimer,
    types::Result,
};
use geomip::render::{context::GpuContext, depth::DepthTexture, pipeline::TerrainPipeline, WgpuDevice};
use geomip::terrain::Terrain;

/// Eye height above the ground at startup
const START_HEIGHT: f32 = 60.0;

struct Renderer {
    gpu: GpuContext,
    device: WgpuDevice,
    pipeline: TerrainPipeline,
    depth: DepthTexture,
    terrain: Terrain<WgpuDevice>,
}

impl Renderer {
    fn new(gpu: GpuContext, config: TerrainConfig, camera: &mut Camera) -> Result<Self> {
        let mut device = WgpuDevice::new(gpu.device.clone(), gpu.queue.clone());
        let pipeline = TerrainPipeline::new(&mut device, gpu.format())?;
        let (width, height) = gpu.size();
        let depth = DepthTexture::new(&gpu.device, width, height);

        let mut terrain = Terrain::from_config(config)?;
        camera.position.z = terrain.height_at(camera.position.x, camera.position.y) + START_HEIGHT;
        terrain.create(&mut device, &*camera)?;

        Ok(Self {
            gpu,
            device,
            pipeline,
            depth,
            terrain,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.depth.resize(&self.gpu.device, width, height);
    }
}

struct App {
    config: TerrainConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    camera: Camera,
    controller: FlyCameraController,
    input: InputState,
    timer: FrameTimer,
    cursor_grabbed: bool,
    debug_shading: bool,
}

impl App {
    fn new(config: TerrainConfig) -> Self {
        let debug_shading = config.debug_shading;
        Self {
            config,
            window: None,
            renderer: None,
            camera: Camera::new(glam::Vec3::ZERO, 60.0, 16.0 / 9.0),
            controller: FlyCameraController::default(),
            input: InputState::new(),
            timer: FrameTimer::new(),
            cursor_grabbed: false,
            debug_shading,
        }
    }

    fn toggle_cursor_grab(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        self.cursor_grabbed = !self.cursor_grabbed;
        if self.cursor_grabbed {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                log::warn!("Cursor grab failed: {}", e);
            }
            window.set_cursor_visible(false);
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
        }
        self.input.set_mouse_captured(self.cursor_grabbed);
    }

    /// F1 is the finest level, F2 the next coarser, and so on
    fn toggle_level(&mut self, key: usize) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        let levels = renderer.terrain.levels();
        let Some(index) = levels.len().checked_sub(key + 1) else {
            return;
        };
        let active = levels[index].is_active();
        renderer.terrain.set_level_active(index, !active);
    }

    fn render(&mut self) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        self.timer.tick();
        let dt = self.timer.delta_secs();

        let terrain = &renderer.terrain;
        self.controller.update(&mut self.camera, &self.input, dt, |x, y| terrain.height_at(x, y));

        if let Err(e) = renderer.terrain.update(&mut renderer.device, &self.camera, &self.camera) {
            log::error!("Terrain update failed: {}", e);
            return;
        }

        let frame = match renderer.gpu.get_current_texture() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                let (width, height) = renderer.gpu.size();
                renderer.gpu.resize(width, height);
                return;
            }
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = renderer
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("frame_encoder") });
        let list = renderer.terrain.draw(&self.camera);
        renderer.pipeline.render(&renderer.device, &mut encoder, &view, &renderer.depth, &list);
        renderer.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        self.input.end_frame();

        if self.timer.frame_count() % 30 == 0 {
            if let Some(window) = &self.window {
                let active = renderer.terrain.levels().iter().filter(|l| l.is_active()).count();
                window.set_title(&format!(
                    "geomip - {:.0} fps - {} levels - ({:.0}, {:.0}, {:.0})",
                    self.timer.fps(),
                    active,
                    self.camera.position.x,
                    self.camera.position.y,
                    self.camera.position.z,
                ));
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("geomip")
            .with_inner_size(PhysicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs).expect("Failed to create window"));

        let gpu = pollster::block_on(GpuContext::new(window.clone())).expect("Failed to create GPU context");

        let size = window.inner_size();
        self.camera.set_aspect(size.width as f32, size.height as f32);

        log::info!("Window created: {}x{}", size.width, size.height);
        log::info!("GPU: {}", gpu.adapter.get_info().name);

        match Renderer::new(gpu, self.config.clone(), &mut self.camera) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                log::error!("Failed to create terrain: {}", e);
                event_loop.exit();
                return;
            }
        }
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.process_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(size.width, size.height);
                    }
                    self.camera.set_aspect(size.width as f32, size.height as f32);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        match code {
                            KeyCode::Escape => {
                                if self.cursor_grabbed {
                                    self.toggle_cursor_grab();
                                } else {
                                    event_loop.exit();
                                }
                            }
                            KeyCode::Tab => self.toggle_cursor_grab(),
                            KeyCode::F1 => self.toggle_level(0),
                            KeyCode::F2 => self.toggle_level(1),
                            KeyCode::F3 => self.toggle_level(2),
                            KeyCode::F4 => self.toggle_level(3),
                            KeyCode::F5 => self.toggle_level(4),
                            KeyCode::F6 => {
                                self.debug_shading = !self.debug_shading;
                                if let Some(renderer) = &mut self.renderer {
                                    renderer.terrain.set_debug_shading(self.debug_shading);
                                }
                                log::info!("Debug shading: {}", self.debug_shading);
                            }
                            _ => {}
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.cursor_grabbed {
                self.input.process_mouse_motion(delta);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    logging::init();
    log::info!("geomip starting...");

    let args: Vec<String> = std::env::args().collect();
    let mut config = match parse_path_arg(&args, "--config", "-c") {
        Some(path) => match TerrainConfig::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                return;
            }
        },
        None => TerrainConfig::default(),
    };

    if let Some(path) = parse_path_arg(&args, "--heightmap", "-m") {
        config.heightmap = HeightmapSource::File { path };
    }
    if let Some(levels) = parse_levels_arg(&args) {
        config.level_count = levels;
    }
    if args.iter().any(|a| a == "--toroidal") {
        config.toroidal_updates = true;
    }
    log::info!("{} levels, toroidal updates {}", config.level_count, config.toroidal_updates);

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App::new(config);

    event_loop.run_app(&mut app).expect("Event loop error");
}

/// Parse a path argument given as `long <path>` or `short <path>`
fn parse_path_arg(args: &[String], long: &str, short: &str) -> Option<PathBuf> {
    for i in 0..args.len() {
        if args[i] == long || args[i] == short {
            if let Some(path) = args.get(i + 1) {
                return Some(PathBuf::from(path));
            }
        }
    }
    None
}

/// Parse --levels argument (number of clipmap levels)
fn parse_levels_arg(args: &[String]) -> Option<usize> {
    for i in 0..args.len() {
        if args[i] == "--levels" || args[i] == "-l" {
            if let Some(count) = args.get(i + 1) {
                return count.parse().ok();
            }
        }
    }
    None
}
