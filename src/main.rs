//! MSDF Text Sketch
//!
//! Lays out a string with a BMFont/MSDF font, renders it with the SDF text shader and animates
//! its reveal bands.

mod config;
mod gui;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use clap::Parser;
use config::SketchConfig;
use glam::Vec3;
use gui::{Gui, UiState};
use msdf_font::FontDescriptor;
use msdf_layout::{build_geometry, layout, GeometryBuffer, GeometryOptions, TextLayoutRequest};
use msdf_renderer::{
    create_depth_texture, plane_geometry, AtlasLoader, Camera, MeshTransform, PlaneRenderer,
    TextMesh, TextPipelineOptions, TextRenderer, DEPTH_FORMAT,
};
use sdf_shading::{mocha, Color, FrameClock, FrameContext, RevealTimeline};
use settings::{SketchSettings, SketchVariant};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

#[derive(Parser, Debug)]
#[command(name = "msdf-sketch", about = "MSDF text rendering sketch")]
struct Args {
    /// Config file (defaults to ./sketch.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text to render, overrides the config
    #[arg(short, long)]
    text: Option<String>,

    /// Sketch variant, overrides the config
    #[arg(long, value_enum)]
    variant: Option<SketchVariant>,

    /// Use the small-text shader path (fixed smoothstep instead of fwidth)
    #[arg(long)]
    small: bool,
}

/// Everything decided before the window exists.
struct Scene {
    config: SketchConfig,
    geometry: GeometryBuffer,
}

impl Scene {
    fn build(config: SketchConfig) -> anyhow::Result<Self> {
        let font = FontDescriptor::load(&config.text.font)
            .with_context(|| format!("loading font {}", config.text.font.display()))?;

        let request = TextLayoutRequest::new(&config.text.content, &font)
            .with_options(config.text.layout_options());
        let text_layout = layout(&request)
            .with_context(|| format!("laying out {:?}", config.text.content))?;

        let geometry = build_geometry(
            &text_layout,
            GeometryOptions {
                flip_v: config.text.flip_v,
            },
        );

        log::info!(
            "✓ Laid out {:?}: {} glyphs, {} lines, {:.1}x{:.1}",
            config.text.content,
            text_layout.glyph_count(),
            text_layout.line_count(),
            text_layout.width,
            text_layout.height
        );

        Ok(Self { config, geometry })
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,

    camera: Camera,
    text_renderer: TextRenderer,
    plane_renderer: PlaneRenderer,

    // The text mesh only exists once the atlas has decoded; on failure it never does.
    atlas_loader: AtlasLoader,
    text_mesh: Option<TextMesh>,
    geometry: GeometryBuffer,

    clock: FrameClock,
    timeline: RevealTimeline,

    gui: Gui,
    ui_state: UiState,

    last_frame_time: Instant,
}

impl GpuState {
    async fn new(window: Arc<Window>, scene: Scene) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_texture(&device, &config);

        let Scene {
            config: sketch,
            geometry,
        } = scene;

        let mut text_renderer = TextRenderer::new(
            &device,
            surface_format,
            DEPTH_FORMAT,
            TextPipelineOptions {
                small_text: sketch.text.small,
            },
        )?;
        text_renderer.transform = MeshTransform {
            scale: Vec3::from_array(sketch.mesh.scale),
            translation: Vec3::from_array(sketch.mesh.offset),
        };

        let plane = plane_geometry(
            sketch.plane.size[0],
            sketch.plane.size[1],
            sketch.plane.segments[0],
            sketch.plane.segments[1],
        );
        let plane_renderer = PlaneRenderer::new(&device, surface_format, DEPTH_FORMAT, &plane)?;

        let atlas_loader = AtlasLoader::spawn(sketch.text.atlas.clone());

        let mut settings = SketchSettings::for_variant(sketch.variant);
        settings.show_plane = sketch.plane.visible;

        let mut timeline = sketch.animation.timeline();
        if sketch.variant.has_reveal_timeline() && sketch.animation.autoplay {
            timeline.start();
        }

        let gui = Gui::new(&device, surface_format, &window, sketch.variant);
        let mut ui_state = UiState::new(settings);
        ui_state.glyph_count = geometry.glyph_count();

        log::info!("✓ Scene ready ({:?} variant)", sketch.variant);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            camera: Camera::new(size.width, size.height),
            text_renderer,
            plane_renderer,
            atlas_loader,
            text_mesh: None,
            geometry,
            clock: FrameClock::new(sketch.animation.time_step),
            timeline,
            gui,
            ui_state,
            last_frame_time: Instant::now(),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_texture(&self.device, &self.config);
            self.camera.resize(new_size.width, new_size.height);
        }
    }

    /// Pick up the atlas once the loader thread finishes.
    fn poll_atlas(&mut self) {
        let poll = self.atlas_loader.poll();
        if let Some(atlas) = self
            .ui_state
            .atlas_status
            .update(poll, self.atlas_loader.path())
        {
            self.text_mesh = Some(self.text_renderer.create_mesh(
                &self.device,
                &self.queue,
                &self.geometry,
                &atlas,
            ));
        }
    }

    /// Advance clock and timeline, then snapshot this frame's uniforms.
    fn begin_frame(&mut self, dt: f32) -> FrameContext {
        self.clock.tick();

        self.timeline.advance(dt);
        if let Some(progress) = self.timeline.progress() {
            self.ui_state.settings.progress = progress;
            if self.timeline.is_finished() {
                self.timeline.stop();
            }
        }
        self.ui_state.timeline_running = self.timeline.is_running();

        FrameContext::new(&self.clock, self.ui_state.settings.to_uniforms())
    }

    fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        self.ui_state.frame_time = dt * 1000.0;
        self.ui_state.fps = if dt > 0.0 { 1.0 / dt } else { 0.0 };

        self.poll_atlas();
        let frame = self.begin_frame(dt);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let show_plane = self.ui_state.settings.show_plane;
        self.text_renderer.prepare(&self.queue, &self.camera, &frame);
        if show_plane {
            self.plane_renderer.prepare(
                &self.queue,
                &self.camera,
                self.ui_state.settings.plane_uniforms(frame.time),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(mocha::BASE)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if show_plane {
                self.plane_renderer.draw(&mut render_pass);
            }
            if let Some(mesh) = &self.text_mesh {
                self.text_renderer.draw(&mut render_pass, mesh);
            }
        }

        let actions = self.gui.render(
            &self.device,
            &self.queue,
            &mut encoder,
            window,
            &view,
            &mut self.ui_state,
        );
        if actions.play_reveal {
            self.timeline.start();
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

struct App {
    scene: Option<Scene>,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(scene) = self.scene.take() else {
            return;
        };

        let window_attributes = Window::default_attributes()
            .with_title(scene.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                scene.config.window.width,
                scene.config.window.height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match pollster::block_on(GpuState::new(window, scene)) {
            Ok(gpu_state) => self.gpu_state = Some(gpu_state),
            Err(e) => {
                log::error!("Failed to initialise renderer: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Handle GUI events
        if let (Some(gpu_state), Some(window)) = (&mut self.gpu_state, &self.window) {
            if gpu_state.gui.handle_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Space),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    if gpu_state.ui_state.settings.variant.has_reveal_timeline() {
                        gpu_state.timeline.start();
                    }
                }
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Right {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some(last_pos) = self.last_mouse_pos {
                        let delta_x = (position.x - last_pos.0) as f32;
                        let delta_y = (position.y - last_pos.1) as f32;

                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state.camera.rotate(-delta_x * 0.005, delta_y * 0.005);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_x, y) => y * 10.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };

                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state
                        .camera
                        .zoom(-scroll * gpu_state.camera.distance / 100.0);
                }
            }

            WindowEvent::RedrawRequested => {
                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    match gpu_state.render(window) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost) => gpu_state.resize(window.inner_size()),
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => log::error!("Render error: {e:?}"),
                    }
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn clear_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: color.a as f64,
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = SketchConfig::load(args.config.as_deref())?;
    if let Some(text) = args.text {
        config.text.content = text;
    }
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    config.text.small |= args.small;
    config.validate()?;

    log::info!("Starting MSDF text sketch...");

    // Font and layout errors are fatal; the atlas is loaded later and is not.
    let scene = Scene::build(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        scene: Some(scene),
        window: None,
        gpu_state: None,
        mouse_pressed: false,
        last_mouse_pos: None,
    };

    event_loop.run_app(&mut app)?;
    Ok(())
}
