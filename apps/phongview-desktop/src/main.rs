use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use phongview_input::{Action, MouseCapture, MoveDirection, MovementState};
use phongview_render::{MeshSource, PostEffect, Scene, SceneConfig};
use phongview_render_wgpu::{FlyCamera, SceneRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

/// Longest frame step fed to movement and animation, in seconds.
const MAX_FRAME_DT: f32 = 0.1;
const BOOST_MULTIPLIER: f32 = 3.0;

#[derive(Parser, Debug)]
#[command(name = "phongview", about = "Phong lighting, fog and post-processing demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mesh file replacing the first file-based object's mesh
    #[arg(long)]
    mesh: Option<PathBuf>,

    /// Texture for the first file-based object
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Post-processing effect (passthrough or sepia)
    #[arg(long)]
    effect: Option<PostEffect>,
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut SceneConfig, cli: &Cli) {
    let model = config
        .objects
        .iter_mut()
        .find(|o| matches!(o.mesh, MeshSource::File { .. }));
    match model {
        Some(object) => {
            if let Some(path) = &cli.mesh {
                object.mesh = MeshSource::File { path: path.clone() };
            }
            if let Some(path) = &cli.texture {
                object.texture = Some(path.clone());
            }
        }
        None if cli.mesh.is_some() || cli.texture.is_some() => {
            tracing::warn!("scene has no file-based object; --mesh/--texture ignored");
        }
        None => {}
    }
    if let Some(effect) = cli.effect {
        config.post.effect = effect;
    }
}

/// Translate a physical key into an action.
fn map_key(key: KeyCode, pressed: bool, ctrl: bool) -> Action {
    let movement = |direction| Action::Move { direction, pressed };
    match key {
        KeyCode::KeyW => movement(MoveDirection::Forward),
        KeyCode::KeyS => movement(MoveDirection::Backward),
        KeyCode::KeyA => movement(MoveDirection::Left),
        KeyCode::KeyD => movement(MoveDirection::Right),
        KeyCode::Space => movement(MoveDirection::Up),
        KeyCode::ControlLeft | KeyCode::ControlRight => movement(MoveDirection::Down),
        _ if !pressed => Action::Noop,
        KeyCode::Escape => Action::ToggleMouseCapture,
        KeyCode::F1 => Action::ToggleOverlay,
        KeyCode::F2 => Action::CycleEffect,
        KeyCode::KeyQ if ctrl => Action::Quit,
        _ => Action::Noop,
    }
}

/// Application state.
struct AppState {
    scene: Scene,
    camera: FlyCamera,
    movement: MovementState,
    capture: MouseCapture,
    boost: bool,
    ctrl: bool,
    show_overlay: bool,
    last_frame: Instant,
    frame_dt: f32,
    /// Opaque and transparent draws in the last frame.
    draws: (usize, usize),
}

impl AppState {
    fn new(config: SceneConfig) -> Self {
        let camera = FlyCamera::from_settings(&config.camera);
        Self {
            scene: Scene::new(config),
            camera,
            movement: MovementState::new(),
            capture: MouseCapture::default(),
            boost: false,
            ctrl: false,
            show_overlay: false,
            last_frame: Instant::now(),
            frame_dt: 0.0,
            draws: (0, 0),
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(MAX_FRAME_DT);
        self.last_frame = now;
        self.frame_dt = dt;

        let step = if self.boost { dt * BOOST_MULTIPLIER } else { dt };
        self.camera.apply_movement(self.movement.local_axis(), step);
        self.scene.update(dt);
    }

    fn draw_ui(&mut self, ctx: &EguiContext, loaded: &[bool], sky: bool) {
        if !self.show_overlay {
            return;
        }

        egui::SidePanel::left("overlay")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("phongview");
                ui.separator();
                let fps = if self.frame_dt > 0.0 { 1.0 / self.frame_dt } else { 0.0 };
                ui.label(format!("Frame: {:.1} ms ({fps:.0} fps)", self.frame_dt * 1000.0));
                ui.label(format!(
                    "Draws: {} opaque, {} transparent",
                    self.draws.0, self.draws.1
                ));
                ui.label(if sky { "Skybox: loaded" } else { "Skybox: none" });
                ui.separator();

                ui.heading("Camera");
                let p = self.camera.position;
                ui.label(format!("Position: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                ui.label(format!(
                    "Yaw: {:.1}°  Pitch: {:.1}°",
                    self.camera.yaw.to_degrees(),
                    self.camera.pitch.to_degrees()
                ));
                ui.add(egui::Slider::new(&mut self.camera.speed, 0.5..=50.0).text("speed"));
                if ui.button("Reset camera").clicked() {
                    let settings = &self.scene.config.camera;
                    let aspect = self.camera.aspect;
                    self.camera
                        .reset(settings.fov_degrees, settings.near, settings.far, aspect);
                }
                ui.separator();

                ui.heading("Fog");
                let fog = &mut self.scene.config.fog;
                ui.add(egui::Slider::new(&mut fog.near, 0.0..=100.0).text("near"));
                ui.add(egui::Slider::new(&mut fog.far, 0.1..=200.0).text("far"));
                if fog.far <= fog.near {
                    fog.far = fog.near + 0.1;
                }
                ui.separator();

                ui.heading("Post effect");
                let effect = &mut self.scene.config.post.effect;
                egui::ComboBox::from_id_salt("post_effect")
                    .selected_text(effect.name())
                    .show_ui(ui, |ui| {
                        for candidate in PostEffect::ALL {
                            ui.selectable_value(effect, candidate, candidate.name());
                        }
                    });
                ui.separator();

                ui.heading("Objects");
                for (i, object) in self.scene.objects().iter().enumerate() {
                    let ok = loaded.get(i).copied().unwrap_or(false);
                    let marker = if ok { "" } else { " (not loaded)" };
                    ui.label(format!("{} [{:?}]{marker}", object.name, object.blend));
                }

                ui.separator();
                ui.small("WASD/Space/Ctrl: Move | Shift: Fast | Esc: Mouse | F1: Overlay | F2: Effect");
            });
    }
}

/// Window, device and everything that draws into the surface.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: SceneRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, state: &AppState) -> Result<Self> {
        let settings = &state.scene.config.window;
        let attrs = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(PhysicalSize::new(settings.width, settings.height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("phongview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = SceneRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            &state.scene,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend ({}x{}, {:?})",
            adapter.get_info().backend.to_str(),
            config.width,
            config.height,
            surface_format
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn set_mouse_captured(&self, captured: bool) {
        let grab = if captured {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            tracing::warn!("cursor grab unavailable: {e}");
        }
        self.window.set_cursor_visible(!captured);
    }

    fn frame(&mut self, state: &mut AppState, egui_ctx: &EguiContext) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let effect = state.scene.config.post.effect;
        if self.renderer.effect() != effect {
            self.renderer.set_effect(&self.queue, effect);
        }

        let plan = {
            let _span = tracing::debug_span!("frame_render").entered();
            self.renderer
                .render(&self.device, &self.queue, &view, &state.camera, &state.scene)
        };
        state.draws = (plan.opaque.len(), plan.transparent.len());

        let loaded = self.renderer.loaded_flags();
        let sky = self.renderer.has_skybox();
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx, &loaded, sky);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: SceneConfig) -> Self {
        Self {
            state: AppState::new(config),
            gpu: None,
            egui_ctx: EguiContext::default(),
            error: None,
        }
    }

    fn handle_action(&mut self, action: Action, event_loop: &ActiveEventLoop) {
        match action {
            Action::Move { .. } => self.state.movement.apply(&action),
            Action::Look { dx, dy } => {
                if let Some((dx, dy)) = self.state.capture.look_delta(dx, dy) {
                    self.state.camera.rotate(dx, dy);
                }
            }
            Action::ToggleMouseCapture => {
                let captured = self.state.capture.toggle();
                if let Some(gpu) = &self.gpu {
                    gpu.set_mouse_captured(captured);
                }
            }
            Action::ToggleOverlay => {
                self.state.show_overlay = !self.state.show_overlay;
            }
            Action::CycleEffect => {
                let post = &mut self.state.scene.config.post;
                post.effect = post.effect.next();
            }
            Action::Quit => event_loop.exit(),
            Action::Noop => {}
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.state) {
            Ok(gpu) => {
                self.state.camera.set_aspect(gpu.config.width, gpu.config.height);
                gpu.set_mouse_captured(self.state.capture.is_captured());
                self.state.last_frame = Instant::now();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                self.error = Some(e);
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
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    self.state
                        .camera
                        .set_aspect(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::Focused(false) => {
                self.state.movement.clear();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.state.boost = modifiers.state().shift_key();
                self.state.ctrl = modifiers.state().control_key();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let action = map_key(key, key_state == ElementState::Pressed, self.state.ctrl);
                if repeat && !matches!(action, Action::Move { .. }) {
                    return;
                }
                self.handle_action(action, event_loop);
            }
            WindowEvent::RedrawRequested => {
                self.state.update();
                if let Some(gpu) = &mut self.gpu {
                    gpu.frame(&mut self.state, &self.egui_ctx);
                    gpu.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            let action = Action::Look {
                dx: delta.0 as f32,
                dy: delta.1 as f32,
            };
            self.handle_action(action, event_loop);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("phongview-desktop starting");

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    apply_overrides(&mut config, &cli);
    config.validate().context("invalid scene after overrides")?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
