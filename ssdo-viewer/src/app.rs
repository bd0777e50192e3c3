use std::sync::Arc;

use anyhow::{anyhow, Context};
use glam::Mat4;
use ssdo_gpu_shared::mesh_format::load_off;
use ssdo_wgpu::{
    Camera, CompositeMode, EnvironmentMap, GpuBackend, PointLight, RenderContext, RenderSettings,
    Scene, SsdoRenderer,
};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::cli::Cli;
use crate::input::{self, DragMode, InputState, KeyAction};

/// GPU state that exists once the window is up.
struct Viewer {
    window: Arc<Window>,
    backend: GpuBackend,
    ctx: RenderContext,
    renderer: SsdoRenderer,
}

impl Viewer {
    fn new(window: Arc<Window>, cli: &Cli, settings: &RenderSettings) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let backend = GpuBackend::new(window.clone(), size.width, size.height)
            .context("failed to initialise the GPU backend")?;
        let screen_format = backend
            .surface_format()
            .ok_or_else(|| anyhow!("window surface has no usable format"))?;

        let mut mesh = load_off(&cli.mesh)
            .with_context(|| format!("failed to load mesh {}", cli.mesh.display()))?;
        mesh.standardize();

        let (width, height) = (backend.width, backend.height);
        let scene = Scene::new(PointLight::from(settings.light));
        let camera = Camera::framing(scene.scale, width as f32 / height as f32);
        let mut ctx = RenderContext::new(
            &backend.device,
            backend.format_support(),
            width,
            height,
            camera,
            scene,
        );
        ctx.composite = CompositeMode::from_digit(cli.mode).unwrap_or_default();

        let environment = EnvironmentMap::load_or_procedural(&backend.device, &backend.queue, &cli.skybox);
        let renderer = SsdoRenderer::new(
            &backend.device,
            &backend.queue,
            &ctx,
            screen_format,
            environment,
            settings.clone(),
        )
        .context("failed to build the render pipeline")?;
        renderer.upload_object(&backend.device, &mut ctx.scene, &mesh, Mat4::IDENTITY, settings.albedo);

        Ok(Self {
            window,
            backend,
            ctx,
            renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if !self.backend.resize(width, height) {
            return;
        }
        if self.ctx.resize(&self.backend.device, width, height) {
            self.renderer.on_targets_resized(&self.backend.device, &self.ctx.targets);
        }
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let Some(frame) = self.backend.acquire_frame()? else {
            return Ok(());
        };
        self.renderer
            .render(&self.backend.device, &self.backend.queue, &self.ctx, &frame.texture);
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }
}

pub struct App {
    cli: Cli,
    settings: RenderSettings,
    viewer: Option<Viewer>,
    input: InputState,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(cli: Cli, settings: RenderSettings) -> Self {
        Self {
            cli,
            settings,
            viewer: None,
            input: InputState::new(),
            error: None,
        }
    }

    /// Fatal error that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        // Releases GPU resources before the window goes away.
        self.viewer = None;
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let Some(action) = input::key_action(event.physical_key) else {
            return;
        };
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        match action {
            KeyAction::Quit => event_loop.exit(),
            KeyAction::Help => println!("{}", input::HELP),
            KeyAction::SelectMode(mode) => {
                viewer.ctx.composite = mode;
                log::info!("Composite mode {mode}");
            }
            KeyAction::ToggleWireframe => {
                if viewer.renderer.supports_wireframe() {
                    viewer.ctx.wireframe = !viewer.ctx.wireframe;
                } else {
                    log::warn!("Wireframe needs line polygon mode, which this adapter lacks");
                }
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.settings.window_title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.window_width,
                self.settings.window_height,
            ));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow!(e).context("failed to create window")),
        };

        match Viewer::new(window, &self.cli, &self.settings) {
            Ok(viewer) => {
                println!("{}", input::HELP);
                self.viewer = Some(viewer);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.resize(physical_size.width, physical_size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event_loop, event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let (Some(viewer), Some(mode)) = (self.viewer.as_ref(), DragMode::from_button(button)) else {
                    return;
                };
                match state {
                    ElementState::Pressed => self.input.begin_drag(mode, &viewer.ctx.camera),
                    ElementState::Released => self.input.end_drag(mode),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor_moved(position.x, position.y);
                if let Some(viewer) = self.viewer.as_mut() {
                    let (w, h) = (viewer.backend.width, viewer.backend.height);
                    let scale = viewer.ctx.scene.scale;
                    self.input.apply(&mut viewer.ctx.camera, w, h, scale);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(viewer) = self.viewer.as_mut() else {
                    return;
                };
                if let Err(e) = viewer.redraw() {
                    return self.fail(event_loop, e.context("failed to render frame"));
                }
                viewer.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }
}
