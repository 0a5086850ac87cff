//! Window and event loop.
//!
//! [`run`] opens the window, brings up the GPU and hands every frame to the
//! [`Scene`]. Egui sees each window event first so the panel can claim the
//! pointer and keyboard before the camera does.

use crate::config::Settings;
use crate::error::{AppError, GpuError};
use crate::gpu::{EguiIntegration, GpuState};
use crate::input::{Input, KeyCode};
use crate::panel;
use crate::scene::{Scene, SceneActions};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// Opens the window and blocks until it is closed.
pub fn run(settings: Settings) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    gpu: GpuState,
    egui: EguiIntegration,
    scene: Scene<GpuState>,
}

struct App {
    settings: Settings,
    running: Option<Running>,
    input: Input,
    fatal: Option<AppError>,
}

impl App {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            running: None,
            input: Input::new(),
            fatal: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running, AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.settings.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.window.width,
                self.settings.window.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let mut gpu = pollster::block_on(GpuState::new(window.clone()))?;
        let egui = EguiIntegration::new(gpu.device(), gpu.format(), &window);

        let mut scene = Scene::new(&mut gpu, &self.settings)?;
        let size = window.inner_size();
        scene.resize(size.width, size.height);

        Ok(Running {
            window,
            gpu,
            egui,
            scene,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{}", error);
        self.fatal = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => {
                let size = running.window.inner_size();
                self.input.set_window_size(size.width, size.height);
                self.running = Some(running);
            }
            Err(error) => self.fail(event_loop, error),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        running.egui.on_window_event(&running.window, &event);
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                running.gpu.resize(physical_size);
                running.scene.resize(physical_size.width, physical_size.height);
            }
            WindowEvent::RedrawRequested => {
                if let Err(error) = frame(running, &mut self.input, event_loop) {
                    self.fail(event_loop, error.into());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

/// Escape closes the window unless a panel text field has the keyboard.
fn wants_quit(input: &Input) -> bool {
    input.key_pressed(KeyCode::Escape)
}

fn frame(running: &mut Running, input: &mut Input, event_loop: &ActiveEventLoop) -> Result<(), GpuError> {
    let Running {
        window,
        gpu,
        egui,
        scene,
    } = running;

    let mut actions = SceneActions::default();
    let egui_frame = egui.run(window, |ctx| actions = panel::show(ctx, scene, &*gpu));
    input.set_gui_capture(egui_frame.wants_pointer, egui_frame.wants_keyboard);
    if wants_quit(input) {
        event_loop.exit();
    }

    scene.apply(gpu, actions)?;
    scene.update(gpu, input)?;

    match gpu.render(scene.camera.background, egui, &egui_frame) {
        Ok(()) => {}
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            gpu.resize(window.inner_size());
        }
        Err(wgpu::SurfaceError::OutOfMemory) => {
            log::error!("Surface out of memory");
            event_loop.exit();
        }
        Err(e) => log::warn!("Render error: {:?}", e),
    }

    input.begin_frame();
    Ok(())
}
