//! Egui on top of the particle view.
//!
//! One [`EguiIntegration::run`] per frame builds the panel and tessellates it;
//! [`EguiIntegration::paint`] then draws the result over the finished scene in
//! its own pass.

use std::sync::Arc;
use winit::window::Window;

pub struct EguiIntegration {
    pub ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// A tessellated panel frame plus what it claimed from the user.
pub struct EguiFrame {
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    pixels_per_point: f32,
    /// The pointer is over or dragging a panel.
    pub wants_pointer: bool,
    /// A text field has keyboard focus.
    pub wants_keyboard: bool,
}

impl EguiIntegration {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, window: &Arc<Window>) -> Self {
        let ctx = egui::Context::default();
        ctx.set_visuals(egui::Visuals {
            window_shadow: egui::Shadow::NONE,
            popup_shadow: egui::Shadow::NONE,
            ..egui::Visuals::dark()
        });

        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        // No depth attachment, single sample, no dithering
        let renderer = egui_wgpu::Renderer::new(device, output_format, None, 1, false);

        Self { ctx, state, renderer }
    }

    /// Hands a window event to egui. Returns true when egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Builds this frame's UI with `build_ui` and tessellates it.
    pub fn run(&mut self, window: &Window, build_ui: impl FnMut(&egui::Context)) -> EguiFrame {
        let raw_input = self.state.take_egui_input(window);
        let output = self.ctx.run(raw_input, build_ui);
        self.state.handle_platform_output(window, output.platform_output);

        EguiFrame {
            paint_jobs: self.ctx.tessellate(output.shapes, output.pixels_per_point),
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
            wants_pointer: self.ctx.wants_pointer_input() || self.ctx.is_pointer_over_area(),
            wants_keyboard: self.ctx.wants_keyboard_input(),
        }
    }

    /// Uploads `frame`'s textures and geometry, draws it over `target` and
    /// releases textures egui no longer needs.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        frame: &EguiFrame,
        size_in_pixels: [u32; 2],
    ) {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: frame.pixels_per_point,
        };

        for (id, delta) in &frame.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &frame.paint_jobs, &screen);

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &frame.paint_jobs, &screen);
        }

        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
