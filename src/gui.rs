use egui::Context;
use egui_wgpu::Renderer;
use egui_winit::State;
use msdf_renderer::AtlasStatus;
use wgpu::{Device, TextureFormat};
use winit::{event::WindowEvent, window::Window};

use crate::settings::{control_sections, ControlSection, SketchSettings, SketchVariant};

pub struct UiState {
    pub fps: f32,
    pub frame_time: f32,
    pub glyph_count: usize,
    pub atlas_status: AtlasStatus,
    pub timeline_running: bool,
    pub settings: SketchSettings,
}

impl UiState {
    pub fn new(settings: SketchSettings) -> Self {
        Self {
            fps: 0.0,
            frame_time: 0.0,
            glyph_count: 0,
            atlas_status: AtlasStatus::Loading,
            timeline_running: false,
            settings,
        }
    }
}

/// One-shot requests raised by the panel this frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct UiActions {
    pub play_reveal: bool,
}

pub struct Gui {
    context: Context,
    state: State,
    renderer: Renderer,
    sections: Vec<ControlSection>,
}

impl Gui {
    pub fn new(
        device: &Device,
        output_color_format: TextureFormat,
        window: &Window,
        variant: SketchVariant,
    ) -> Self {
        let context = Context::default();
        let id = context.viewport_id();

        let state = State::new(
            context.clone(),
            id,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(device.limits().max_texture_dimension_2d as usize),
        );

        let renderer = Renderer::new(
            device,
            output_color_format,
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                depth_stencil_format: None,
                dithering: false,
                predictable_texture_filtering: false,
            },
        );

        Self {
            context,
            state,
            renderer,
            sections: control_sections(variant),
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(window, event);
        response.consumed
    }

    pub fn render(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        view: &wgpu::TextureView,
        ui_state: &mut UiState,
    ) -> UiActions {
        let raw_input = self.state.take_egui_input(window);

        let mut actions = UiActions::default();
        let full_output = self.context.run(raw_input, |ctx| {
            actions = Self::ui(ctx, &self.sections, ui_state);
        });

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let clipped_primitives = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let size = window.inner_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        // egui-wgpu renders into a 'static pass; the encoder stays untouched until it drops.
        let mut render_pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        self.renderer
            .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        drop(render_pass);

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }

        actions
    }

    fn ui(ctx: &Context, sections: &[ControlSection], state: &mut UiState) -> UiActions {
        let mut actions = UiActions::default();

        // Diagnostics Panel (Top Left)
        egui::Window::new("Diagnostics")
            .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", state.fps));
                ui.label(format!("Frame Time: {:.2} ms", state.frame_time));
                ui.separator();
                ui.label(format!("Glyphs: {}", state.glyph_count));
                ui.label(format!("Atlas: {}", state.atlas_status));
            });

        // Controls (Top Right)
        egui::Window::new("Controls")
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                for (i, section) in sections.iter().enumerate() {
                    if i > 0 {
                        ui.separator();
                    }
                    ui.heading(section.title);

                    for binding in &section.sliders {
                        let mut value = binding.value(&state.settings);
                        let response = ui.add(
                            egui::Slider::new(&mut value, binding.range.clone())
                                .step_by(binding.step as f64)
                                .text(binding.label),
                        );
                        if response.changed() {
                            binding.apply(&mut state.settings, value);
                        }
                    }

                    if section.reveal_trigger {
                        let label = if state.timeline_running {
                            "Restart reveal"
                        } else {
                            "Play reveal"
                        };
                        if ui.button(label).clicked() {
                            actions.play_reveal = true;
                        }
                    }
                }

                ui.separator();
                ui.checkbox(&mut state.settings.show_plane, "Show Plane");
            });

        actions
    }
}
