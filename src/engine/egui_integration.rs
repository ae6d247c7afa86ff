use renderer::{Frame, Renderer};
use winit::{event::WindowEvent, event_loop::ActiveEventLoop, window::Window};

/// One run of the ui, tessellated and ready for the GPU.
struct PreparedUi {
    primitives: Vec<egui::ClippedPrimitive>,
    textures: egui::TexturesDelta,
    screen: egui_wgpu::ScreenDescriptor,
    platform_output: egui::PlatformOutput,
}

fn prepare(
    ctx: &egui::Context,
    input: egui::RawInput,
    size_in_pixels: [u32; 2],
    run_ui: impl FnMut(&egui::Context),
) -> PreparedUi {
    let egui::FullOutput {
        platform_output,
        textures_delta,
        shapes,
        pixels_per_point,
        viewport_output: _,
    } = ctx.run(input, run_ui);

    PreparedUi {
        primitives: ctx.tessellate(shapes, pixels_per_point),
        textures: textures_delta,
        screen: egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point,
        },
        platform_output,
    }
}

/// Feeds window events to egui and paints its output on top of a renderer frame.
pub struct EguiIntegration {
    state: egui_winit::State,
    painter: egui_wgpu::Renderer,
}

impl EguiIntegration {
    pub fn new(event_loop: &ActiveEventLoop, renderer: &Renderer) -> Self {
        let state = egui_winit::State::new(
            egui::Context::default(),
            egui::ViewportId::default(),
            event_loop,
            None,
            None,
            None,
        );

        // No depth buffer and no multisampling, egui is the only thing drawn.
        let painter =
            egui_wgpu::Renderer::new(&renderer.device, renderer.surface.format(), None, 1, false);

        Self { state, painter }
    }

    pub fn window_event(
        &mut self,
        window: &Window,
        event: &WindowEvent,
    ) -> egui_winit::EventResponse {
        self.state.on_window_event(window, event)
    }

    /// Run `run_ui` and paint its output over whatever is already in `frame`.
    pub fn render(
        &mut self,
        window: &Window,
        renderer: &Renderer,
        frame: &mut Frame,
        run_ui: impl FnMut(&egui::Context),
    ) {
        let input = self.state.take_egui_input(window);
        let ctx = self.state.egui_ctx().clone();
        let ui = prepare(&ctx, input, renderer.surface.size().to_array(), run_ui);

        self.state.handle_platform_output(window, ui.platform_output);

        for (id, delta) in &ui.textures.set {
            self.painter.update_texture(&renderer.device, &renderer.queue, *id, delta);
        }
        self.painter.update_buffers(
            &renderer.device,
            &renderer.queue,
            &mut frame.encoder,
            &ui.primitives,
            &ui.screen,
        );

        {
            let mut pass = frame
                .encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("ui"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
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
            self.painter.render(&mut pass, &ui.primitives, &ui.screen);
        }

        // Textures freed this frame may still be used by the pass above.
        for id in &ui.textures.free {
            self.painter.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_tessellates_painted_shapes() {
        let ctx = egui::Context::default();

        let ui = prepare(&ctx, egui::RawInput::default(), [640, 480], |ctx| {
            ctx.layer_painter(egui::LayerId::background()).line_segment(
                [egui::pos2(10.0, 10.0), egui::pos2(100.0, 50.0)],
                egui::Stroke::new(2.0, egui::Color32::BLACK),
            );
        });

        assert!(!ui.primitives.is_empty());
        assert_eq!(ui.screen.size_in_pixels, [640, 480]);
        assert_eq!(ui.screen.pixels_per_point, 1.0);
        // The font atlas is uploaded on the first run.
        assert!(!ui.textures.set.is_empty());
    }
}
