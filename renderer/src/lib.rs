//! A wrapper around `wgpu` primitives to render graphics to a window surface.

mod surface;

use std::sync::Arc;

use glam::UVec2;
use tracing::info;
use winit::window::Window;

pub use surface::*;

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Could not create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("No compatible graphics adapter found")]
    NoAdapter,

    #[error("The surface is not supported by the adapter")]
    UnsupportedSurface,

    #[error("Could not request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// The GPU device and the window surface it presents to.
pub struct Renderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: Surface,
}

/// Everything needed to record the commands of one frame.
pub struct Frame {
    pub encoder: wgpu::CommandEncoder,
    pub view: wgpu::TextureView,
    output: wgpu::SurfaceTexture,
}

impl Frame {
    /// Clear the whole frame to `color`.
    pub fn clear(&mut self, color: wgpu::Color) {
        let _render_pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, RendererError> {
        let winit::dpi::PhysicalSize { width, height } = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .ok_or(RendererError::NoAdapter)?;

        let info = adapter.get_info();
        info!("Using adapter: {} ({:?})", info.name, info.backend);

        let surface_caps = surface.get_capabilities(&adapter);

        // egui does its own gamma handling, so prefer a linear format.
        let format = surface_caps
            .formats
            .iter()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RendererError::UnsupportedSurface)?;

        let mut surface_config = surface
            .get_default_config(&adapter, width.max(1), height.max(1))
            .ok_or(RendererError::UnsupportedSurface)?;
        surface_config.format = format;
        surface_config.present_mode = wgpu::PresentMode::AutoVsync;

        let surface = Surface::new(surface, surface_config);

        let (device, queue) = pollster::block_on(
            adapter.request_device(&wgpu::DeviceDescriptor::default(), None),
        )?;

        surface.configure(&device);

        Ok(Self {
            device,
            queue,
            surface,
        })
    }

    pub fn resize(&mut self, size: UVec2) {
        self.surface.resize(&self.device, size);
    }

    pub fn begin_frame(&self) -> Result<Frame, wgpu::SurfaceError> {
        let output = self.surface.get_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("main command encoder"),
            });

        Ok(Frame {
            encoder,
            view,
            output,
        })
    }

    /// Submit the recorded commands and present the frame.
    pub fn present(&self, frame: Frame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.output.present();
    }
}
