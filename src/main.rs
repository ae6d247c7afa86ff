use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use engine::{egui_integration::EguiIntegration, input::InputState};
use player::{
    axis::{self, AxisBounds},
    config::{Dataset, PlaybackConfig},
    error::{MotionError, PlaybackError},
    loader,
    motion::{MotionMetadata, MotionSequence},
};
use renderer::Renderer;
use tracing::{error, info, warn};
use viewer::{Command, JointLabels, SkeletonViewer, ViewerEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};

mod engine;
mod player;
mod viewer;

/// Up axis convention of the input data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum SourceUp {
    Y,
    Z,
}

#[derive(clap::Parser)]
#[command(version, about = "Plays back generated skeletal motion as an animated skeleton")]
struct Opts {
    /// Path to the motion (a `.npy` array or a `.json` results file).
    path: PathBuf,

    /// Dataset the motion was generated for. Selects the default frame rate.
    #[arg(long, value_enum, default_value_t = Dataset::Babel)]
    dataset: Dataset,

    /// Frames per second, overrides the dataset default.
    #[arg(long)]
    fps: Option<f32>,

    /// Up axis of the input data. Z-up data is converted to Y-up when loading.
    #[arg(long, value_enum, default_value_t = SourceUp::Y)]
    source_up: SourceUp,

    /// Text prompt to show with the motion, replaces prompts stored in the file. Repeatable.
    #[arg(long = "text")]
    texts: Vec<String>,

    /// Frame shown when the viewer opens.
    #[arg(long, default_value_t = 0)]
    start_frame: usize,

    /// Label all 22 joints instead of the key joints only.
    #[arg(long)]
    all_labels: bool,
}

impl Opts {
    fn playback_config(&self) -> PlaybackConfig {
        let mut config = PlaybackConfig::for_dataset(self.dataset);
        if let Some(fps) = self.fps {
            config.frame_rate = fps;
        }
        config.start_frame = self.start_frame;
        config
    }

    fn joint_labels(&self) -> JointLabels {
        if self.all_labels {
            JointLabels::All
        } else {
            JointLabels::Key
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("Could not load motion: {0}")]
    Motion(#[from] MotionError),

    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Could not create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Could not create renderer: {0}")]
    Renderer(#[from] renderer::RendererError),

    #[error("Could not start playback: {0}")]
    Playback(#[from] PlaybackError),
}

/// Load the motion and bring it into the Y-up convention.
fn load_motion(opts: &Opts) -> Result<MotionSequence, MotionError> {
    let mut motion = loader::load_motion(&opts.path)?;

    let log_bounds = |label: &str, bounds: Option<AxisBounds>| {
        if let Some(bounds) = bounds {
            info!(
                "{label} bounds: {bounds}, dominant axis: {}",
                bounds.dominant_axis()
            );
        }
    };

    log_bounds("Motion", motion.bounds());

    if opts.source_up == SourceUp::Z {
        motion = motion.map_points(axis::z_up_to_y_up);
        log_bounds("Converted", motion.bounds());
    }

    if !opts.texts.is_empty() {
        let lengths = motion.metadata().lengths.clone();
        motion = motion.with_metadata(MotionMetadata {
            texts: opts.texts.clone(),
            lengths,
        });
    }

    let metadata = motion.metadata();
    for text in &metadata.texts {
        info!("Prompt: {text}");
    }
    if !metadata.lengths.is_empty() {
        info!("Segment lengths: {:?}", metadata.lengths);
    }

    Ok(motion)
}

/// What is needed to open the viewer once the event loop is running.
struct Launch {
    motion: Arc<MotionSequence>,
    config: PlaybackConfig,
    labels: JointLabels,
    proxy: EventLoopProxy<ViewerEvent>,
}

enum App {
    Uninitialized(Launch),
    Initialized {
        window: Arc<winit::window::Window>,

        /// The renderer.
        renderer: Renderer,

        egui_integration: EguiIntegration,

        input: InputState,

        viewer: SkeletonViewer,
    },
    /// Startup failed; the event loop is shutting down.
    Failed,
}

impl App {
    fn initialize(launch: &Launch, event_loop: &ActiveEventLoop) -> Result<Self, AppError> {
        let attributes = winit::window::WindowAttributes::default()
            .with_title(viewer::WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let renderer = Renderer::new(Arc::clone(&window))?;

        let egui_integration = EguiIntegration::new(event_loop, &renderer);

        let viewer = SkeletonViewer::new(
            Arc::clone(&launch.motion),
            launch.config,
            launch.labels,
            launch.proxy.clone(),
        )?;

        Ok(App::Initialized {
            window,
            renderer,
            egui_integration,
            input: InputState::default(),
            viewer,
        })
    }
}

impl winit::application::ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        match self {
            App::Uninitialized(launch) => {
                event_loop.set_control_flow(winit::event_loop::ControlFlow::Wait);

                match App::initialize(launch, event_loop) {
                    Ok(app) => {
                        info!("Application initialized!");
                        *self = app;
                    }
                    Err(err) => {
                        error!("{err}");
                        *self = App::Failed;
                        event_loop.exit();
                    }
                }
            }

            App::Initialized { .. } => {
                warn!("Application already initialized!");
            }

            App::Failed => {}
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        use winit::event::WindowEvent;

        let App::Initialized {
            window,
            renderer,
            egui_integration,
            input,
            viewer,
        } = self
        else {
            return;
        };

        if window_id != window.id() {
            return;
        }

        let egui_winit::EventResponse { consumed, repaint } =
            egui_integration.window_event(window.as_ref(), &event);
        if repaint {
            window.request_redraw();
        }
        if consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Err(err) = viewer.quit() {
                    warn!("{err}");
                }
                event_loop.exit();
            }

            WindowEvent::Resized(winit::dpi::PhysicalSize { width, height }) => {
                renderer.resize(glam::UVec2::new(width, height));
                window.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let winit::keyboard::PhysicalKey::Code(key) = event.physical_key {
                    if !event.repeat && event.state == winit::event::ElementState::Pressed {
                        if let Some(command) = Command::from_key(key) {
                            if let Err(err) = viewer.execute(command) {
                                error!("{command:?} failed: {err}");
                            }
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { .. }
            | WindowEvent::CursorLeft { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::Focused(_) => {
                input.handle_window_event(&event);
                if viewer.on_input(input) {
                    window.request_redraw();
                }
                input.reset_deltas();
            }

            WindowEvent::RedrawRequested => {
                let mut frame = match renderer.begin_frame() {
                    Ok(frame) => frame,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = window.inner_size();
                        renderer.resize(glam::UVec2::new(size.width, size.height));
                        window.request_redraw();
                        return;
                    }
                    Err(err) => {
                        error!("Could not get the next frame: {err}");
                        return;
                    }
                };

                frame.clear(viewer::BACKGROUND_COLOR);
                egui_integration.render(window, renderer, &mut frame, |ctx| viewer.paint(ctx));
                renderer.present(frame);
            }

            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        let App::Initialized { window, viewer, .. } = self else {
            return;
        };

        match event {
            ViewerEvent::Redraw => {
                if let Err(err) = viewer.poll() {
                    error!("{err}");
                }
                window.request_redraw();
            }
            ViewerEvent::Exit => event_loop.exit(),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let App::Initialized { viewer, .. } = self {
            if let Err(err) = viewer.quit() {
                warn!("{err}");
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt().init();

    let opts = Opts::parse();

    if let Err(err) = run(opts) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(opts: Opts) -> Result<(), AppError> {
    let config = opts.playback_config();
    info!(
        "Playing {} at {} fps ({} dataset)",
        opts.path.display(),
        config.frame_rate,
        opts.dataset
    );

    let motion = Arc::new(load_motion(&opts)?);

    let event_loop = EventLoop::<ViewerEvent>::with_user_event().build()?;

    let mut app = App::Uninitialized(Launch {
        motion,
        config,
        labels: opts.joint_labels(),
        proxy: event_loop.create_proxy(),
    });
    event_loop.run_app(&mut app)?;

    Ok(())
}
