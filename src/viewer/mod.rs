//! The window side of the player: draws the live skeleton buffers with egui and turns key
//! presses into playback commands.

mod camera;
mod target;

use std::sync::Arc;

use egui::{Align2, Color32, FontId, Painter, Rect, Stroke, pos2, vec2};
use glam::{Vec2, Vec3};
use tracing::{debug, info};
use winit::{event_loop::EventLoopProxy, keyboard::KeyCode};

use camera::{OrbitCamera, Projector};
use target::{TextOverlay, WindowTarget};

pub use target::ViewerEvent;

use crate::{
    engine::input::InputState,
    player::{
        config::PlaybackConfig,
        error::PlaybackError,
        geometry::{GeometryData, GeometrySync, SkeletonBuffers},
        motion::MotionSequence,
        playback::{PlaybackController, StepDirection},
        topology::{KEY_JOINTS, SkeletonTopology},
    },
};

pub const WINDOW_TITLE: &str = "T2M Motion Animation - 22 Joints";

pub const BACKGROUND_COLOR: wgpu::Color = wgpu::Color {
    r: 0.95,
    g: 0.95,
    b: 0.95,
    a: 1.0,
};

const GRID_HALF_SIZE: f32 = 2.0;
const GRID_SEGMENTS: usize = 20;
const GRID_COLOR: Color32 = Color32::from_rgba_premultiplied(46, 46, 46, 77);
const AXIS_LENGTH: f32 = 0.5;

const BONE_COLOR: Color32 = Color32::from_rgb(51, 102, 204);
const BONE_WIDTH: f32 = 3.0;
const JOINT_COLOR: Color32 = Color32::from_rgb(230, 38, 38);
const JOINT_RADIUS: f32 = 5.0;
const LABEL_COLOR: Color32 = Color32::from_gray(40);

const TEXT_MARGIN: f32 = 10.0;
const TEXT_COLOR: Color32 = Color32::BLACK;

/// Which joints get a name label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JointLabels {
    /// Only the key joints, see [`KEY_JOINTS`].
    #[default]
    Key,
    All,
}

/// What a key press asks the player to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    TogglePlayback,
    Step(StepDirection),
    Reset,
    Quit,
}

impl Command {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        Some(match key {
            KeyCode::Space => Self::TogglePlayback,
            KeyCode::ArrowLeft => Self::Step(StepDirection::Backward),
            KeyCode::ArrowRight => Self::Step(StepDirection::Forward),
            KeyCode::KeyR => Self::Reset,
            KeyCode::KeyQ => Self::Quit,
            _ => return None,
        })
    }
}

pub struct SkeletonViewer {
    controller: PlaybackController<WindowTarget>,
    buffers: Arc<SkeletonBuffers>,
    overlay: Arc<TextOverlay>,
    labels: JointLabels,
    camera: OrbitCamera,
}

impl SkeletonViewer {
    pub fn new(
        motion: Arc<MotionSequence>,
        config: PlaybackConfig,
        labels: JointLabels,
        proxy: EventLoopProxy<ViewerEvent>,
    ) -> Result<Self, PlaybackError> {
        let overlay = Arc::new(TextOverlay::default());
        let buffers = SkeletonBuffers::new(SkeletonTopology::t2m());

        let target = WindowTarget::new(proxy, Arc::clone(&overlay));
        let sync = GeometrySync::new(target, Arc::clone(&buffers))?;
        let controller = PlaybackController::new(motion, sync, config)?;

        info!(
            "Viewer ready: {} frames at {} fps, {} bones",
            controller.motion().frame_count(),
            config.frame_rate,
            buffers.topology().bones().len()
        );

        Ok(Self {
            controller,
            buffers,
            overlay,
            labels,
            camera: OrbitCamera::looking_at(Vec3::new(3.0, 2.0, 3.0), Vec3::new(0.0, 1.0, 0.0)),
        })
    }

    pub fn execute(&mut self, command: Command) -> Result<(), PlaybackError> {
        let result = match command {
            Command::TogglePlayback => self.controller.toggle(),
            Command::Step(direction) => self.controller.step(direction),
            Command::Reset => self.controller.reset(),
            Command::Quit => self.controller.quit(),
        };

        let state = self.controller.state();
        debug!(
            "{command:?}: frame {}, playing: {}, {} fps, buffer revision {}",
            state.current_frame,
            state.is_playing,
            state.frame_rate,
            self.buffers.revision()
        );

        result
    }

    /// Report a playback loop that ended by itself.
    pub fn poll(&mut self) -> Result<(), PlaybackError> {
        self.controller.poll()
    }

    pub fn quit(&mut self) -> Result<(), PlaybackError> {
        self.controller.quit()
    }

    /// Returns `true` if the camera moved.
    pub fn on_input(&mut self, input: &InputState) -> bool {
        self.camera.on_input(input)
    }

    pub fn paint(&self, ctx: &egui::Context) {
        // Copy the status out under the buffer lock, so it matches the joints.
        let (data, status) = self.buffers.read(|data| {
            let mut status = vec![];
            self.overlay.for_each(|text| status.push(text.to_owned()));
            (*data, status)
        });

        paint_scene(
            &ctx.layer_painter(egui::LayerId::background()),
            ctx.screen_rect(),
            &self.camera,
            &Scene {
                data: &data,
                topology: self.buffers.topology(),
                labels: self.labels,
                status: &status,
                prompts: &self.controller.motion().metadata().texts,
            },
        );
    }
}

/// Everything drawn in one frame besides the camera.
struct Scene<'a> {
    data: &'a GeometryData,
    topology: &'a SkeletonTopology,
    labels: JointLabels,
    status: &'a [String],
    prompts: &'a [String],
}

fn paint_scene(painter: &Painter, rect: Rect, camera: &OrbitCamera, scene: &Scene) {
    let projector = Projector::new(
        camera,
        Vec2::new(rect.left(), rect.top()),
        Vec2::new(rect.width(), rect.height()),
    );
    let project = |p: Vec3| projector.project(p).map(|p| pos2(p.x, p.y));
    let line = |a: Vec3, b: Vec3, stroke: Stroke| {
        if let (Some(a), Some(b)) = (project(a), project(b)) {
            painter.line_segment([a, b], stroke);
        }
    };

    // Ground grid on the XZ plane.
    let grid_stroke = Stroke::new(1.0, GRID_COLOR);
    let cell = GRID_HALF_SIZE * 2.0 / GRID_SEGMENTS as f32;
    for i in 0..=GRID_SEGMENTS {
        let t = -GRID_HALF_SIZE + i as f32 * cell;
        line(
            Vec3::new(t, 0.0, -GRID_HALF_SIZE),
            Vec3::new(t, 0.0, GRID_HALF_SIZE),
            grid_stroke,
        );
        line(
            Vec3::new(-GRID_HALF_SIZE, 0.0, t),
            Vec3::new(GRID_HALF_SIZE, 0.0, t),
            grid_stroke,
        );
    }

    for (axis, color) in [
        (Vec3::X, Color32::RED),
        (Vec3::Y, Color32::GREEN),
        (Vec3::Z, Color32::BLUE),
    ] {
        line(Vec3::ZERO, axis * AXIS_LENGTH, Stroke::new(2.0, color));
    }

    let bone_stroke = Stroke::new(BONE_WIDTH, BONE_COLOR);
    for bone in scene.topology.bones() {
        line(
            scene.data.joints[bone.start],
            scene.data.joints[bone.end],
            bone_stroke,
        );
    }

    for joint in scene.data.joints.iter().filter_map(|&p| project(p)) {
        painter.circle_filled(joint, JOINT_RADIUS, JOINT_COLOR);
    }

    let label = |index: usize, position: Vec3| {
        if let (Some(at), Some(name)) = (project(position), scene.topology.joint_name(index)) {
            painter.text(
                at + vec2(JOINT_RADIUS + 2.0, -JOINT_RADIUS),
                Align2::LEFT_BOTTOM,
                name,
                FontId::proportional(12.0),
                LABEL_COLOR,
            );
        }
    };
    match scene.labels {
        JointLabels::Key => KEY_JOINTS
            .iter()
            .zip(scene.data.key_joints.iter())
            .for_each(|(&index, &position)| label(index, position)),
        JointLabels::All => scene
            .data
            .joints
            .iter()
            .enumerate()
            .for_each(|(index, &position)| label(index, position)),
    }

    // Status lines stack up from the lower left corner.
    let mut y = rect.bottom() - TEXT_MARGIN;
    for text in scene.status {
        let drawn = painter.text(
            pos2(rect.left() + TEXT_MARGIN, y),
            Align2::LEFT_BOTTOM,
            text,
            FontId::monospace(14.0),
            TEXT_COLOR,
        );
        y = drawn.top() - 2.0;
    }

    let mut y = rect.top() + TEXT_MARGIN;
    for prompt in scene.prompts {
        let drawn = painter.text(
            pos2(rect.left() + TEXT_MARGIN, y),
            Align2::LEFT_TOP,
            prompt,
            FontId::proportional(16.0),
            TEXT_COLOR,
        );
        y = drawn.bottom() + 2.0;
    }
}
