use glam::{Mat4, Vec2, Vec3};

use crate::engine::input::{InputState, MouseButton};

/// A camera that orbits around a target point, with Y up.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,   // degrees
    pub pitch: f32, // degrees
    pub distance: f32,

    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,

    pub mouse_sensitivity: f32,
}

impl OrbitCamera {
    const MIN_DISTANCE: f32 = 0.1;

    /// A camera at `eye` looking at `target`.
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(Self::MIN_DISTANCE);

        Self {
            target,
            yaw: offset.x.atan2(offset.z).to_degrees(),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin().to_degrees(),
            distance,
            fov: 45.0,
            near: 0.01,
            far: 100.0,
            mouse_sensitivity: 0.4,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();

        self.target
            + self.distance * Vec3::new(pitch_cos * yaw_sin, pitch_sin, pitch_cos * yaw_cos)
    }

    pub fn view_projection(&self, aspect_ratio: f32) -> Mat4 {
        let projection =
            Mat4::perspective_rh(self.fov.to_radians(), aspect_ratio, self.near, self.far);
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        projection * view
    }

    /// Orbit with the left mouse button and zoom with the wheel. Returns `true` if the camera
    /// moved.
    pub fn on_input(&mut self, input: &InputState) -> bool {
        let mut changed = false;

        let delta = input.mouse_delta();
        if input.mouse_pressed(MouseButton::Left) && delta != Vec2::ZERO {
            let delta = delta * self.mouse_sensitivity;
            self.yaw -= delta.x;
            self.pitch = (self.pitch + delta.y).clamp(-89.0_f32, 89.0_f32);
            changed = true;
        }

        let wheel = input.wheel_delta();
        if wheel != 0.0 {
            self.distance -= wheel * self.distance / 10.0;
            self.distance = self.distance.clamp(Self::MIN_DISTANCE, self.far * 0.5);
            changed = true;
        }

        changed
    }
}

/// Maps world positions onto a screen rectangle.
pub struct Projector {
    view_projection: Mat4,
    origin: Vec2,
    size: Vec2,
}

impl Projector {
    pub fn new(camera: &OrbitCamera, origin: Vec2, size: Vec2) -> Self {
        Self {
            view_projection: camera.view_projection(size.x / size.y.max(1.0)),
            origin,
            size,
        }
    }

    /// Screen position of `point`, or `None` if it is behind the camera.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_projection * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }

        let ndc = clip.truncate() / clip.w;
        Some(self.origin + Vec2::new(ndc.x + 1.0, 1.0 - ndc.y) * 0.5 * self.size)
    }
}
