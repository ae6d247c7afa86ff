use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};

pub use winit::event::MouseButton;

/// Pixels of touchpad scrolling that count as one wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Default)]
pub struct InputState {
    /// The current position of the mouse inside the window client area in pixels. Set to `None` If
    /// the mouse is not over the client area.
    mouse_position: Option<Vec2>,
    mouse_delta: Vec2,

    mouse_pressed: HashSet<MouseButton>,

    wheel_delta: f32,
}

impl InputState {
    pub(crate) fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved {
                position: winit::dpi::PhysicalPosition { x, y },
                ..
            } => {
                let current = Vec2::new(*x as f32, *y as f32);

                if let Some(last) = self.mouse_position {
                    self.mouse_delta += current - last;
                }

                self.mouse_position = Some(current);
            }

            WindowEvent::CursorLeft { .. } => self.mouse_position = None,

            WindowEvent::MouseWheel { delta, .. } => {
                self.wheel_delta += match *delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(winit::dpi::PhysicalPosition { y, .. }) => {
                        y as f32 / PIXELS_PER_LINE
                    }
                };
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if *state == ElementState::Pressed {
                    self.mouse_pressed.insert(*button);
                } else {
                    self.mouse_pressed.remove(button);
                }
            }

            WindowEvent::Focused(false) => self.mouse_pressed.clear(),

            _ => {}
        }
    }

    /// Reset the movement accumulated since the last call.
    pub(crate) fn reset_deltas(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.wheel_delta = 0.0;
    }
}

impl InputState {
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn wheel_delta(&self) -> f32 {
        self.wheel_delta
    }
}
