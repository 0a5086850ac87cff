//! Camera interaction: drag to orbit, scroll to zoom, hold to cast a force ray.
//!
//! Rotation follows a drag baseline. On press the pointer position and the
//! current angles are captured. While the button is held, the angles are set
//! to `baseline + (pointer - press_pointer) * sensitivity`, so the result
//! depends only on where a drag started and where it is now.

use crate::camera::{Camera, Ray};
use crate::input::{Input, MouseButton};
use glam::Vec2;

/// Vertical rotation limit in radians.
pub const PITCH_LIMIT: f32 = 1.5;
/// Zoom distance change per scrolled line.
pub const ZOOM_STEP: f32 = 0.25;
/// Closest the camera may get to the origin.
pub const MIN_SPEED: f32 = 0.1;

/// Button that orbits the camera.
pub const ROTATE_BUTTON: MouseButton = MouseButton::Right;
/// Button that casts the force ray.
pub const FORCE_BUTTON: MouseButton = MouseButton::Left;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        start_pointer: Vec2,
        start_rotation: Vec2,
    },
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: DragState,
    /// Yaw and pitch in radians.
    rotation: Vec2,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    /// Applies this frame's input to the controller and the camera.
    pub fn update(&mut self, input: &Input, camera: &mut Camera) {
        if !input.gui_captured() {
            self.zoom(camera, input.scroll_delta());
            if input.mouse_pressed(ROTATE_BUTTON) {
                self.begin_drag(input.mouse_position());
            }
        }

        if input.mouse_held(ROTATE_BUTTON) || input.mouse_released(ROTATE_BUTTON) {
            self.drag_to(input.mouse_position(), camera.sensitivity);
        }
        if !input.mouse_held(ROTATE_BUTTON) {
            self.end_drag();
        }

        camera.orbit(self.rotation);
    }

    /// Enters the dragging state with the current angles as baseline.
    pub fn begin_drag(&mut self, pointer: Vec2) {
        self.state = DragState::Dragging {
            start_pointer: pointer,
            start_rotation: self.rotation,
        };
    }

    /// Sets the angles from the baseline; no effect when idle.
    pub fn drag_to(&mut self, pointer: Vec2, sensitivity: f32) {
        if let DragState::Dragging {
            start_pointer,
            start_rotation,
        } = self.state
        {
            let rotation = start_rotation + (pointer - start_pointer) * sensitivity;
            self.rotation = Vec2::new(rotation.x, rotation.y.clamp(-PITCH_LIMIT, PITCH_LIMIT));
        }
    }

    pub fn end_drag(&mut self) {
        self.state = DragState::Idle;
    }

    /// Scrolling up moves the camera closer, never nearer than [`MIN_SPEED`].
    pub fn zoom(&mut self, camera: &mut Camera, scroll: f32) {
        if scroll != 0.0 {
            camera.speed = (camera.speed - scroll * ZOOM_STEP).max(MIN_SPEED);
        }
    }

    /// Ray through the pointer while the force button is held outside the panel.
    pub fn force_ray(&self, input: &Input, camera: &Camera) -> Option<Ray> {
        (input.mouse_held(FORCE_BUTTON) && !input.gui_captured()).then(|| camera.ray(input.mouse_ndc()))
    }
}
