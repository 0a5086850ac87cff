//! Per-frame input snapshot.
//!
//! Window events are folded into an [`Input`] as they arrive. Consumers poll it
//! once per frame: edges (keys pressed, buttons pressed or released this frame), held state, pointer
//! position in pixels and normalized device coordinates, scroll, and whether
//! the control panel currently owns the pointer or keyboard.
//! [`Input::begin_frame`] clears the edges after the frame is done.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn from_winit(button: WinitMouseButton) -> Option<Self> {
        match button {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Keys the application reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Space,
    H,
    Escape,
}

impl KeyCode {
    fn from_winit(key: WinitKeyCode) -> Option<Self> {
        match key {
            WinitKeyCode::Space => Some(KeyCode::Space),
            WinitKeyCode::KeyH => Some(KeyCode::H),
            WinitKeyCode::Escape => Some(KeyCode::Escape),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Input {
    // Key state
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    // Mouse button state
    mouse_held: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,
    mouse_released: HashSet<MouseButton>,

    // Pointer
    mouse_position: Vec2,
    mouse_ndc: Vec2,

    // Lines scrolled this frame, positive is up
    scroll_delta: f32,

    window_size: (u32, u32),

    gui_wants_pointer: bool,
    gui_wants_keyboard: bool,
}

impl Input {
    pub fn new() -> Self {
        Self {
            window_size: (1600, 900),
            ..Default::default()
        }
    }

    // ========== Key Queries ==========

    /// True if `key` went down this frame and the panel is not taking keystrokes.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        !self.gui_wants_keyboard && self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    // ========== Mouse Button Queries ==========

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_released.contains(&button)
    }

    // ========== Pointer Queries ==========

    /// Pointer position in window pixels, origin top-left.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Pointer in normalized device coordinates, Y up.
    pub fn mouse_ndc(&self) -> Vec2 {
        self.mouse_ndc
    }

    /// Scroll accumulated this frame, in lines. Positive is up.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Whether the control panel owns the pointer.
    pub fn gui_captured(&self) -> bool {
        self.gui_wants_pointer
    }

    // ========== Feeding ==========

    /// Clears per-frame edges and scroll. Call after the frame has consumed them.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.mouse_released.clear();
        self.scroll_delta = 0.0;
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.update_ndc();
    }

    /// Records what the control panel claimed this frame.
    pub fn set_gui_capture(&mut self, pointer: bool, keyboard: bool) {
        self.gui_wants_pointer = pointer;
        self.gui_wants_keyboard = keyboard;
    }

    pub fn set_mouse_position(&mut self, position: Vec2) {
        self.mouse_position = position;
        self.update_ndc();
    }

    pub fn set_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.mouse_pressed.insert(button);
            self.mouse_held.insert(button);
        } else {
            self.mouse_held.remove(&button);
            self.mouse_released.insert(button);
        }
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            // Only fire pressed event if not already held (no repeat)
            if self.keys_held.insert(key) {
                self.keys_pressed.insert(key);
            }
        } else {
            self.keys_held.remove(&key);
        }
    }

    pub fn add_scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    /// Folds a winit window event into the snapshot.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = KeyCode::from_winit(code) {
                        self.set_key(key, event.state == ElementState::Pressed);
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = MouseButton::from_winit(*button) {
                    self.set_mouse_button(button, *state == ElementState::Pressed);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.set_mouse_position(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.add_scroll(match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                });
            }

            WindowEvent::Resized(size) => self.set_window_size(size.width, size.height),

            _ => {}
        }
    }

    fn update_ndc(&mut self) {
        let (w, h) = self.window_size;
        if w > 0 && h > 0 {
            self.mouse_ndc = Vec2::new(
                (self.mouse_position.x / w as f32) * 2.0 - 1.0,
                1.0 - (self.mouse_position.y / h as f32) * 2.0, // Y flipped
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = Input::new();
        assert!(!input.key_held(KeyCode::Space));

        input.set_key(KeyCode::Space, true);
        assert!(input.key_held(KeyCode::Space));
        assert!(input.key_pressed(KeyCode::Space));

        // After begin_frame, pressed is cleared but held remains
        input.begin_frame();
        assert!(input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));

        // Auto-repeat does not fire a second press
        input.set_key(KeyCode::Space, true);
        assert!(!input.key_pressed(KeyCode::Space));
    }

    #[test]
    fn test_escape_is_tracked() {
        let mut input = Input::new();
        assert_eq!(KeyCode::from_winit(WinitKeyCode::Escape), Some(KeyCode::Escape));
        assert_eq!(KeyCode::from_winit(WinitKeyCode::KeyQ), None);
        input.set_key(KeyCode::Escape, true);
        assert!(input.key_pressed(KeyCode::Escape));
        input.set_key(KeyCode::Escape, false);
        assert!(!input.key_held(KeyCode::Escape));
    }

    #[test]
    fn test_keyboard_capture_hides_presses() {
        let mut input = Input::new();
        input.set_gui_capture(false, true);
        input.set_key(KeyCode::H, true);
        assert!(!input.key_pressed(KeyCode::H));
        assert!(input.key_held(KeyCode::H));
    }

    #[test]
    fn test_mouse_edges() {
        let mut input = Input::new();
        input.set_mouse_button(MouseButton::Right, true);
        assert!(input.mouse_pressed(MouseButton::Right));
        input.begin_frame();
        assert!(input.mouse_held(MouseButton::Right));
        input.set_mouse_button(MouseButton::Right, false);
        assert!(input.mouse_released(MouseButton::Right));
        assert!(!input.mouse_held(MouseButton::Right));
    }

    #[test]
    fn test_mouse_ndc() {
        let mut input = Input::new();
        input.set_window_size(800, 600);

        input.set_mouse_position(Vec2::new(400.0, 300.0));
        assert!(input.mouse_ndc().length() < 0.01);

        input.set_mouse_position(Vec2::new(800.0, 0.0));
        assert!((input.mouse_ndc() - Vec2::new(1.0, 1.0)).length() < 1e-6);

        // NDC follows a resize without a new cursor event
        input.set_window_size(1600, 600);
        assert!((input.mouse_ndc().x - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_scroll_accumulates_per_frame() {
        let mut input = Input::new();
        input.add_scroll(1.0);
        input.add_scroll(2.0);
        assert_eq!(input.scroll_delta(), 3.0);
        input.begin_frame();
        assert_eq!(input.scroll_delta(), 0.0);
    }
}
