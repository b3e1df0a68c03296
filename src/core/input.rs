//! Keyboard and mouse state for the demo viewer

use std::collections::HashSet;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Per-frame keyboard and mouse state
#[derive(Default)]
pub struct InputState {
    /// Keys currently held
    held: HashSet<KeyCode>,
    /// Keys that went down since the last `end_frame`
    pressed: HashSet<KeyCode>,
    /// Raw mouse motion accumulated since the last `end_frame`
    mouse_delta: (f32, f32),
    /// Whether the cursor is grabbed for mouse look
    mouse_captured: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a window event
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(key_code),
                    state,
                    repeat: false,
                    ..
                },
                ..
            } => self.set_key(*key_code, *state),
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Right, .. } => {
                self.set_mouse_captured(!self.mouse_captured);
            }
            WindowEvent::Focused(false) => {
                self.held.clear();
                self.set_mouse_captured(false);
            }
            _ => {}
        }
    }

    /// Apply a key transition
    pub fn set_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.held.insert(key) {
                    self.pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.held.remove(&key);
            }
        }
    }

    /// Raw mouse motion from `DeviceEvent::MouseMotion`
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        if self.mouse_captured {
            self.mouse_delta.0 += delta.0 as f32;
            self.mouse_delta.1 += delta.1 as f32;
        }
    }

    /// Reset per-frame state
    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    pub fn set_mouse_captured(&mut self, captured: bool) {
        self.mouse_captured = captured;
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn is_mouse_captured(&self) -> bool {
        self.mouse_captured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_lifecycle() {
        let mut input = InputState::new();
        assert!(!input.is_key_pressed(KeyCode::KeyW));

        input.set_key(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(input.is_key_just_pressed(KeyCode::KeyW));

        input.end_frame();
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(!input.is_key_just_pressed(KeyCode::KeyW));

        input.set_key(KeyCode::KeyW, ElementState::Released);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_mouse_motion_only_when_captured() {
        let mut input = InputState::new();
        input.process_mouse_motion((5.0, 2.0));
        assert_eq!(input.mouse_delta(), (0.0, 0.0));

        input.set_mouse_captured(true);
        input.process_mouse_motion((5.0, 2.0));
        input.process_mouse_motion((1.0, -1.0));
        assert_eq!(input.mouse_delta(), (6.0, 1.0));

        input.end_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }
}
