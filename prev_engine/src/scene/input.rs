//! Input events delivered to node behaviours
//!
//! The scene does not pump a window; the application translates whatever it
//! receives (winit events, a replay file, a test script) into `InputEvent`
//! values and hands them to `SceneGraph::dispatch_event`.

use glam::Vec2;
use winit::event::{MouseButton, TouchPhase};
use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key {
        code: KeyCode,
        pressed: bool,
    },
    MouseButton {
        button: MouseButton,
        pressed: bool,
        position: Vec2,
    },
    MouseMove {
        position: Vec2,
        delta: Vec2,
    },
    MouseScroll {
        delta: f32,
    },
    Touch {
        id: u64,
        phase: TouchPhase,
        position: Vec2,
    },
    WindowResize {
        width: u32,
        height: u32,
    },
}

impl InputEvent {
    /// Convenience constructor for a key press
    pub fn key_down(code: KeyCode) -> Self {
        InputEvent::Key { code, pressed: true }
    }

    /// Convenience constructor for a key release
    pub fn key_up(code: KeyCode) -> Self {
        InputEvent::Key { code, pressed: false }
    }
}
