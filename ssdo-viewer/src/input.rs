//! Mouse navigation and key bindings.

use std::f32::consts::PI;

use glam::{DVec2, Vec3};
use ssdo_wgpu::{Camera, CompositeMode};
use winit::event::MouseButton;
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
    Zoom,
}

impl DragMode {
    pub fn from_button(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Left => Some(Self::Rotate),
            MouseButton::Right => Some(Self::Pan),
            MouseButton::Middle => Some(Self::Zoom),
            _ => None,
        }
    }
}

/// Pose and cursor captured when a drag starts.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Drag {
    mode: DragMode,
    base_cursor: DVec2,
    base_translation: Vec3,
    base_rotation: Vec3,
}

#[derive(Debug, Default)]
pub struct InputState {
    cursor: DVec2,
    drag: Option<Drag>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|d| d.mode)
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        self.cursor = DVec2::new(x, y);
    }

    /// Starts a drag from the current cursor. Ignored while another drag is active.
    pub fn begin_drag(&mut self, mode: DragMode, camera: &Camera) {
        if self.drag.is_some() {
            return;
        }
        self.drag = Some(Drag {
            mode,
            base_cursor: self.cursor,
            base_translation: camera.translation,
            base_rotation: camera.rotation,
        });
    }

    /// Ends the drag started by `mode`; releasing another button does nothing.
    pub fn end_drag(&mut self, mode: DragMode) {
        if self.drag_mode() == Some(mode) {
            self.drag = None;
        }
    }

    /// Moves `camera` for the active drag. Returns `false` when no drag is active.
    pub fn apply(&self, camera: &mut Camera, width: u32, height: u32, scale: f32) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        let normalizer = (width as f64 + height as f64) / 2.0;
        if normalizer <= 0.0 {
            return false;
        }
        let dx = ((drag.base_cursor.x - self.cursor.x) / normalizer) as f32;
        let dy = ((self.cursor.y - drag.base_cursor.y) / normalizer) as f32;

        match drag.mode {
            DragMode::Rotate => {
                camera.rotation = drag.base_rotation + Vec3::new(-dy * PI, dx * PI, 0.0);
            }
            DragMode::Pan => {
                camera.translation = drag.base_translation + scale * Vec3::new(dx, dy, 0.0);
            }
            DragMode::Zoom => {
                camera.translation = drag.base_translation + scale * Vec3::new(0.0, 0.0, dy);
            }
        }
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Help,
    SelectMode(CompositeMode),
    ToggleWireframe,
}

pub fn key_action(key: PhysicalKey) -> Option<KeyAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let digit = match code {
        KeyCode::Escape => return Some(KeyAction::Quit),
        KeyCode::KeyH => return Some(KeyAction::Help),
        KeyCode::F1 => return Some(KeyAction::ToggleWireframe),
        KeyCode::Digit0 | KeyCode::Numpad0 => 0,
        KeyCode::Digit1 | KeyCode::Numpad1 => 1,
        KeyCode::Digit2 | KeyCode::Numpad2 => 2,
        KeyCode::Digit3 | KeyCode::Numpad3 => 3,
        KeyCode::Digit4 | KeyCode::Numpad4 => 4,
        KeyCode::Digit5 | KeyCode::Numpad5 => 5,
        KeyCode::Digit6 | KeyCode::Numpad6 => 6,
        KeyCode::Digit7 | KeyCode::Numpad7 => 7,
        KeyCode::Digit8 | KeyCode::Numpad8 => 8,
        KeyCode::Digit9 | KeyCode::Numpad9 => 9,
        _ => return None,
    };
    CompositeMode::from_digit(digit).map(KeyAction::SelectMode)
}

pub const HELP: &str = "\
> Help:
    Mouse commands:
    * Left button: rotate camera
    * Middle button: zoom
    * Right button: pan camera
    Keyboard commands:
    * H: print this help
    * 0-9: select the displayed buffer
        0 direct occlusion, 1 blurred direct, 2 lighting,
        3 indirect, 4 blurred indirect, 5 skybox, 6 direct + indirect,
        7 normals, 8 final image, 9 depth
    * F1: toggle wireframe rendering
    * ESC: quit the program";
