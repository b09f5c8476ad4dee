//! Per-backend input snapshot
//!
//! Backends call [`InputState::begin_tick`] before polling, feed every host
//! event through [`InputState::apply`] and finish with
//! [`InputState::end_tick`]. Transient flags (released keys, button edges,
//! wheel) therefore live for exactly one tick.

use std::collections::HashSet;

use super::event::Event;
use super::keyboard::{Keycode, MouseButton};
use crate::foundation::math::Vec2;

/// Keyboard and mouse state of the current tick
#[derive(Debug, Clone, Default)]
pub struct InputState {
    width: u32,
    height: u32,
    keys_pressed: HashSet<Keycode>,
    keys_released: HashSet<Keycode>,
    text: String,
    mouse_pos: Vec2,
    mouse_pos_old: Vec2,
    mouse_delta: Vec2,
    wheel_up: bool,
    wheel_down: bool,
    buttons_pressed: [bool; 3],
    buttons_down: [bool; 3],
    buttons_up: [bool; 3],
    mouse_grab: bool,
}

impl InputState {
    /// Create an empty state for a `width` x `height` window
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Window center in pixels
    pub fn center(&self) -> Vec2 {
        #[allow(clippy::cast_precision_loss)]
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }

    /// Track a new window size
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Clear transient state before polling
    pub fn begin_tick(&mut self) {
        self.mouse_pos_old = if self.mouse_grab { self.center() } else { self.mouse_pos };
        self.mouse_delta = Vec2::zeros();
        self.keys_released.clear();
        self.text.clear();
        self.wheel_up = false;
        self.wheel_down = false;
        self.buttons_down = [false; 3];
        self.buttons_up = [false; 3];
    }

    /// Fold one event into the state
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::KeyDown { keycode } => {
                self.keys_pressed.insert(*keycode);
                self.keys_released.remove(keycode);
            }
            Event::KeyUp { keycode } => {
                self.keys_pressed.remove(keycode);
                self.keys_released.insert(*keycode);
            }
            Event::Text { text } => self.text.push_str(text),
            Event::MouseMove { x, y } => {
                self.mouse_pos = Vec2::new(*x, *y);
                if self.mouse_grab {
                    self.mouse_delta += self.mouse_pos - self.center();
                }
            }
            Event::MouseButtonDown { button } => {
                self.buttons_pressed[button.index()] = true;
                self.buttons_down[button.index()] = true;
            }
            Event::MouseButtonUp { button } => {
                self.buttons_pressed[button.index()] = false;
                self.buttons_up[button.index()] = true;
            }
            Event::VideoResize { width, height } => self.set_size(*width, *height),
            Event::Quit => {}
        }
    }

    /// Record a wheel step for this tick
    pub fn scroll(&mut self, amount: f32) {
        if amount > 0.0 {
            self.wheel_up = true;
        } else if amount < 0.0 {
            self.wheel_down = true;
        }
    }

    /// Finish the tick: compute the free-cursor delta or re-center a grabbed
    /// cursor
    pub fn end_tick(&mut self) {
        if self.mouse_grab {
            self.mouse_pos = self.center();
        } else {
            self.mouse_delta = self.mouse_pos - self.mouse_pos_old;
        }
    }

    /// Enable or disable cursor grabbing
    pub fn set_mouse_grab(&mut self, grab: bool) {
        self.mouse_grab = grab;
        if grab {
            self.mouse_pos = self.center();
            self.mouse_pos_old = self.mouse_pos;
        }
    }

    /// Whether the cursor is grabbed
    pub fn mouse_grab(&self) -> bool {
        self.mouse_grab
    }

    /// Whether `key` is held
    pub fn is_key_pressed(&self, key: Keycode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Whether `key` went up during this tick
    pub fn is_key_released(&self, key: Keycode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Every held key
    pub fn keys_pressed(&self) -> &HashSet<Keycode> {
        &self.keys_pressed
    }

    /// Text typed during this tick
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position, bottom-up
    pub fn mouse_pos(&self) -> Vec2 {
        self.mouse_pos
    }

    /// Cursor position at the start of the tick
    pub fn mouse_pos_old(&self) -> Vec2 {
        self.mouse_pos_old
    }

    /// Cursor movement of this tick
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Wheel scrolled up this tick
    pub fn wheel_up(&self) -> bool {
        self.wheel_up
    }

    /// Wheel scrolled down this tick
    pub fn wheel_down(&self) -> bool {
        self.wheel_down
    }

    /// Whether `button` is held
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed[button.index()]
    }

    /// Whether `button` went down this tick
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down[button.index()]
    }

    /// Whether `button` went up this tick
    pub fn is_button_up(&self, button: MouseButton) -> bool {
        self.buttons_up[button.index()]
    }

    /// Forget every held key and button, e.g. after focus loss
    pub fn release_all(&mut self) {
        self.keys_released.extend(self.keys_pressed.drain());
        self.buttons_pressed = [false; 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_key_edges_last_one_tick() {
        let mut state = InputState::new(800, 600);
        state.begin_tick();
        state.apply(&Event::KeyDown { keycode: Keycode::W });
        state.end_tick();
        assert!(state.is_key_pressed(Keycode::W));

        state.begin_tick();
        state.apply(&Event::KeyUp { keycode: Keycode::W });
        state.end_tick();
        assert!(!state.is_key_pressed(Keycode::W));
        assert!(state.is_key_released(Keycode::W));

        state.begin_tick();
        state.end_tick();
        assert!(!state.is_key_released(Keycode::W));
    }

    #[test]
    fn test_wheel_is_transient() {
        let mut state = InputState::new(800, 600);
        state.begin_tick();
        state.scroll(1.0);
        state.end_tick();
        assert!(state.wheel_up());
        assert!(!state.wheel_down());

        state.begin_tick();
        state.end_tick();
        assert!(!state.wheel_up());
    }

    #[test]
    fn test_free_cursor_delta() {
        let mut state = InputState::new(800, 600);
        state.begin_tick();
        state.apply(&Event::MouseMove { x: 100.0, y: 50.0 });
        state.end_tick();

        state.begin_tick();
        state.apply(&Event::MouseMove { x: 110.0, y: 45.0 });
        state.end_tick();
        assert_relative_eq!(state.mouse_delta(), Vec2::new(10.0, -5.0));
        assert_relative_eq!(state.mouse_pos_old(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_grabbed_cursor_recenters() {
        let mut state = InputState::new(800, 600);
        state.set_mouse_grab(true);
        state.begin_tick();
        state.apply(&Event::MouseMove { x: 410.0, y: 290.0 });
        state.end_tick();
        assert_relative_eq!(state.mouse_delta(), Vec2::new(10.0, -10.0));
        assert_relative_eq!(state.mouse_pos(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_buttons() {
        let mut state = InputState::new(800, 600);
        state.begin_tick();
        state.apply(&Event::MouseButtonDown { button: MouseButton::Right });
        state.end_tick();
        assert!(state.is_button_pressed(MouseButton::Right));
        assert!(state.is_button_down(MouseButton::Right));

        state.begin_tick();
        state.apply(&Event::MouseButtonUp { button: MouseButton::Right });
        state.end_tick();
        assert!(!state.is_button_pressed(MouseButton::Right));
        assert!(state.is_button_up(MouseButton::Right));
        assert!(!state.is_button_down(MouseButton::Right));
    }
}
