//! Event backend abstraction
//!
//! A backend owns the window, turns host input into [`Event`]s and keeps an
//! [`InputState`] the engine reads after each poll. The engine only talks
//! to this trait, so the windowing library can be swapped freely.

use thiserror::Error;

use super::event::Event;
use super::state::InputState;

/// Backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The windowing library failed to start
    #[error("Backend initialization failed: {0}")]
    InitializationFailed(String),

    /// The window could not be created
    #[error("Window creation failed: {0}")]
    WindowCreationFailed(String),
}

/// What mouse and keyboard input is currently driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Free camera
    #[default]
    None,
    /// Dragging the selected object's transform
    EditObjectTransform,
    /// Input forwarded to the game
    GamePlay,
}

/// Window and input provider driven by the core loop
pub trait EventBackend {
    /// Open the window
    fn create_window(&mut self, width: u32, height: u32, fullscreen: bool) -> Result<(), BackendError>;

    /// Change the title bar text
    fn set_window_title(&mut self, title: &str);

    /// Resize the window or switch fullscreen
    fn change_resolution(&mut self, width: u32, height: u32, fullscreen: bool);

    /// Current drawable size
    fn size(&self) -> (u32, u32);

    /// Grab or release the cursor
    fn set_mouse_grab(&mut self, grab: bool);

    /// Whether the cursor is grabbed
    fn mouse_grab(&self) -> bool {
        self.input().mouse_grab()
    }

    /// Flip the cursor grab
    fn toggle_mouse_grab(&mut self) {
        let grab = !self.mouse_grab();
        self.set_mouse_grab(grab);
    }

    /// Collect this tick's events in host order and refresh the input state
    fn poll_events(&mut self) -> Vec<Event>;

    /// Input state after the last poll
    fn input(&self) -> &InputState;

    /// Current input mode
    fn input_mode(&self) -> InputMode;

    /// Change the input mode
    fn set_input_mode(&mut self, mode: InputMode);

    /// Present the frame
    fn flip(&mut self);

    /// Whether the loop should keep running
    fn is_running(&self) -> bool;

    /// Stop the loop at the next iteration boundary
    fn close(&mut self);

    /// Destroy the window
    fn quit(&mut self);

    /// Poll and hand the events to `tick` until [`EventBackend::close`] is called
    fn run<F>(&mut self, mut tick: F)
    where
        Self: Sized,
        F: FnMut(&mut Self, Vec<Event>),
    {
        while self.is_running() {
            let events = self.poll_events();
            tick(self, events);
        }
    }
}
