//! Backend without a window
//!
//! Replays scripted frames of events. Used by tests and offscreen runs; an
//! optional frame limit emits `Quit` once reached.

use std::collections::VecDeque;

use super::backend::{BackendError, EventBackend, InputMode};
use super::event::Event;
use super::state::InputState;

#[derive(Debug, Clone, Default)]
struct ScriptedFrame {
    events: Vec<Event>,
    wheel: f32,
}

/// Scripted event source
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    fullscreen: bool,
    title: String,
    window_created: bool,
    running: bool,
    input: InputState,
    mode: InputMode,
    script: VecDeque<ScriptedFrame>,
    frame_limit: Option<u64>,
    polled_frames: u64,
    flipped_frames: u64,
}

impl HeadlessBackend {
    /// Create a backend with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `Quit` on the poll after `frames` frames
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Append a frame of events
    pub fn push_frame(&mut self, events: Vec<Event>) {
        self.script.push_back(ScriptedFrame { events, wheel: 0.0 });
    }

    /// Append a frame that only scrolls the wheel
    pub fn push_wheel_frame(&mut self, amount: f32) {
        self.script.push_back(ScriptedFrame {
            events: Vec::new(),
            wheel: amount,
        });
    }

    /// Window title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the window is fullscreen
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Frames presented so far
    pub fn flipped_frames(&self) -> u64 {
        self.flipped_frames
    }

    /// Scripted frames not yet polled
    pub fn pending_frames(&self) -> usize {
        self.script.len()
    }
}

impl EventBackend for HeadlessBackend {
    fn create_window(&mut self, width: u32, height: u32, fullscreen: bool) -> Result<(), BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::WindowCreationFailed(format!("invalid size {width}x{height}")));
        }
        self.width = width;
        self.height = height;
        self.fullscreen = fullscreen;
        self.input.set_size(width, height);
        self.window_created = true;
        self.running = true;
        log::info!("Headless window {width}x{height}");
        Ok(())
    }

    fn set_window_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn change_resolution(&mut self, width: u32, height: u32, fullscreen: bool) {
        self.fullscreen = fullscreen;
        if (width, height) != (self.width, self.height) {
            self.push_frame(vec![Event::VideoResize { width, height }]);
        }
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_mouse_grab(&mut self, grab: bool) {
        self.input.set_mouse_grab(grab);
    }

    fn poll_events(&mut self) -> Vec<Event> {
        self.input.begin_tick();
        let frame = if self.frame_limit.is_some_and(|limit| self.polled_frames >= limit) {
            ScriptedFrame {
                events: vec![Event::Quit],
                wheel: 0.0,
            }
        } else {
            self.script.pop_front().unwrap_or_default()
        };
        self.polled_frames += 1;

        for event in &frame.events {
            if let Event::VideoResize { width, height } = event {
                self.width = *width;
                self.height = *height;
            }
            self.input.apply(event);
        }
        self.input.scroll(frame.wheel);
        self.input.end_tick();
        frame.events
    }

    fn input(&self) -> &InputState {
        &self.input
    }

    fn input_mode(&self) -> InputMode {
        self.mode
    }

    fn set_input_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    fn flip(&mut self) {
        self.flipped_frames += 1;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn close(&mut self) {
        self.running = false;
    }

    fn quit(&mut self) {
        self.running = false;
        self.window_created = false;
    }
}
