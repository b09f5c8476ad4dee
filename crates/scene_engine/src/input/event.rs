//! Host events in normalized form

use super::keyboard::{Keycode, MouseButton};

/// One host event, in the order the backend observed them within a tick
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The window was asked to close
    Quit,
    /// The drawable area changed size
    VideoResize {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// A key went down
    KeyDown {
        /// Normalized key
        keycode: Keycode,
    },
    /// A key went up
    KeyUp {
        /// Normalized key
        keycode: Keycode,
    },
    /// Text typed by the last key press
    Text {
        /// UTF-8 text
        text: String,
    },
    /// The cursor moved; `y` grows upwards from the bottom edge
    MouseMove {
        /// Cursor x in pixels
        x: f32,
        /// Cursor y in pixels, bottom-up
        y: f32,
    },
    /// A mouse button went down
    MouseButtonDown {
        /// Button
        button: MouseButton,
    },
    /// A mouse button went up
    MouseButtonUp {
        /// Button
        button: MouseButton,
    },
}
