//! Window events and input state
//!
//! [`EventBackend`] is the seam to the windowing library. Backends emit
//! normalized [`Event`]s and maintain an [`InputState`] that the engine
//! reads once per tick.

pub mod backend;
pub mod event;
#[cfg(feature = "glfw")]
pub mod glfw_backend;
pub mod headless;
pub mod keyboard;
pub mod state;

pub use backend::{BackendError, EventBackend, InputMode};
pub use event::Event;
#[cfg(feature = "glfw")]
pub use glfw_backend::GlfwBackend;
pub use headless::HeadlessBackend;
pub use keyboard::{Keycode, MouseButton};
pub use state::InputState;
