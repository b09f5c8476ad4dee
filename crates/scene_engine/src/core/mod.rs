//! # Core Engine Module
//!
//! Shared configuration used by every subsystem.

pub mod config;

pub use config::{CameraConfig, Config, ConfigError, EngineConfig, FrameConfig, RenderConfig, WindowConfig};
