//! Application trait and lifecycle management

use thiserror::Error;

use crate::assets::AssetError;
use crate::config::ConfigError;
use crate::engine::{Engine, EngineError};
use crate::input::Event;
use crate::scene::SceneError;

/// Application lifecycle trait
///
/// Implement this trait to drive the engine's core loop with your own
/// content and logic.
pub trait Application {
    /// Called once after the window and render targets exist. Load assets
    /// and populate the scene here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Called every frame before the camera and scene update
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Time since last frame in seconds
    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError>;

    /// Called for every event after the engine handled it
    fn handle_event(&mut self, _engine: &mut Engine, _event: &Event) {}

    /// Called once when the loop has stopped
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Asset loading error
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Scene operation error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
