//! # Engine Configuration
//!
//! All tunables of the engine in one serde record. Each subsystem reads
//! its own section: the event backend reads `window`, the scene camera
//! reads `camera`, the render target manager reads `render`, and the
//! core loop reads `frame`.
//!
//! Files are loaded through the [`Config`] trait, so either TOML or RON
//! works, chosen by extension.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Window Configuration
///
/// Parameters handed to the event backend when the window is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
    /// Limit presentation to the display refresh
    pub vsync: bool,
    /// Allow the user to resize the window
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Scene Viewer".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            resizable: true,
        }
    }
}

/// # Camera Configuration
///
/// Projection and navigation parameters for scene cameras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// World units per meter
    pub meter_per_unit: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Keyboard and wheel movement speed
    pub move_speed: f32,
    /// Middle mouse pan speed
    pub pan_speed: f32,
    /// Right mouse rotation speed in radians per pixel
    pub rotation_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            meter_per_unit: 1.0,
            fov: 60.0,
            near: 0.1,
            far: 2000.0,
            move_speed: 1.0,
            pan_speed: 1.0,
            rotation_speed: 0.005,
        }
    }
}

/// # Render Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Enable multisampled render targets
    pub msaa_enabled: bool,
    /// Sample count used when MSAA is enabled
    pub msaa_samples: u32,
    /// Enable supersampled render targets
    pub ssaa_enabled: bool,
    /// Upper bound on point lights submitted per frame
    pub max_point_lights: usize,
    /// Edge length of the shadow map
    pub shadow_map_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            msaa_enabled: false,
            msaa_samples: 4,
            ssaa_enabled: false,
            max_point_lights: 10,
            shadow_map_size: 2048,
        }
    }
}

/// # Frame Configuration
///
/// Core loop pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frame rate limit applied while vsync is on
    pub target_fps: f32,
    /// Seconds a window size must stay unchanged before targets are rebuilt
    pub resize_debounce: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            resize_debounce: 0.5,
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
/// This is the main configuration structure applications should use.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window creation parameters
    pub window: WindowConfig,
    /// Camera projection and navigation
    pub camera: CameraConfig,
    /// Render target and lighting options
    pub render: RenderConfig,
    /// Core loop pacing
    pub frame: FrameConfig,
}

impl EngineConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set window size
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Set window title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    /// Enable or disable vsync
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.window.vsync = vsync;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        if self.camera.near < 0.0 || self.camera.far <= self.camera.near {
            return Err(ConfigError::Invalid(format!(
                "camera clip range must satisfy 0 <= near < far, got near {} far {}",
                self.camera.near, self.camera.far
            )));
        }

        if self.render.msaa_enabled && self.render.msaa_samples < 2 {
            return Err(ConfigError::Invalid("MSAA needs at least 2 samples".to_string()));
        }

        if self.frame.target_fps <= 0.0 {
            return Err(ConfigError::Invalid("target fps must be positive".to_string()));
        }

        Ok(())
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!((config.window.width, config.window.height), (1280, 720));
        assert!((config.camera.fov - 60.0).abs() < f32::EPSILON);
        assert_eq!(config.render.max_point_lights, 10);
        assert_eq!(config.render.shadow_map_size, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("[window]\nwidth = 800\nheight = 600\n").unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.title, WindowConfig::default().title);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_clip_range() {
        let mut config = EngineConfig::default();
        config.camera.far = config.camera.near;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_ron_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        let config = EngineConfig::new().with_window_size(640, 480).with_vsync(false);
        config.save_to_file(&path).unwrap();
        assert_eq!(EngineConfig::load_from_file(&path).unwrap(), config);
    }
}
