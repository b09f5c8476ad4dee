//! Sky and ocean
//!
//! Both are drawn by the renderer collaborator; the scene only owns their
//! parameters and persists them.

use crate::foundation::transform::TransformObject;
use crate::scene::scene_data::{AtmosphereSaveData, OceanSaveData, TransformSaveData};

/// Sky parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Atmosphere {
    /// Atmosphere name
    pub name: String,
    /// Whether the sky is drawn
    pub is_render_atmosphere: bool,
}

impl Atmosphere {
    /// Create from save data
    pub fn from_save_data(data: &AtmosphereSaveData) -> Self {
        Self {
            name: data.name.clone(),
            is_render_atmosphere: data.is_render_atmosphere,
        }
    }

    /// Capture save data
    pub fn save_data(&self) -> AtmosphereSaveData {
        AtmosphereSaveData {
            name: self.name.clone(),
            is_render_atmosphere: self.is_render_atmosphere,
        }
    }
}

/// Ocean surface
#[derive(Debug, Clone)]
pub struct Ocean {
    /// Ocean name
    pub name: String,
    /// Placement; the surface height is the y position
    pub transform: TransformObject,
    /// Whether the ocean is drawn
    pub is_render_ocean: bool,
    /// Wave height scale
    pub height: f32,
    /// Wave animation speed
    pub wave_speed: f32,
    acc_time: f32,
}

impl Ocean {
    /// Create from save data
    pub fn from_save_data(data: &OceanSaveData) -> Self {
        let mut ocean = Self {
            name: data.name.clone(),
            transform: TransformObject::new(),
            is_render_ocean: data.is_render_ocean,
            height: data.height,
            wave_speed: data.wave_speed,
            acc_time: 0.0,
        };
        data.transform.apply(&mut ocean.transform);
        ocean.transform.update_transform(false, true);
        ocean
    }

    /// Capture save data
    pub fn save_data(&self) -> OceanSaveData {
        OceanSaveData {
            name: self.name.clone(),
            transform: TransformSaveData::from_transform(&self.transform),
            is_render_ocean: self.is_render_ocean,
            height: self.height,
            wave_speed: self.wave_speed,
        }
    }

    /// Advance the wave clock
    pub fn update(&mut self, delta: f32) {
        self.acc_time += delta * self.wave_speed;
        self.transform.update_transform(false, false);
    }

    /// Accumulated wave time
    pub fn acc_time(&self) -> f32 {
        self.acc_time
    }
}
