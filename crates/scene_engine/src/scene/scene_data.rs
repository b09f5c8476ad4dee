//! Scene save data
//!
//! Plain serde records persisted as RON through [`Config`]. Every object
//! carries its name and a transform triple; the rest is per type.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::math::Vec3;
use crate::foundation::transform::TransformObject;

/// Position, rotation (radians) and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSaveData {
    /// Position
    pub pos: [f32; 3],
    /// Euler rotation in radians
    pub rot: [f32; 3],
    /// Scale
    pub scale: [f32; 3],
}

impl Default for TransformSaveData {
    fn default() -> Self {
        Self {
            pos: [0.0; 3],
            rot: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl TransformSaveData {
    /// Capture a transform
    pub fn from_transform(transform: &TransformObject) -> Self {
        Self {
            pos: transform.get_pos().into(),
            rot: transform.get_rotation().into(),
            scale: transform.get_scale().into(),
        }
    }

    /// Restore into a transform
    pub fn apply(&self, transform: &mut TransformObject) {
        transform.set_pos(Vec3::from(self.pos));
        transform.set_rotation(Vec3::from(self.rot));
        transform.set_scale(Vec3::from(self.scale));
    }
}

/// A camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSaveData {
    /// Unique camera name
    pub name: String,
    /// Placement
    pub transform: TransformSaveData,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near plane
    pub near: f32,
    /// Far plane
    pub far: f32,
}

impl Default for CameraSaveData {
    fn default() -> Self {
        Self {
            name: "camera".to_string(),
            transform: TransformSaveData::default(),
            fov: 60.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

/// The directional light casting shadows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainLightSaveData {
    /// Light name
    pub name: String,
    /// Orientation; position is ignored
    pub transform: TransformSaveData,
    /// Colour and intensity in `w`
    pub color: [f32; 4],
    /// Half width of the shadow volume
    pub shadow_width: f32,
    /// Half height of the shadow volume
    pub shadow_height: f32,
    /// Half depth of the shadow volume
    pub shadow_depth: f32,
}

impl Default for MainLightSaveData {
    fn default() -> Self {
        Self {
            name: "main_light".to_string(),
            transform: TransformSaveData {
                rot: [-std::f32::consts::FRAC_PI_4, 0.0, 0.0],
                ..Default::default()
            },
            color: [1.0, 1.0, 1.0, 1.0],
            shadow_width: 100.0,
            shadow_height: 100.0,
            shadow_depth: 200.0,
        }
    }
}

/// A point light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLightSaveData {
    /// Unique light name
    pub name: String,
    /// Placement
    pub transform: TransformSaveData,
    /// Light colour
    pub color: [f32; 3],
    /// Influence radius
    pub radius: f32,
}

impl Default for PointLightSaveData {
    fn default() -> Self {
        Self {
            name: "point_light".to_string(),
            transform: TransformSaveData::default(),
            color: [1.0, 1.0, 1.0],
            radius: 10.0,
        }
    }
}

/// A light probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightProbeSaveData {
    /// Unique probe name
    pub name: String,
    /// Placement
    pub transform: TransformSaveData,
}

impl Default for LightProbeSaveData {
    fn default() -> Self {
        Self {
            name: "light_probe".to_string(),
            transform: TransformSaveData::default(),
        }
    }
}

/// Sky parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereSaveData {
    /// Atmosphere name
    pub name: String,
    /// Whether the sky is drawn
    pub is_render_atmosphere: bool,
}

impl Default for AtmosphereSaveData {
    fn default() -> Self {
        Self {
            name: "atmosphere".to_string(),
            is_render_atmosphere: true,
        }
    }
}

/// Ocean surface parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanSaveData {
    /// Ocean name
    pub name: String,
    /// Placement; the surface height is `pos.y`
    pub transform: TransformSaveData,
    /// Whether the ocean is drawn
    pub is_render_ocean: bool,
    /// Wave height scale
    pub height: f32,
    /// Wave animation speed
    pub wave_speed: f32,
}

impl Default for OceanSaveData {
    fn default() -> Self {
        Self {
            name: "ocean".to_string(),
            transform: TransformSaveData::default(),
            is_render_ocean: false,
            height: 1.0,
            wave_speed: 1.0,
        }
    }
}

/// Random instancing ranges of an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstancingSaveData {
    /// Number of instances; zero or one disables instancing
    pub count: u32,
    /// Offset range, minimum corner
    pub position_min: [f32; 3],
    /// Offset range, maximum corner
    pub position_max: [f32; 3],
    /// Rotation range in radians, minimum
    pub rotation_min: [f32; 3],
    /// Rotation range in radians, maximum
    pub rotation_max: [f32; 3],
    /// Uniform scale range, minimum
    pub scale_min: f32,
    /// Uniform scale range, maximum
    pub scale_max: f32,
}

impl Default for InstancingSaveData {
    fn default() -> Self {
        Self {
            count: 0,
            position_min: [-10.0, 0.0, -10.0],
            position_max: [10.0, 0.0, 10.0],
            rotation_min: [0.0; 3],
            rotation_max: [0.0, std::f32::consts::TAU, 0.0],
            scale_min: 1.0,
            scale_max: 1.0,
        }
    }
}

/// A static or skeletal actor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorSaveData {
    /// Unique actor name
    pub name: String,
    /// Name of the model it instantiates
    pub model: String,
    /// Placement
    pub transform: TransformSaveData,
    /// Instancing ranges
    pub instancing: InstancingSaveData,
    /// Animation index, skeletal actors only
    pub animation_index: usize,
}

/// A particle effect placement; effects are stored and restored untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSaveData {
    /// Unique effect name
    pub name: String,
    /// Name of the effect asset
    pub effect: String,
    /// Placement
    pub transform: TransformSaveData,
}

/// Everything needed to rebuild a scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSaveData {
    /// Cameras; the first one is the main camera
    pub cameras: Vec<CameraSaveData>,
    /// Main directional light
    pub main_light: MainLightSaveData,
    /// Point lights
    pub lights: Vec<PointLightSaveData>,
    /// Light probes; the first one is the main probe
    pub light_probes: Vec<LightProbeSaveData>,
    /// Sky
    pub atmosphere: AtmosphereSaveData,
    /// Ocean
    pub ocean: OceanSaveData,
    /// Actors without bones
    pub static_actors: Vec<ActorSaveData>,
    /// Skinned actors
    pub skeleton_actors: Vec<ActorSaveData>,
    /// Effect placements
    pub effects: Vec<EffectSaveData>,
}

impl Config for SceneSaveData {}
