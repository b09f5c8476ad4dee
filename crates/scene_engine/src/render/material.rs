//! Materials and material instances
//!
//! A [`Material`] names a shading program; a [`MaterialInstance`] binds
//! parameter values and a blend mode to one. Render queues sort by
//! material id, so ids are assigned once by the resource manager.

use std::sync::Arc;

use crate::foundation::math::Vec4;

/// How a surface is composited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Written to the solid queue
    #[default]
    Opaque,
    /// Written to the translucent queue, never to the shadow queue
    Translucent,
}

/// A shading program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// Sort key, unique per resource manager
    pub id: usize,
    /// Material name
    pub name: String,
}

impl Material {
    /// Create a material
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// Parameter values bound to a [`Material`]
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInstance {
    /// Instance name
    pub name: String,
    /// Program the instance feeds
    pub material: Arc<Material>,
    /// Compositing mode
    pub blend_mode: BlendMode,
    /// Base colour (RGBA)
    pub base_color: Vec4,
    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metallic: f32,
    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f32,
}

impl MaterialInstance {
    /// Create an opaque white instance
    pub fn new(name: impl Into<String>, material: Arc<Material>) -> Self {
        Self {
            name: name.into(),
            material,
            blend_mode: BlendMode::Opaque,
            base_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            metallic: 0.0,
            roughness: 0.5,
        }
    }

    /// Set the blend mode
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Set the base colour
    pub fn with_color(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.base_color = Vec4::new(r, g, b, a);
        self
    }

    /// Set the metallic factor
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Set the roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Whether the instance renders in the translucent queue
    pub fn is_translucent(&self) -> bool {
        self.blend_mode == BlendMode::Translucent
    }

    /// Id of the underlying material
    pub fn material_id(&self) -> usize {
        self.material.id
    }
}
