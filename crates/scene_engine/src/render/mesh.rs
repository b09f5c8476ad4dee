//! Meshes and models
//!
//! A [`Mesh`] groups the geometries of one asset file with the skeleton and
//! animations that drive them. A [`Model`] pairs a mesh with one material
//! instance per geometry. Both are shared through `Arc` and never mutated
//! once handed to the scene.

use std::sync::Arc;

use crate::animation::{Animation, Skeleton};
use crate::assets::mesh_data::BoundBox;

use super::geometry::Geometry;
use super::material::MaterialInstance;

/// Geometries of one asset with their skeleton and animations
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    geometries: Vec<Arc<Geometry>>,
    skeleton: Option<Arc<Skeleton>>,
    animations: Vec<Arc<Animation>>,
    bound_box: BoundBox,
}

impl Mesh {
    /// Create a mesh; the bound box is the union of the geometry bounds
    pub fn new(
        name: impl Into<String>,
        geometries: Vec<Arc<Geometry>>,
        skeleton: Option<Arc<Skeleton>>,
        animations: Vec<Arc<Animation>>,
    ) -> Self {
        let bound_box = geometries
            .iter()
            .map(|g| *g.bound_box())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        Self {
            name: name.into(),
            geometries,
            skeleton,
            animations,
            bound_box,
        }
    }

    /// Mesh name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Geometries in file order
    pub fn geometries(&self) -> &[Arc<Geometry>] {
        &self.geometries
    }

    /// Number of geometries
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Skeleton driving the skinned geometries
    pub fn skeleton(&self) -> Option<&Arc<Skeleton>> {
        self.skeleton.as_ref()
    }

    /// Animations for the skeleton
    pub fn animations(&self) -> &[Arc<Animation>] {
        &self.animations
    }

    /// Whether the mesh is skinned
    pub fn has_bone(&self) -> bool {
        self.skeleton.is_some()
    }

    /// Union of the geometry bounds
    pub fn bound_box(&self) -> &BoundBox {
        &self.bound_box
    }
}

/// A mesh with one material instance per geometry
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    mesh: Arc<Mesh>,
    material_instances: Vec<Arc<MaterialInstance>>,
}

impl Model {
    /// Create a model; slots missing from `material_instances` get `default`
    pub fn new(
        name: impl Into<String>,
        mesh: Arc<Mesh>,
        mut material_instances: Vec<Arc<MaterialInstance>>,
        default: &Arc<MaterialInstance>,
    ) -> Self {
        material_instances.resize_with(mesh.geometry_count(), || Arc::clone(default));
        Self {
            name: name.into(),
            mesh,
            material_instances,
        }
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mesh drawn by this model
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Material instance of geometry `index`
    pub fn material_instance(&self, index: usize) -> Option<&Arc<MaterialInstance>> {
        self.material_instances.get(index)
    }

    /// All material instances, one per geometry
    pub fn material_instances(&self) -> &[Arc<MaterialInstance>] {
        &self.material_instances
    }

    /// Replace the material instance of geometry `index`; out-of-range
    /// indices are ignored
    pub fn set_material_instance(&mut self, index: usize, instance: Arc<MaterialInstance>) {
        if let Some(slot) = self.material_instances.get_mut(index) {
            *slot = instance;
        } else {
            log::warn!("{}: no geometry {} for material instance {}", self.name, index, instance.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::mesh_data::GeometryData;
    use crate::foundation::math::Vec3;
    use crate::render::material::{BlendMode, Material};
    use approx::assert_relative_eq;

    fn geometry(id: usize, offset: f32) -> Arc<Geometry> {
        let mut data = GeometryData {
            positions: vec![Vec3::repeat(offset), Vec3::repeat(offset + 1.0)],
            ..Default::default()
        };
        data.compute_bounds();
        Arc::new(Geometry::from_data(id, data))
    }

    #[test]
    fn test_mesh_bounds_union() {
        let mesh = Mesh::new("pair", vec![geometry(0, 0.0), geometry(1, 4.0)], None, Vec::new());
        assert_eq!(mesh.geometry_count(), 2);
        assert!(!mesh.has_bone());
        assert_relative_eq!(mesh.bound_box().bound_min, Vec3::zeros());
        assert_relative_eq!(mesh.bound_box().bound_max, Vec3::repeat(5.0));
    }

    #[test]
    fn test_model_fills_default_instances() {
        let mesh = Arc::new(Mesh::new("pair", vec![geometry(0, 0.0), geometry(1, 4.0)], None, Vec::new()));
        let material = Arc::new(Material::new(0, "default"));
        let default = Arc::new(MaterialInstance::new("default", Arc::clone(&material)));
        let mut model = Model::new("pair", mesh, Vec::new(), &default);
        assert_eq!(model.material_instances().len(), 2);

        let glass = Arc::new(MaterialInstance::new("glass", material).with_blend_mode(BlendMode::Translucent));
        model.set_material_instance(1, glass);
        model.set_material_instance(5, Arc::clone(&default));
        assert!(!model.material_instance(0).unwrap().is_translucent());
        assert!(model.material_instance(1).unwrap().is_translucent());
        assert!(model.material_instance(2).is_none());
    }
}
