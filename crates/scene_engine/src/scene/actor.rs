//! Scene actors
//!
//! An [`Actor`] places a shared [`Model`] in the scene. Static and skeletal
//! actors share the same capability set; the skeletal variant additionally
//! advances an animation cursor and keeps per-animation skinning buffers.

use std::sync::Arc;

use rand::Rng;

use super::scene_data::{ActorSaveData, InstancingSaveData, TransformSaveData};
use crate::animation::AnimationBuffer;
use crate::assets::mesh_data::BoundBox;
use crate::foundation::math::{utils, Mat4, Vec3};
use crate::foundation::transform::TransformObject;
use crate::render::{Geometry, MaterialInstance, Mesh, Model};

/// A closed range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeVariable<T> {
    min_value: T,
    max_value: T,
}

impl<T: Copy> RangeVariable<T> {
    /// Range between two values, in any order
    pub fn new(min_value: T, max_value: T) -> Self {
        Self { min_value, max_value }
    }

    /// Range holding a single value
    pub fn constant(value: T) -> Self {
        Self::new(value, value)
    }

    /// First bound
    pub fn min_value(&self) -> T {
        self.min_value
    }

    /// Second bound
    pub fn max_value(&self) -> T {
        self.max_value
    }
}

impl RangeVariable<f32> {
    /// Uniform sample between the bounds
    pub fn get_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        utils::lerp(self.min_value, self.max_value, rng.gen::<f32>())
    }
}

impl RangeVariable<Vec3> {
    /// Per-component uniform sample between the bounds
    pub fn get_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(
            utils::lerp(self.min_value.x, self.max_value.x, rng.gen::<f32>()),
            utils::lerp(self.min_value.y, self.max_value.y, rng.gen::<f32>()),
            utils::lerp(self.min_value.z, self.max_value.z, rng.gen::<f32>()),
        )
    }
}

/// Randomly scattered copies of an actor
#[derive(Debug, Clone, PartialEq)]
pub struct Instancing {
    count: u32,
    position: RangeVariable<Vec3>,
    rotation: RangeVariable<Vec3>,
    scale: RangeVariable<f32>,
    matrices: Vec<Mat4>,
    radius_offset: f32,
    radius_scale: f32,
}

impl Default for Instancing {
    fn default() -> Self {
        Self::from_save_data(&InstancingSaveData::default())
    }
}

impl Instancing {
    /// Ranges from save data; matrices are generated by `set_count`
    pub fn from_save_data(data: &InstancingSaveData) -> Self {
        Self {
            count: 0,
            position: RangeVariable::new(Vec3::from(data.position_min), Vec3::from(data.position_max)),
            rotation: RangeVariable::new(Vec3::from(data.rotation_min), Vec3::from(data.rotation_max)),
            scale: RangeVariable::new(data.scale_min, data.scale_max),
            matrices: Vec::new(),
            radius_offset: 0.0,
            radius_scale: 1.0,
        }
    }

    /// Current ranges and count as save data
    pub fn save_data(&self) -> InstancingSaveData {
        InstancingSaveData {
            count: self.count,
            position_min: self.position.min_value().into(),
            position_max: self.position.max_value().into(),
            rotation_min: self.rotation.min_value().into(),
            rotation_max: self.rotation.max_value().into(),
            scale_min: self.scale.min_value(),
            scale_max: self.scale.max_value(),
        }
    }

    /// Draw `count` instances from the ranges; one or fewer clears instancing
    pub fn set_count<R: Rng + ?Sized>(&mut self, count: u32, rng: &mut R) {
        self.count = count;
        self.matrices.clear();
        self.radius_offset = 0.0;
        self.radius_scale = 1.0;
        if count <= 1 {
            return;
        }

        let mut offset_max = 0.0_f32;
        let mut scale_max = 0.0_f32;
        let mut placement = TransformObject::new();
        for _ in 0..count {
            let pos = self.position.get_uniform(rng);
            let rot = self.rotation.get_uniform(rng);
            let scale = self.scale.get_uniform(rng);

            offset_max = offset_max.max(utils::max_abs_component(&pos));
            scale_max = scale_max.max(scale.abs());

            placement.set_pos(pos);
            placement.set_rotation(rot);
            placement.set_scale(Vec3::repeat(scale));
            placement.update_transform(false, true);
            self.matrices.push(*placement.matrix());
        }
        self.radius_offset = offset_max;
        self.radius_scale = scale_max;
    }

    /// Replace the ranges; call `set_count` to regenerate
    pub fn set_ranges(&mut self, position: RangeVariable<Vec3>, rotation: RangeVariable<Vec3>, scale: RangeVariable<f32>) {
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
    }

    /// Requested instance count
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether instanced drawing is active
    pub fn is_instanced(&self) -> bool {
        !self.matrices.is_empty()
    }

    /// Per-instance local matrices
    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    /// Largest absolute offset component of any instance
    pub fn radius_offset(&self) -> f32 {
        self.radius_offset
    }

    /// Largest absolute instance scale
    pub fn radius_scale(&self) -> f32 {
        self.radius_scale
    }
}

/// Animation state of a skeletal actor
#[derive(Debug, Clone, Default)]
pub struct SkeletonState {
    animation_index: usize,
    animation_time: f32,
    buffers: Vec<AnimationBuffer>,
}

impl SkeletonState {
    fn new(mesh: &Mesh, animation_index: usize) -> Self {
        let buffers = mesh
            .animations()
            .iter()
            .map(|animation| {
                let mut buffer = AnimationBuffer::new();
                buffer.update(animation, 0.0);
                buffer
            })
            .collect();
        Self {
            animation_index: animation_index.min(mesh.animations().len().saturating_sub(1)),
            animation_time: 0.0,
            buffers,
        }
    }

    fn update(&mut self, mesh: &Mesh, delta: f32) {
        let Some(current) = mesh.animations().get(self.animation_index) else {
            return;
        };
        if current.frame_count() > 1 && current.length() > 0.0 {
            self.animation_time = (self.animation_time + delta) % current.length();
        }

        for (animation, buffer) in mesh.animations().iter().zip(self.buffers.iter_mut()) {
            let frame = if animation.frame_count() > 1 && animation.length() > 0.0 {
                animation.time_to_frame(self.animation_time % animation.length())
            } else {
                0.0
            };
            buffer.update(animation, frame);
        }
    }

    /// Index of the playing animation
    pub fn animation_index(&self) -> usize {
        self.animation_index
    }

    /// Time cursor in seconds
    pub fn animation_time(&self) -> f32 {
        self.animation_time
    }

    /// Skinning buffers, one per mesh animation
    pub fn buffers(&self) -> &[AnimationBuffer] {
        &self.buffers
    }
}

/// Variant specific state
#[derive(Debug, Clone)]
pub enum ActorKind {
    /// No bones
    Static,
    /// Skinned and animated
    Skeleton(SkeletonState),
}

/// A model placed in the scene
#[derive(Debug, Clone)]
pub struct Actor {
    name: String,
    /// Placement
    pub transform: TransformObject,
    model: Arc<Model>,
    material_overrides: Vec<Option<Arc<MaterialInstance>>>,
    instancing: Instancing,
    /// Hidden actors are skipped by render info gathering
    pub visible: bool,
    selected: bool,
    kind: ActorKind,
}

impl Actor {
    /// Create a static actor
    pub fn new_static(name: impl Into<String>, model: Arc<Model>) -> Self {
        Self::with_kind(name.into(), model, ActorKind::Static)
    }

    /// Create a skeletal actor playing the first animation
    pub fn new_skeleton(name: impl Into<String>, model: Arc<Model>) -> Self {
        let state = SkeletonState::new(model.mesh(), 0);
        Self::with_kind(name.into(), model, ActorKind::Skeleton(state))
    }

    /// Rebuild an actor from save data; skeletal when the mesh has bones
    pub fn from_save_data(data: &ActorSaveData, model: Arc<Model>) -> Self {
        let kind = if model.mesh().has_bone() {
            ActorKind::Skeleton(SkeletonState::new(model.mesh(), data.animation_index))
        } else {
            ActorKind::Static
        };
        let mut actor = Self::with_kind(data.name.clone(), model, kind);
        data.transform.apply(&mut actor.transform);
        actor.transform.update_transform(true, true);
        actor.instancing = Instancing::from_save_data(&data.instancing);
        actor.set_instance_count(data.instancing.count);
        actor
    }

    fn with_kind(name: String, model: Arc<Model>, kind: ActorKind) -> Self {
        let mut transform = TransformObject::new();
        transform.update_transform(true, true);
        Self {
            name,
            transform,
            material_overrides: vec![None; model.mesh().geometry_count()],
            model,
            instancing: Instancing::default(),
            visible: true,
            selected: false,
            kind,
        }
    }

    /// Current state as save data
    pub fn save_data(&self) -> ActorSaveData {
        ActorSaveData {
            name: self.name.clone(),
            model: self.model.name().to_string(),
            transform: TransformSaveData::from_transform(&self.transform),
            instancing: self.instancing.save_data(),
            animation_index: self.skeleton_state().map_or(0, SkeletonState::animation_index),
        }
    }

    /// Unique actor name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Model this actor instantiates
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Mesh of the model
    pub fn mesh(&self) -> &Arc<Mesh> {
        self.model.mesh()
    }

    /// Variant state
    pub fn kind(&self) -> &ActorKind {
        &self.kind
    }

    /// Whether the actor is skinned
    pub fn is_skeletal(&self) -> bool {
        matches!(self.kind, ActorKind::Skeleton(_))
    }

    /// Animation state of a skeletal actor
    pub fn skeleton_state(&self) -> Option<&SkeletonState> {
        match &self.kind {
            ActorKind::Skeleton(state) => Some(state),
            ActorKind::Static => None,
        }
    }

    /// Number of geometries
    pub fn geometry_count(&self) -> usize {
        self.model.mesh().geometry_count()
    }

    /// Geometry at `index`
    pub fn geometry(&self, index: usize) -> Option<&Arc<Geometry>> {
        self.model.mesh().geometries().get(index)
    }

    /// Material instance for geometry `index`, preferring the actor override
    pub fn material_instance(&self, index: usize) -> Option<&Arc<MaterialInstance>> {
        self.material_overrides
            .get(index)
            .and_then(Option::as_ref)
            .or_else(|| self.model.material_instance(index))
    }

    /// Override the material of geometry `index`; `None` restores the model's
    pub fn set_material_override(&mut self, index: usize, instance: Option<Arc<MaterialInstance>>) {
        match self.material_overrides.get_mut(index) {
            Some(slot) => *slot = instance,
            None => log::warn!("{} has no geometry {index} to override", self.name),
        }
    }

    /// Whether any geometry draws translucent
    pub fn is_translucent(&self) -> bool {
        (0..self.geometry_count())
            .filter_map(|index| self.material_instance(index))
            .any(|instance| instance.is_translucent())
    }

    /// Local bounds of the whole mesh
    pub fn bound_box(&self) -> &BoundBox {
        self.model.mesh().bound_box()
    }

    /// Instancing parameters
    pub fn instancing(&self) -> &Instancing {
        &self.instancing
    }

    /// Mutable instancing parameters
    pub fn instancing_mut(&mut self) -> &mut Instancing {
        &mut self.instancing
    }

    /// Regenerate `count` random instances
    pub fn set_instance_count(&mut self, count: u32) {
        self.instancing.set_count(count, &mut rand::thread_rng());
    }

    /// Largest world-space scale component
    pub fn max_scale(&self) -> f32 {
        utils::max_abs_component(&self.transform.get_scale())
    }

    /// Radius of a geometry after actor scale and instancing spread
    pub fn effective_radius(&self, geometry: &Geometry) -> f32 {
        let max_scale = self.max_scale();
        geometry.bound_box().radius * max_scale * self.instancing.radius_scale()
            + self.instancing.radius_offset() * max_scale
    }

    /// World-space centre of a geometry's bounds
    pub fn world_bound_center(&self, geometry: &Geometry) -> Vec3 {
        let center = geometry.bound_box().bound_center;
        self.transform.matrix().transform_point(&center.into()).coords
    }

    /// Whether the actor is selected
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Mark the actor selected
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Switch the playing animation; returns false when out of range
    pub fn set_animation_index(&mut self, index: usize) -> bool {
        let animation_count = self.model.mesh().animations().len();
        match &mut self.kind {
            ActorKind::Skeleton(state) if index < animation_count => {
                state.animation_index = index;
                state.animation_time = 0.0;
                true
            }
            _ => false,
        }
    }

    /// Current skinning matrices of the playing animation
    pub fn animation_buffer(&self) -> Option<&AnimationBuffer> {
        self.skeleton_state()
            .and_then(|state| state.buffers.get(state.animation_index))
    }

    /// Advance transform and animation by `delta` seconds
    pub fn update(&mut self, delta: f32) {
        self.transform.update_transform(true, false);
        if let ActorKind::Skeleton(state) = &mut self.kind {
            state.update(self.model.mesh(), delta);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::animation::{Animation, AnimationNode, Skeleton};
    use crate::assets::mesh_data::{GeometryData, Interpolation};
    use crate::foundation::math::Transform;
    use crate::render::{BlendMode, Material};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    pub(crate) fn cube_model(name: &str, id: usize, translucent: bool) -> Arc<Model> {
        let mut data = GeometryData {
            name: name.to_string(),
            positions: vec![Vec3::repeat(-0.5), Vec3::repeat(0.5)],
            ..Default::default()
        };
        data.compute_bounds();
        let geometry = Arc::new(Geometry::from_data(id, data));
        let mesh = Arc::new(Mesh::new(name, vec![geometry], None, Vec::new()));
        let material = Arc::new(Material::new(id, name));
        let blend = if translucent { BlendMode::Translucent } else { BlendMode::Opaque };
        let instance = Arc::new(MaterialInstance::new(name, material).with_blend_mode(blend));
        Arc::new(Model::new(name, mesh, vec![Arc::clone(&instance)], &instance))
    }

    pub(crate) fn skinned_model() -> Arc<Model> {
        let skeleton = Skeleton::new("rig", [("root".to_string(), None, Mat4::identity())]).unwrap();
        let node = AnimationNode {
            name: "walk_root".to_string(),
            target: "root".to_string(),
            bone_index: Some(0),
            times: vec![0.0, 1.0, 2.0],
            transforms: (0..3)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let x = i as f32;
                    Transform::from_position(Vec3::new(x, 0.0, 0.0))
                })
                .collect(),
            interpolations: vec![Interpolation::Linear; 3],
            ..Default::default()
        };
        let animation = Arc::new(Animation::new("walk".to_string(), "rig".to_string(), vec![node]));
        let mut data = GeometryData {
            positions: vec![Vec3::zeros(), Vec3::repeat(1.0)],
            ..Default::default()
        };
        data.compute_bounds();
        let mesh = Arc::new(Mesh::new(
            "walker",
            vec![Arc::new(Geometry::from_data(7, data))],
            Some(Arc::new(skeleton)),
            vec![animation],
        ));
        let material = Arc::new(Material::new(0, "default"));
        let instance = Arc::new(MaterialInstance::new("default", material));
        Arc::new(Model::new("walker", mesh, Vec::new(), &instance))
    }

    #[test]
    fn test_instancing_radius_tracks_extremes() {
        let mut instancing = Instancing::from_save_data(&InstancingSaveData {
            position_min: [-4.0, 0.0, -2.0],
            position_max: [4.0, 0.0, 2.0],
            scale_min: 0.5,
            scale_max: 2.0,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(7);
        instancing.set_count(32, &mut rng);

        assert_eq!(instancing.matrices().len(), 32);
        assert!(instancing.radius_offset() <= 4.0);
        assert!(instancing.radius_scale() >= 0.5 && instancing.radius_scale() <= 2.0);

        instancing.set_count(1, &mut rng);
        assert!(!instancing.is_instanced());
        assert_relative_eq!(instancing.radius_scale(), 1.0);
    }

    #[test]
    fn test_constant_range_places_instances_exactly() {
        let mut instancing = Instancing::default();
        instancing.set_ranges(
            RangeVariable::constant(Vec3::new(3.0, -5.0, 1.0)),
            RangeVariable::constant(Vec3::zeros()),
            RangeVariable::constant(2.0),
        );
        instancing.set_count(2, &mut StdRng::seed_from_u64(1));
        assert_relative_eq!(instancing.radius_offset(), 5.0);
        assert_relative_eq!(instancing.radius_scale(), 2.0);
        let origin = instancing.matrices()[0].transform_point(&Vec3::zeros().into());
        assert_relative_eq!(origin.coords, Vec3::new(3.0, -5.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_effective_radius_includes_instancing() {
        let mut actor = Actor::new_static("box", cube_model("box", 0, false));
        actor.transform.set_scale(Vec3::new(1.0, 3.0, 2.0));
        actor.update(0.0);
        let geometry = Arc::clone(actor.geometry(0).unwrap());
        assert_relative_eq!(actor.effective_radius(&geometry), 3.0_f32.sqrt() * 3.0, epsilon = 1e-5);

        actor.instancing_mut().set_ranges(
            RangeVariable::constant(Vec3::new(2.0, 0.0, 0.0)),
            RangeVariable::constant(Vec3::zeros()),
            RangeVariable::constant(1.5),
        );
        actor.instancing_mut().set_count(4, &mut StdRng::seed_from_u64(3));
        let expected = 3.0_f32.sqrt() * 3.0 * 1.5 + 2.0 * 3.0;
        assert_relative_eq!(actor.effective_radius(&geometry), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_material_override() {
        let mut actor = Actor::new_static("box", cube_model("box", 0, false));
        assert!(!actor.is_translucent());
        let glass = Arc::new(
            MaterialInstance::new("glass", Arc::new(Material::new(9, "glass"))).with_blend_mode(BlendMode::Translucent),
        );
        actor.set_material_override(0, Some(glass));
        assert!(actor.is_translucent());
        assert_eq!(actor.material_instance(0).unwrap().material_id(), 9);
        actor.set_material_override(0, None);
        assert_eq!(actor.material_instance(0).unwrap().material_id(), 0);
    }

    #[test]
    fn test_skeleton_actor_advances_and_wraps() {
        let mut actor = Actor::new_skeleton("walker", skinned_model());
        assert!(actor.is_skeletal());
        actor.update(0.5);
        let state = actor.skeleton_state().unwrap();
        assert_relative_eq!(state.animation_time(), 0.5);
        let root = actor.animation_buffer().unwrap().transforms()[0];
        assert_relative_eq!(root[(0, 3)], 0.5, epsilon = 1e-6);
        assert_relative_eq!(actor.animation_buffer().unwrap().prev_transforms()[0][(0, 3)], 0.0);

        actor.update(2.0);
        assert_relative_eq!(actor.skeleton_state().unwrap().animation_time(), 0.5, epsilon = 1e-6);
        assert!(!actor.set_animation_index(3));
        assert!(actor.set_animation_index(0));
        assert_relative_eq!(actor.skeleton_state().unwrap().animation_time(), 0.0);
    }

    #[test]
    fn test_save_data_round_trip() {
        let model = skinned_model();
        let mut actor = Actor::new_skeleton("walker", Arc::clone(&model));
        actor.transform.set_pos(Vec3::new(1.0, 2.0, 3.0));
        let data = actor.save_data();
        assert_eq!(data.model, "walker");

        let restored = Actor::from_save_data(&data, model);
        assert!(restored.is_skeletal());
        assert_eq!(restored.name(), "walker");
        assert_relative_eq!(restored.transform.get_pos(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(restored.transform.matrix()[(1, 3)], 2.0);
    }
}
