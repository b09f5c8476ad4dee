//! Scene Manager
//!
//! Owns every object of the open scene: cameras, the main light, point
//! lights, light probes, environment objects and actors. Each frame
//! [`SceneManager::update_scene`] advances them and rebuilds the render
//! queues by running the culling predicates against the main camera and
//! main light.
//!
//! Lifecycle: `Empty` → `Populated` (new or open) → `Playing` ↔ `Paused`,
//! and back to `Empty` on clear.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::actor::Actor;
use super::scene_data::{
    ActorSaveData, AtmosphereSaveData, CameraSaveData, EffectSaveData, LightProbeSaveData, MainLightSaveData,
    OceanSaveData, PointLightSaveData, SceneSaveData, TransformSaveData,
};
use crate::assets::ResourceManager;
use crate::core::RenderConfig;
use crate::foundation::collections::{TypedHandle, TypedHandleMap};
use crate::foundation::math::Vec3;
use crate::render::render_info::{
    always_pass, cull_point_lights, gather_render_infos, shadow_culling, sort_render_infos,
    view_frustum_culling_geometry, PointLightInfo, RenderInfo,
};
use crate::render::{Atmosphere, Camera, LightProbe, MainLight, Model, Ocean, PointLight};

/// Handle of an actor registered in a scene
pub type ActorHandle = TypedHandle<Actor>;

/// Distance in front of the camera where `add_object_here` places actors
const PLACE_DISTANCE: f32 = 10.0;

/// Distance kept from an object focused by `set_object_focus`
const FOCUS_DISTANCE: f32 = 2.0;

/// Scene lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneState {
    /// Nothing loaded
    #[default]
    Empty,
    /// Loaded, not started
    Populated,
    /// Simulation advancing
    Playing,
    /// Simulation frozen, queues still rebuilt
    Paused,
}

/// Kind of a registered object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Camera
    Camera,
    /// Main directional light
    MainLight,
    /// Point light
    PointLight,
    /// Light probe
    LightProbe,
    /// Sky
    Atmosphere,
    /// Ocean
    Ocean,
    /// Actor without bones
    StaticActor,
    /// Skinned actor
    SkeletonActor,
    /// Effect placement
    Effect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectRef {
    Camera,
    MainLight,
    PointLight,
    LightProbe,
    Atmosphere,
    Ocean,
    Actor(ActorHandle),
    Effect,
}

/// Borrowed view of a registered object
#[derive(Debug, Clone, Copy)]
pub enum SceneObject<'a> {
    /// Camera
    Camera(&'a Camera),
    /// Main directional light
    MainLight(&'a MainLight),
    /// Point light
    PointLight(&'a PointLight),
    /// Light probe
    LightProbe(&'a LightProbe),
    /// Sky
    Atmosphere(&'a Atmosphere),
    /// Ocean
    Ocean(&'a Ocean),
    /// Static or skeletal actor
    Actor(&'a Actor),
    /// Effect placement
    Effect(&'a EffectSaveData),
}

impl SceneObject<'_> {
    /// World position, when the object has one
    pub fn position(&self) -> Option<Vec3> {
        match self {
            Self::Camera(camera) => Some(camera.transform.get_pos()),
            Self::MainLight(light) => Some(light.transform.get_pos()),
            Self::PointLight(light) => Some(light.transform.get_pos()),
            Self::LightProbe(probe) => Some(probe.transform.get_pos()),
            Self::Ocean(ocean) => Some(ocean.transform.get_pos()),
            Self::Actor(actor) => Some(actor.transform.get_pos()),
            Self::Effect(effect) => Some(Vec3::from(effect.transform.pos)),
            Self::Atmosphere(_) => None,
        }
    }
}

/// Scene errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// No object with this name
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// The main camera, light and probe cannot be deleted
    #[error("Object is protected: {0}")]
    ProtectedObject(String),

    /// A lifecycle transition that is not allowed from the current state
    #[error("Cannot {action} a scene in state {state:?}")]
    InvalidTransition {
        /// Requested action
        action: &'static str,
        /// State at the time of the request
        state: SceneState,
    },
}

/// Receives scene notifications
pub trait SceneListener {
    /// An object was registered
    fn object_added(&mut self, _name: &str, _kind: ObjectKind) {}

    /// An object was removed
    fn object_deleted(&mut self, _name: &str) {}

    /// Every object was torn down
    fn scene_cleared(&mut self) {}
}

/// Per-pass render queues rebuilt by `update_scene`
#[derive(Debug, Clone, Default)]
pub struct RenderQueues {
    /// Opaque static geometry in view
    pub static_solid: Vec<RenderInfo>,
    /// Translucent static geometry in view
    pub static_translucent: Vec<RenderInfo>,
    /// Static geometry inside the shadow volume
    pub static_shadow: Vec<RenderInfo>,
    /// Opaque skinned geometry in view
    pub skeleton_solid: Vec<RenderInfo>,
    /// Translucent skinned geometry in view
    pub skeleton_translucent: Vec<RenderInfo>,
    /// Skinned geometry inside the shadow volume
    pub skeleton_shadow: Vec<RenderInfo>,
    /// Every geometry of the selected actor
    pub selected: Vec<RenderInfo>,
}

impl RenderQueues {
    fn clear(&mut self) {
        self.static_solid.clear();
        self.static_translucent.clear();
        self.static_shadow.clear();
        self.skeleton_solid.clear();
        self.skeleton_translucent.clear();
        self.skeleton_shadow.clear();
        self.selected.clear();
    }

    /// Total number of queued items
    pub fn len(&self) -> usize {
        self.static_solid.len()
            + self.static_translucent.len()
            + self.static_shadow.len()
            + self.skeleton_solid.len()
            + self.skeleton_translucent.len()
            + self.skeleton_shadow.len()
            + self.selected.len()
    }

    /// Whether every queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registry of every object in the open scene
pub struct SceneManager {
    state: SceneState,
    current_scene_name: String,
    max_point_lights: usize,

    cameras: Vec<Camera>,
    main_light: Option<MainLight>,
    point_lights: Vec<PointLight>,
    light_probes: Vec<LightProbe>,
    atmosphere: Option<Atmosphere>,
    ocean: Option<Ocean>,
    actors: TypedHandleMap<Actor>,
    static_actors: Vec<ActorHandle>,
    skeleton_actors: Vec<ActorHandle>,
    effects: Vec<EffectSaveData>,

    object_map: HashMap<String, ObjectRef>,
    selected_object: Option<String>,
    listeners: Vec<Box<dyn SceneListener>>,

    render_queues: RenderQueues,
    point_light_infos: Vec<PointLightInfo>,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

impl SceneManager {
    /// Create an empty scene manager
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            state: SceneState::Empty,
            current_scene_name: String::new(),
            max_point_lights: config.max_point_lights,
            cameras: Vec::new(),
            main_light: None,
            point_lights: Vec::new(),
            light_probes: Vec::new(),
            atmosphere: None,
            ocean: None,
            actors: TypedHandleMap::new(),
            static_actors: Vec::new(),
            skeleton_actors: Vec::new(),
            effects: Vec::new(),
            object_map: HashMap::new(),
            selected_object: None,
            listeners: Vec::new(),
            render_queues: RenderQueues::default(),
            point_light_infos: Vec::new(),
        }
    }

    /// Register a notification receiver
    pub fn add_listener(&mut self, listener: Box<dyn SceneListener>) {
        self.listeners.push(listener);
    }

    /// Lifecycle state
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Start or resume the simulation
    pub fn play(&mut self) -> Result<(), SceneError> {
        match self.state {
            SceneState::Populated | SceneState::Paused | SceneState::Playing => {
                self.state = SceneState::Playing;
                Ok(())
            }
            SceneState::Empty => Err(SceneError::InvalidTransition {
                action: "play",
                state: self.state,
            }),
        }
    }

    /// Freeze the simulation
    pub fn pause(&mut self) -> Result<(), SceneError> {
        match self.state {
            SceneState::Playing | SceneState::Paused => {
                self.state = SceneState::Paused;
                Ok(())
            }
            state => Err(SceneError::InvalidTransition { action: "pause", state }),
        }
    }

    /// Name of the open scene
    pub fn current_scene_name(&self) -> &str {
        &self.current_scene_name
    }

    /// Rename the open scene
    pub fn set_current_scene_name(&mut self, name: impl Into<String>) {
        self.current_scene_name = name.into();
    }

    /// Tear down every object and return to `Empty`
    pub fn clear_scene(&mut self) {
        for listener in &mut self.listeners {
            listener.scene_cleared();
        }
        self.cameras.clear();
        self.main_light = None;
        self.point_lights.clear();
        self.light_probes.clear();
        self.atmosphere = None;
        self.ocean = None;
        self.actors.clear();
        self.static_actors.clear();
        self.skeleton_actors.clear();
        self.effects.clear();
        self.object_map.clear();
        self.selected_object = None;
        self.render_queues.clear();
        self.point_light_infos.clear();
        self.state = SceneState::Empty;
        log::info!("Clear scene : {}", self.current_scene_name);
    }

    /// Replace the scene with the default camera, main light, probe,
    /// atmosphere and ocean
    pub fn new_scene(&mut self) {
        self.clear_scene();
        self.add_camera(CameraSaveData::default());
        self.add_main_light(MainLightSaveData::default());
        self.add_light_probe(LightProbeSaveData::default());
        self.add_atmosphere(AtmosphereSaveData::default());
        self.add_ocean(OceanSaveData::default());
        self.current_scene_name = "new_scene".to_string();
        self.state = SceneState::Populated;
        log::info!("New scene : {}", self.current_scene_name);
    }

    /// Replace the scene with saved data; actors whose model is unknown are skipped
    pub fn open_scene(&mut self, name: impl Into<String>, data: &SceneSaveData, resources: &ResourceManager) {
        self.clear_scene();
        self.current_scene_name = name.into();
        log::info!("Open scene : {}", self.current_scene_name);

        if data.cameras.is_empty() {
            self.add_camera(CameraSaveData::default());
        }
        for camera in &data.cameras {
            self.add_camera(camera.clone());
        }
        self.add_main_light(data.main_light.clone());
        for light in &data.lights {
            self.add_light(light.clone());
        }
        if data.light_probes.is_empty() {
            self.add_light_probe(LightProbeSaveData::default());
        }
        for probe in &data.light_probes {
            self.add_light_probe(probe.clone());
        }
        self.add_atmosphere(data.atmosphere.clone());
        self.add_ocean(data.ocean.clone());

        for actor_data in data.static_actors.iter().chain(&data.skeleton_actors) {
            match resources.get_model(&actor_data.model) {
                Some(model) => {
                    self.add_object(model, actor_data.clone());
                }
                None => log::warn!(
                    "Skip {}: model {} is not loaded",
                    actor_data.name,
                    actor_data.model
                ),
            }
        }
        for effect in &data.effects {
            self.add_effect(effect.clone());
        }
        self.state = SceneState::Populated;
    }

    /// Capture the whole scene
    pub fn save_data(&self) -> SceneSaveData {
        let actor_data = |handles: &[ActorHandle]| -> Vec<ActorSaveData> {
            handles
                .iter()
                .filter_map(|handle| self.actors.get(*handle))
                .map(Actor::save_data)
                .collect()
        };
        SceneSaveData {
            cameras: self.cameras.iter().map(Camera::save_data).collect(),
            main_light: self
                .main_light
                .as_ref()
                .map(MainLight::save_data)
                .unwrap_or_default(),
            lights: self.point_lights.iter().map(PointLight::save_data).collect(),
            light_probes: self.light_probes.iter().map(LightProbe::save_data).collect(),
            atmosphere: self
                .atmosphere
                .as_ref()
                .map(Atmosphere::save_data)
                .unwrap_or_default(),
            ocean: self.ocean.as_ref().map(Ocean::save_data).unwrap_or_default(),
            static_actors: actor_data(&self.static_actors),
            skeleton_actors: actor_data(&self.skeleton_actors),
            effects: self.effects.clone(),
        }
    }

    /// `name` if unused, else the first free `name_N`
    pub fn generate_object_name(&self, name: &str) -> String {
        if !self.object_map.contains_key(name) {
            return name.to_string();
        }
        (0..)
            .map(|index| format!("{name}_{index}"))
            .find(|candidate| !self.object_map.contains_key(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    fn unique_name(&self, requested: &str, fallback: &str) -> String {
        let name = if requested.is_empty() { fallback } else { requested };
        self.generate_object_name(name)
    }

    fn regist_object(&mut self, name: &str, object: ObjectRef, kind: ObjectKind) {
        self.object_map.insert(name.to_string(), object);
        log::info!("add {kind:?} : {name}");
        for listener in &mut self.listeners {
            listener.object_added(name, kind);
        }
    }

    /// Add a camera; the first camera is the main camera
    pub fn add_camera(&mut self, mut data: CameraSaveData) -> String {
        data.name = self.unique_name(&data.name, "camera");
        let camera = Camera::from_save_data(&data);
        self.cameras.push(camera);
        self.regist_object(&data.name, ObjectRef::Camera, ObjectKind::Camera);
        data.name
    }

    /// Set the main light, replacing any previous one
    pub fn add_main_light(&mut self, mut data: MainLightSaveData) -> String {
        if let Some(previous) = self.main_light.take() {
            self.unregist_object(&previous.name);
        }
        data.name = self.unique_name(&data.name, "main_light");
        self.main_light = Some(MainLight::from_save_data(&data));
        self.regist_object(&data.name, ObjectRef::MainLight, ObjectKind::MainLight);
        data.name
    }

    /// Add a point light
    pub fn add_light(&mut self, mut data: PointLightSaveData) -> String {
        data.name = self.unique_name(&data.name, "light");
        self.point_lights.push(PointLight::from_save_data(&data));
        self.regist_object(&data.name, ObjectRef::PointLight, ObjectKind::PointLight);
        data.name
    }

    /// Add a light probe; the first probe is the main probe
    pub fn add_light_probe(&mut self, mut data: LightProbeSaveData) -> String {
        data.name = self.unique_name(&data.name, "light_probe");
        self.light_probes.push(LightProbe::from_save_data(&data));
        self.regist_object(&data.name, ObjectRef::LightProbe, ObjectKind::LightProbe);
        data.name
    }

    /// Set the atmosphere, replacing any previous one
    pub fn add_atmosphere(&mut self, mut data: AtmosphereSaveData) -> String {
        if let Some(previous) = self.atmosphere.take() {
            self.unregist_object(&previous.name);
        }
        data.name = self.unique_name(&data.name, "atmosphere");
        self.atmosphere = Some(Atmosphere::from_save_data(&data));
        self.regist_object(&data.name, ObjectRef::Atmosphere, ObjectKind::Atmosphere);
        data.name
    }

    /// Set the ocean, replacing any previous one
    pub fn add_ocean(&mut self, mut data: OceanSaveData) -> String {
        if let Some(previous) = self.ocean.take() {
            self.unregist_object(&previous.name);
        }
        data.name = self.unique_name(&data.name, "ocean");
        self.ocean = Some(Ocean::from_save_data(&data));
        self.regist_object(&data.name, ObjectRef::Ocean, ObjectKind::Ocean);
        data.name
    }

    /// Store an effect placement
    pub fn add_effect(&mut self, mut data: EffectSaveData) -> String {
        data.name = self.unique_name(&data.name, "effect");
        let name = data.name.clone();
        self.effects.push(data);
        self.regist_object(&name, ObjectRef::Effect, ObjectKind::Effect);
        name
    }

    /// Add an actor for `model`; skeletal when the mesh has bones
    pub fn add_object(&mut self, model: Arc<Model>, mut data: ActorSaveData) -> ActorHandle {
        data.name = self.unique_name(&data.name, model.name());
        data.model = model.name().to_string();
        let actor = Actor::from_save_data(&data, model);
        let skeletal = actor.is_skeletal();
        let handle = self.actors.insert(actor);
        let kind = if skeletal {
            self.skeleton_actors.push(handle);
            ObjectKind::SkeletonActor
        } else {
            self.static_actors.push(handle);
            ObjectKind::StaticActor
        };
        self.regist_object(&data.name, ObjectRef::Actor(handle), kind);
        handle
    }

    /// Add an actor in front of the main camera
    pub fn add_object_here(&mut self, model: Arc<Model>) -> ActorHandle {
        let pos = self
            .main_camera()
            .map_or_else(Vec3::zeros, |camera| camera.position() - camera.transform.front() * PLACE_DISTANCE);
        let data = ActorSaveData {
            transform: TransformSaveData {
                pos: pos.into(),
                ..Default::default()
            },
            ..Default::default()
        };
        self.add_object(model, data)
    }

    fn is_protected(&self, name: &str) -> bool {
        self.cameras.first().is_some_and(|camera| camera.name == name)
            || self.main_light.as_ref().is_some_and(|light| light.name == name)
            || self.light_probes.first().is_some_and(|probe| probe.name == name)
    }

    fn unregist_object(&mut self, name: &str) -> Option<ObjectRef> {
        let object = self.object_map.remove(name)?;
        match object {
            ObjectRef::Camera => self.cameras.retain(|camera| camera.name != name),
            ObjectRef::PointLight => self.point_lights.retain(|light| light.name != name),
            ObjectRef::LightProbe => self.light_probes.retain(|probe| probe.name != name),
            ObjectRef::Effect => self.effects.retain(|effect| effect.name != name),
            ObjectRef::Actor(handle) => {
                self.actors.remove(handle);
                self.static_actors.retain(|h| *h != handle);
                self.skeleton_actors.retain(|h| *h != handle);
            }
            ObjectRef::MainLight | ObjectRef::Atmosphere | ObjectRef::Ocean => {}
        }
        if self.selected_object.as_deref() == Some(name) {
            self.selected_object = None;
        }
        log::info!("delete object : {name}");
        for listener in &mut self.listeners {
            listener.object_deleted(name);
        }
        Some(object)
    }

    /// Remove an object; the main camera, light and probe are protected
    pub fn delete_object(&mut self, name: &str) -> Result<(), SceneError> {
        if !self.object_map.contains_key(name) {
            return Err(SceneError::ObjectNotFound(name.to_string()));
        }
        if self.is_protected(name) {
            return Err(SceneError::ProtectedObject(name.to_string()));
        }
        match self.object_map.get(name) {
            Some(ObjectRef::Atmosphere) => self.atmosphere = None,
            Some(ObjectRef::Ocean) => self.ocean = None,
            _ => {}
        }
        self.unregist_object(name);
        Ok(())
    }

    /// Delete every object that is not protected
    pub fn clear_actors(&mut self) {
        let names: Vec<String> = self.object_map.keys().cloned().collect();
        for name in names {
            if !self.is_protected(&name) {
                let _ = self.delete_object(&name);
            }
        }
    }

    /// Look up any object by name
    pub fn get_object(&self, name: &str) -> Option<SceneObject<'_>> {
        let object = match self.object_map.get(name)? {
            ObjectRef::Camera => SceneObject::Camera(self.cameras.iter().find(|c| c.name == name)?),
            ObjectRef::MainLight => SceneObject::MainLight(self.main_light.as_ref()?),
            ObjectRef::PointLight => SceneObject::PointLight(self.point_lights.iter().find(|l| l.name == name)?),
            ObjectRef::LightProbe => SceneObject::LightProbe(self.light_probes.iter().find(|p| p.name == name)?),
            ObjectRef::Atmosphere => SceneObject::Atmosphere(self.atmosphere.as_ref()?),
            ObjectRef::Ocean => SceneObject::Ocean(self.ocean.as_ref()?),
            ObjectRef::Actor(handle) => SceneObject::Actor(self.actors.get(*handle)?),
            ObjectRef::Effect => SceneObject::Effect(self.effects.iter().find(|e| e.name == name)?),
        };
        Some(object)
    }

    /// Kind of a registered object
    pub fn object_kind(&self, name: &str) -> Option<ObjectKind> {
        let kind = match self.object_map.get(name)? {
            ObjectRef::Camera => ObjectKind::Camera,
            ObjectRef::MainLight => ObjectKind::MainLight,
            ObjectRef::PointLight => ObjectKind::PointLight,
            ObjectRef::LightProbe => ObjectKind::LightProbe,
            ObjectRef::Atmosphere => ObjectKind::Atmosphere,
            ObjectRef::Ocean => ObjectKind::Ocean,
            ObjectRef::Effect => ObjectKind::Effect,
            ObjectRef::Actor(handle) => {
                if self.actors.get(*handle)?.is_skeletal() {
                    ObjectKind::SkeletonActor
                } else {
                    ObjectKind::StaticActor
                }
            }
        };
        Some(kind)
    }

    /// Sorted names of every registered object
    pub fn object_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.object_map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Handle of the actor called `name`
    pub fn actor_handle(&self, name: &str) -> Option<ActorHandle> {
        match self.object_map.get(name)? {
            ObjectRef::Actor(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Actor by handle
    pub fn actor(&self, handle: ActorHandle) -> Option<&Actor> {
        self.actors.get(handle)
    }

    /// Mutable actor by handle
    pub fn actor_mut(&mut self, handle: ActorHandle) -> Option<&mut Actor> {
        self.actors.get_mut(handle)
    }

    /// Every actor with its handle
    pub fn actors(&self) -> impl Iterator<Item = (ActorHandle, &Actor)> {
        self.actors.iter()
    }

    /// Number of actors
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Select an object by name, or clear the selection with `None`
    pub fn set_selected_object(&mut self, name: Option<&str>) {
        let name = name.filter(|name| self.object_map.contains_key(*name));
        if self.selected_object.as_deref() == name {
            return;
        }
        if let Some(handle) = self.selected_object.as_deref().and_then(|prev| self.actor_handle(prev)) {
            if let Some(actor) = self.actors.get_mut(handle) {
                actor.set_selected(false);
            }
        }
        self.selected_object = name.map(str::to_string);
        if let Some(handle) = name.and_then(|name| self.actor_handle(name)) {
            if let Some(actor) = self.actors.get_mut(handle) {
                actor.set_selected(true);
            }
        }
    }

    /// Name of the selected object
    pub fn selected_object(&self) -> Option<&str> {
        self.selected_object.as_deref()
    }

    /// Move the main camera so that `name` sits just in front of it
    pub fn set_object_focus(&mut self, name: &str) {
        let is_main_camera = self.cameras.first().is_some_and(|camera| camera.name == name);
        if is_main_camera {
            return;
        }
        let Some(target) = self.get_object(name).and_then(|object| object.position()) else {
            return;
        };
        if let Some(camera) = self.cameras.first_mut() {
            let front = camera.transform.front();
            camera.transform.set_pos(target + front * FOCUS_DISTANCE);
        }
    }

    /// Main camera
    pub fn main_camera(&self) -> Option<&Camera> {
        self.cameras.first()
    }

    /// Mutable main camera
    pub fn main_camera_mut(&mut self) -> Option<&mut Camera> {
        self.cameras.first_mut()
    }

    /// Every camera
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Main directional light
    pub fn main_light(&self) -> Option<&MainLight> {
        self.main_light.as_ref()
    }

    /// Mutable main light
    pub fn main_light_mut(&mut self) -> Option<&mut MainLight> {
        self.main_light.as_mut()
    }

    /// Point lights
    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    /// Main light probe
    pub fn main_light_probe(&self) -> Option<&LightProbe> {
        self.light_probes.first()
    }

    /// Sky
    pub fn atmosphere(&self) -> Option<&Atmosphere> {
        self.atmosphere.as_ref()
    }

    /// Ocean
    pub fn ocean(&self) -> Option<&Ocean> {
        self.ocean.as_ref()
    }

    /// Forward projection changes to every camera
    pub fn update_camera_projection(&mut self, fov: Option<f32>, aspect: Option<f32>) {
        for camera in &mut self.cameras {
            camera.update_projection(fov, aspect, false);
        }
    }

    /// Advance every object by `delta` seconds and rebuild the render queues
    pub fn update_scene(&mut self, delta: f32) {
        if self.state == SceneState::Empty {
            self.render_queues.clear();
            self.point_light_infos.clear();
            return;
        }
        let delta = if self.state == SceneState::Paused { 0.0 } else { delta };

        for camera in &mut self.cameras {
            camera.update(false);
        }
        let camera_pos = self.main_camera().map_or_else(Vec3::zeros, Camera::position);
        if let Some(light) = &mut self.main_light {
            light.update(camera_pos);
        }
        for light in &mut self.point_lights {
            light.update();
        }
        for (_, actor) in self.actors.iter_mut() {
            actor.update(delta);
        }
        if let Some(ocean) = &mut self.ocean {
            ocean.update(delta);
        }

        self.update_render_infos();
    }

    fn update_render_infos(&mut self) {
        self.render_queues.clear();
        self.point_light_infos.clear();
        let (Some(camera), Some(light)) = (self.cameras.first(), self.main_light.as_ref()) else {
            return;
        };
        let queues = &mut self.render_queues;
        let actors = &self.actors;
        let listed = |handles: &[ActorHandle]| -> Vec<(ActorHandle, &Actor)> {
            handles
                .iter()
                .filter_map(|handle| actors.get(*handle).map(|actor| (*handle, actor)))
                .collect()
        };

        let static_actors = listed(&self.static_actors);
        gather_render_infos(
            view_frustum_culling_geometry,
            camera,
            light,
            static_actors.iter().copied(),
            &mut queues.static_solid,
            Some(&mut queues.static_translucent),
        );
        gather_render_infos(
            shadow_culling,
            camera,
            light,
            static_actors.iter().copied(),
            &mut queues.static_shadow,
            None,
        );

        let skeleton_actors = listed(&self.skeleton_actors);
        gather_render_infos(
            view_frustum_culling_geometry,
            camera,
            light,
            skeleton_actors.iter().copied(),
            &mut queues.skeleton_solid,
            Some(&mut queues.skeleton_translucent),
        );
        gather_render_infos(
            shadow_culling,
            camera,
            light,
            skeleton_actors.iter().copied(),
            &mut queues.skeleton_shadow,
            None,
        );

        sort_render_infos(&mut queues.static_solid);
        sort_render_infos(&mut queues.static_translucent);
        sort_render_infos(&mut queues.skeleton_solid);
        sort_render_infos(&mut queues.skeleton_translucent);

        self.point_light_infos = cull_point_lights(camera, &self.point_lights, self.max_point_lights);

        if let Some(handle) = self.selected_object.as_deref().and_then(|name| match self.object_map.get(name) {
            Some(ObjectRef::Actor(handle)) => Some(*handle),
            _ => None,
        }) {
            let mut translucent = Vec::new();
            gather_render_infos(
                always_pass,
                camera,
                light,
                listed(&[handle]),
                &mut queues.selected,
                Some(&mut translucent),
            );
            queues.selected.append(&mut translucent);
        }
    }

    /// Queues built by the last `update_scene`
    pub fn render_queues(&self) -> &RenderQueues {
        &self.render_queues
    }

    /// Point lights that passed culling in the last update
    pub fn point_light_infos(&self) -> &[PointLightInfo] {
        &self.point_light_infos
    }

    /// Number of point lights submitted this frame
    pub fn point_light_count(&self) -> usize {
        self.point_light_infos.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::actor::tests::{cube_model, skinned_model};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl SceneListener for Recorder {
        fn object_added(&mut self, name: &str, _kind: ObjectKind) {
            self.0.borrow_mut().push(format!("+{name}"));
        }

        fn object_deleted(&mut self, name: &str) {
            self.0.borrow_mut().push(format!("-{name}"));
        }

        fn scene_cleared(&mut self) {
            self.0.borrow_mut().push("clear".to_string());
        }
    }

    fn scene() -> SceneManager {
        let mut scene = SceneManager::default();
        scene.new_scene();
        scene
    }

    #[test]
    fn test_new_scene_defaults() {
        let scene = scene();
        assert_eq!(scene.state(), SceneState::Populated);
        assert_eq!(scene.current_scene_name(), "new_scene");
        assert_eq!(
            scene.object_names(),
            vec!["atmosphere", "camera", "light_probe", "main_light", "ocean"]
        );
        assert!(scene.main_camera().is_some());
        assert!(scene.main_light().is_some());
    }

    #[test]
    fn test_state_transitions() {
        let mut scene = SceneManager::default();
        assert!(matches!(scene.play(), Err(SceneError::InvalidTransition { .. })));
        assert!(scene.pause().is_err());
        scene.new_scene();
        assert!(scene.pause().is_err());
        scene.play().unwrap();
        scene.pause().unwrap();
        assert_eq!(scene.state(), SceneState::Paused);
        scene.play().unwrap();
        scene.clear_scene();
        assert_eq!(scene.state(), SceneState::Empty);
        scene.update_scene(0.1);
        assert!(scene.render_queues().is_empty());
    }

    #[test]
    fn test_generate_object_name() {
        let mut scene = scene();
        assert_eq!(scene.generate_object_name("box"), "box");
        let model = cube_model("box", 0, false);
        scene.add_object(Arc::clone(&model), ActorSaveData::default());
        scene.add_object(Arc::clone(&model), ActorSaveData::default());
        scene.add_object(model, ActorSaveData::default());
        assert!(scene.actor_handle("box").is_some());
        assert!(scene.actor_handle("box_0").is_some());
        assert!(scene.actor_handle("box_1").is_some());
        assert_eq!(scene.generate_object_name("box"), "box_2");
    }

    #[test]
    fn test_add_object_picks_variant() {
        let mut scene = scene();
        scene.add_object(cube_model("box", 0, false), ActorSaveData::default());
        scene.add_object(skinned_model(), ActorSaveData::default());
        assert_eq!(scene.object_kind("box"), Some(ObjectKind::StaticActor));
        assert_eq!(scene.object_kind("walker"), Some(ObjectKind::SkeletonActor));
        let data = scene.save_data();
        assert_eq!(data.static_actors.len(), 1);
        assert_eq!(data.skeleton_actors.len(), 1);
    }

    #[test]
    fn test_delete_protects_main_objects() {
        let mut scene = scene();
        let recorder = Recorder::default();
        scene.add_listener(Box::new(recorder.clone()));

        assert_eq!(
            scene.delete_object("camera"),
            Err(SceneError::ProtectedObject("camera".to_string()))
        );
        assert!(scene.delete_object("main_light").is_err());
        assert!(matches!(scene.delete_object("nothing"), Err(SceneError::ObjectNotFound(_))));

        let second = scene.add_camera(CameraSaveData::default());
        assert_eq!(second, "camera_0");
        scene.delete_object("camera_0").unwrap();
        assert_eq!(scene.cameras().len(), 1);
        assert_eq!(*recorder.0.borrow(), vec!["+camera_0".to_string(), "-camera_0".to_string()]);
    }

    #[test]
    fn test_clear_actors_keeps_protected() {
        let mut scene = scene();
        scene.add_object(cube_model("box", 0, false), ActorSaveData::default());
        scene.add_light(PointLightSaveData::default());
        scene.clear_actors();
        assert_eq!(scene.object_names(), vec!["camera", "light_probe", "main_light"]);
        assert_eq!(scene.actor_count(), 0);
    }

    #[test]
    fn test_update_builds_queues() {
        let mut scene = scene();
        let handle = scene.add_object_here(cube_model("box", 0, false));
        scene.add_object_here(cube_model("glass", 1, true));
        let behind = scene.add_object(cube_model("behind", 2, false), ActorSaveData {
            transform: TransformSaveData {
                pos: [0.0, 0.0, 100.0],
                ..Default::default()
            },
            ..Default::default()
        });
        scene.add_object_here(skinned_model());

        scene.update_scene(0.016);
        let queues = scene.render_queues();
        assert_eq!(queues.static_solid.len(), 1);
        assert_eq!(queues.static_solid[0].actor, handle);
        assert_eq!(queues.static_translucent.len(), 1);
        assert_eq!(queues.skeleton_solid.len(), 1);
        assert!(queues.static_solid.iter().all(|info| info.actor != behind));
        assert!(queues.selected.is_empty());

        scene.set_selected_object(Some("glass"));
        scene.update_scene(0.016);
        assert_eq!(scene.render_queues().selected.len(), 1);
        assert!(scene.render_queues().selected[0].is_translucent());
        scene.delete_object("glass").unwrap();
        assert_eq!(scene.selected_object(), None);
    }

    #[test]
    fn test_selection_flags_actor() {
        let mut scene = scene();
        let a = scene.add_object(cube_model("a", 0, false), ActorSaveData::default());
        let b = scene.add_object(cube_model("b", 1, false), ActorSaveData::default());
        scene.set_selected_object(Some("a"));
        assert!(scene.actor(a).unwrap().is_selected());
        scene.set_selected_object(Some("b"));
        assert!(!scene.actor(a).unwrap().is_selected());
        assert!(scene.actor(b).unwrap().is_selected());
        scene.set_selected_object(None);
        assert!(!scene.actor(b).unwrap().is_selected());
        assert_eq!(scene.selected_object(), None);
    }

    #[test]
    fn test_point_lights_capped() {
        let mut scene = SceneManager::new(&RenderConfig {
            max_point_lights: 2,
            ..RenderConfig::default()
        });
        scene.new_scene();
        for z in [-5.0, -10.0, -15.0] {
            scene.add_light(PointLightSaveData {
                transform: TransformSaveData {
                    pos: [0.0, 0.0, z],
                    ..Default::default()
                },
                ..Default::default()
            });
        }
        scene.update_scene(0.0);
        assert_eq!(scene.point_light_count(), 2);
    }

    #[test]
    fn test_focus_moves_main_camera() {
        let mut scene = scene();
        scene.add_object(cube_model("box", 0, false), ActorSaveData {
            transform: TransformSaveData {
                pos: [4.0, 0.0, 0.0],
                ..Default::default()
            },
            ..Default::default()
        });
        scene.set_object_focus("box");
        let camera = scene.main_camera().unwrap();
        let expected = Vec3::new(4.0, 0.0, 0.0) + camera.transform.front() * FOCUS_DISTANCE;
        assert_eq!(camera.transform.get_pos(), expected);
    }

    #[test]
    fn test_open_scene_restores_objects() {
        let mut resources = ResourceManager::new();
        resources.register_model(cube_model("box", 0, false));

        let mut original = scene();
        original.add_object(resources.get_model("box").unwrap(), ActorSaveData::default());
        original.add_light(PointLightSaveData::default());
        original.add_object(cube_model("orphan", 1, false), ActorSaveData::default());
        let data = original.save_data();

        let recorder = Recorder::default();
        let mut reopened = SceneManager::default();
        reopened.add_listener(Box::new(recorder.clone()));
        reopened.open_scene("level", &data, &resources);
        assert_eq!(reopened.current_scene_name(), "level");
        assert_eq!(reopened.state(), SceneState::Populated);
        assert!(reopened.actor_handle("box").is_some());
        assert!(reopened.actor_handle("orphan").is_none());
        assert_eq!(reopened.point_lights().len(), 1);
        assert_eq!(recorder.0.borrow()[0], "clear");
    }
}
