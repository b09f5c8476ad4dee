//! Resource Manager
//!
//! CPU-side registry of every loaded asset. Mesh files are read through the
//! OBJ or COLLADA loader, converted into shared [`Mesh`], [`Skeleton`],
//! [`Animation`] and [`Model`] values and stored by name. The scene only
//! ever holds `Arc`s handed out from here, so assets stay immutable once
//! loaded.
//!
//! Lookups of names that were never loaded return `None` and log a warning.
//! A file that fails to parse is rejected as a whole and logged with its
//! path.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::collada::Collada;
use super::mesh_data::MeshData;
use super::obj_loader::ObjLoader;
use super::AssetError;
use crate::animation::{Animation, Skeleton};
use crate::render::{BlendMode, Geometry, Material, MaterialInstance, Mesh, Model};

/// Name of the material every model falls back to
pub const DEFAULT_MATERIAL_NAME: &str = "default";

/// Resource loading options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceConfig {
    /// Uniform scale applied to OBJ positions
    pub obj_scale: f32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self { obj_scale: 1.0 }
    }
}

/// Registry of loaded meshes, skeletons, animations, materials and models
#[derive(Debug)]
pub struct ResourceManager {
    config: ResourceConfig,
    next_geometry_id: usize,
    next_material_id: usize,
    materials: HashMap<String, Arc<Material>>,
    material_instances: HashMap<String, Arc<MaterialInstance>>,
    default_material_instance: Arc<MaterialInstance>,
    meshes: HashMap<String, Arc<Mesh>>,
    skeletons: HashMap<String, Arc<Skeleton>>,
    animations: HashMap<String, Arc<Animation>>,
    models: HashMap<String, Arc<Model>>,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    /// Create a manager holding only the default material
    pub fn new() -> Self {
        Self::with_config(ResourceConfig::default())
    }

    /// Create a manager with custom loading options
    pub fn with_config(config: ResourceConfig) -> Self {
        let material = Arc::new(Material::new(0, DEFAULT_MATERIAL_NAME));
        let instance = Arc::new(MaterialInstance::new(DEFAULT_MATERIAL_NAME, Arc::clone(&material)));
        Self {
            config,
            next_geometry_id: 0,
            next_material_id: 1,
            materials: HashMap::from([(DEFAULT_MATERIAL_NAME.to_string(), material)]),
            material_instances: HashMap::from([(DEFAULT_MATERIAL_NAME.to_string(), Arc::clone(&instance))]),
            default_material_instance: instance,
            meshes: HashMap::new(),
            skeletons: HashMap::new(),
            animations: HashMap::new(),
            models: HashMap::new(),
        }
    }

    /// Load a `.obj` or `.dae` file and register its model under the file stem
    pub fn load_mesh_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<Model>, AssetError> {
        let path = path.as_ref();
        let result = self.read_mesh_file(path);
        match result {
            Ok(data) => {
                let name = path
                    .file_stem()
                    .map_or_else(|| "mesh".to_string(), |stem| stem.to_string_lossy().into_owned());
                Ok(self.register_mesh_data(&name, data))
            }
            Err(error) => {
                log::error!("Rejected {}: {}", path.display(), error);
                Err(error)
            }
        }
    }

    fn read_mesh_file(&self, path: &Path) -> Result<MeshData, AssetError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "obj" => Ok(ObjLoader::load(path, self.config.obj_scale)?),
            "dae" => Ok(Collada::load(path)?.get_mesh_data()),
            _ => Err(AssetError::UnknownExtension(path.display().to_string())),
        }
    }

    /// Load every mesh file directly inside `dir`; rejected files are skipped
    pub fn load_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<Vec<Arc<Model>>, AssetError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();
        Ok(paths
            .into_iter()
            .filter_map(|path| self.load_mesh_file(path).ok())
            .collect())
    }

    /// Turn loader output into shared assets and a default model called `name`.
    ///
    /// A skeleton that fails validation is dropped and its geometries stay
    /// static.
    pub fn register_mesh_data(&mut self, name: &str, data: MeshData) -> Arc<Model> {
        let mut skeleton: Option<Arc<Skeleton>> = None;
        for skeleton_data in &data.skeletons {
            match Skeleton::from_data(skeleton_data) {
                Ok(loaded) => {
                    let loaded = Arc::new(loaded);
                    self.skeletons.insert(loaded.name().to_string(), Arc::clone(&loaded));
                    skeleton.get_or_insert(loaded);
                }
                Err(error) => log::warn!("{name}: skeleton {} dropped: {error}", skeleton_data.name),
            }
        }

        let animations: Vec<Arc<Animation>> = data
            .animations
            .iter()
            .map(|animation_data| {
                let target = self.skeletons.get(&animation_data.skeleton_name);
                let animation = Arc::new(Animation::from_data(animation_data, target.map(Arc::as_ref)));
                self.animations
                    .insert(animation.name().to_string(), Arc::clone(&animation));
                animation
            })
            .collect();

        let geometries: Vec<Arc<Geometry>> = data
            .geometries
            .into_iter()
            .map(|mut geometry_data| {
                let known = geometry_data
                    .skeleton_name
                    .as_ref()
                    .is_some_and(|skeleton_name| self.skeletons.contains_key(skeleton_name));
                if geometry_data.skeleton_name.is_some() && !known {
                    log::warn!("{name}: geometry {} kept static, skeleton missing", geometry_data.name);
                    geometry_data.skeleton_name = None;
                    geometry_data.bone_indices.clear();
                    geometry_data.bone_weights.clear();
                }
                let id = self.next_geometry_id;
                self.next_geometry_id += 1;
                Arc::new(Geometry::from_data(id, geometry_data))
            })
            .collect();

        if geometries.is_empty() {
            log::warn!("{name}: no geometry loaded");
        }

        let animations = if skeleton.is_some() { animations } else { Vec::new() };
        let mesh = Arc::new(Mesh::new(name, geometries, skeleton, animations));
        self.meshes.insert(name.to_string(), Arc::clone(&mesh));

        let model = Arc::new(Model::new(name, mesh, Vec::new(), &self.default_material_instance));
        self.register_model(Arc::clone(&model));
        log::info!("Loaded mesh {name}: {} geometries", model.mesh().geometry_count());
        model
    }

    /// Register a model under its own name, replacing any previous one
    pub fn register_model(&mut self, model: Arc<Model>) {
        self.models.insert(model.name().to_string(), model);
    }

    /// Create or fetch a material; ids are unique per manager
    pub fn get_or_create_material(&mut self, name: &str) -> Arc<Material> {
        if let Some(material) = self.materials.get(name) {
            return Arc::clone(material);
        }
        let material = Arc::new(Material::new(self.next_material_id, name));
        self.next_material_id += 1;
        self.materials.insert(name.to_string(), Arc::clone(&material));
        material
    }

    /// Create a material instance of `material_name` and register it under `name`
    pub fn create_material_instance(
        &mut self,
        name: &str,
        material_name: &str,
        blend_mode: BlendMode,
    ) -> Arc<MaterialInstance> {
        let material = self.get_or_create_material(material_name);
        let instance = Arc::new(MaterialInstance::new(name, material).with_blend_mode(blend_mode));
        self.material_instances
            .insert(name.to_string(), Arc::clone(&instance));
        instance
    }

    /// Instance assigned to geometries without a material
    pub fn default_material_instance(&self) -> &Arc<MaterialInstance> {
        &self.default_material_instance
    }

    /// Model by name
    pub fn get_model(&self, name: &str) -> Option<Arc<Model>> {
        let model = self.models.get(name).cloned();
        if model.is_none() {
            log::warn!("Model not found: {name}");
        }
        model
    }

    /// Mesh by name
    pub fn get_mesh(&self, name: &str) -> Option<Arc<Mesh>> {
        let mesh = self.meshes.get(name).cloned();
        if mesh.is_none() {
            log::warn!("Mesh not found: {name}");
        }
        mesh
    }

    /// Skeleton by name
    pub fn get_skeleton(&self, name: &str) -> Option<Arc<Skeleton>> {
        let skeleton = self.skeletons.get(name).cloned();
        if skeleton.is_none() {
            log::warn!("Skeleton not found: {name}");
        }
        skeleton
    }

    /// Animation by name
    pub fn get_animation(&self, name: &str) -> Option<Arc<Animation>> {
        let animation = self.animations.get(name).cloned();
        if animation.is_none() {
            log::warn!("Animation not found: {name}");
        }
        animation
    }

    /// Material instance by name
    pub fn get_material_instance(&self, name: &str) -> Option<Arc<MaterialInstance>> {
        let instance = self.material_instances.get(name).cloned();
        if instance.is_none() {
            log::warn!("Material instance not found: {name}");
        }
        instance
    }

    /// Sorted names of every registered model
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered models
    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const QUAD_OBJ: &str = "o quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";

    #[test]
    fn test_load_obj_file_keyed_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane.obj");
        fs::write(&path, QUAD_OBJ).unwrap();

        let mut resources = ResourceManager::new();
        let model = resources.load_mesh_file(&path).unwrap();
        assert_eq!(model.name(), "plane");
        assert_eq!(model.mesh().geometry_count(), 1);
        assert_eq!(model.mesh().geometries()[0].index_count(), 6);
        assert!(!model.mesh().has_bone());
        assert!(resources.get_model("plane").is_some());
        assert!(resources.get_mesh("plane").is_some());
        assert_eq!(
            model.material_instance(0).unwrap().name,
            DEFAULT_MATERIAL_NAME
        );
    }

    #[test]
    fn test_rejected_files() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("broken.dae");
        fs::write(&bad, "<COLLADA><asset>").unwrap();
        let unknown = dir.path().join("notes.txt");
        fs::write(&unknown, "hello").unwrap();

        let mut resources = ResourceManager::new();
        assert!(matches!(resources.load_mesh_file(&bad), Err(AssetError::Collada(_))));
        assert!(matches!(
            resources.load_mesh_file(&unknown),
            Err(AssetError::UnknownExtension(_))
        ));
        assert!(matches!(
            resources.load_mesh_file(dir.path().join("missing.obj")),
            Err(AssetError::Obj(_))
        ));
        assert_eq!(resources.model_count(), 0);
        assert!(resources.get_model("broken").is_none());
    }

    #[test]
    fn test_load_directory_skips_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.obj"), QUAD_OBJ).unwrap();
        fs::write(dir.path().join("b.obj"), QUAD_OBJ).unwrap();
        fs::write(dir.path().join("c.dae"), "not xml").unwrap();

        let mut resources = ResourceManager::new();
        let models = resources.load_directory(dir.path()).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(resources.model_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_geometry_ids_are_unique() {
        let mut resources = ResourceManager::new();
        let data = ObjLoader::parse(QUAD_OBJ.as_bytes(), "quad", 1.0).unwrap();
        let first = resources.register_mesh_data("first", data.clone());
        let second = resources.register_mesh_data("second", data);
        assert_ne!(
            first.mesh().geometries()[0].id(),
            second.mesh().geometries()[0].id()
        );
    }

    #[test]
    fn test_missing_skeleton_keeps_geometry_static() {
        let mut resources = ResourceManager::new();
        let mut data = ObjLoader::parse(QUAD_OBJ.as_bytes(), "quad", 1.0).unwrap();
        let geometry = &mut data.geometries[0];
        geometry.skeleton_name = Some("ghost".to_string());
        geometry.bone_indices = vec![[0; 4]; geometry.positions.len()];
        geometry.bone_weights = vec![[1.0, 0.0, 0.0, 0.0]; geometry.positions.len()];

        let model = resources.register_mesh_data("quad", data);
        assert!(!model.mesh().has_bone());
        assert!(!model.mesh().geometries()[0].has_skinning());
    }

    #[test]
    fn test_materials() {
        let mut resources = ResourceManager::new();
        let glass = resources.create_material_instance("glass", "pbr", BlendMode::Translucent);
        let metal = resources.create_material_instance("metal", "pbr", BlendMode::Opaque);
        assert!(glass.is_translucent());
        assert_eq!(glass.material.id, metal.material.id);
        assert_ne!(glass.material.id, resources.default_material_instance().material.id);
        assert!(resources.get_material_instance("glass").is_some());
        assert!(resources.get_material_instance("wood").is_none());
    }
}
