//! COLLADA (`.dae`) loader
//!
//! Reads the subset of COLLADA needed for skinned meshes: visual scene
//! nodes, geometries, skin controllers and matrix animations. The result is
//! a [`MeshData`] in engine space (Y up) with skeletons in topological bone
//! order and animations precomputed into skinning transforms, so a sampled
//! key can be applied directly to a bind-pose vertex.

mod animation;
mod controller;
mod geometry;
mod node;
mod source;

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use self::animation::ColladaAnimation;
use self::controller::ColladaController;
use self::geometry::ColladaGeometry;
use self::node::ColladaNode;
use self::source::{attr, find_all_path, find_path, text};
use super::mesh_data::{
    AnimationData, AnimationNodeData, BoneData, GeometryData, MeshData, SkeletonData, MAX_BONE_INFLUENCES,
};
use crate::foundation::math::{constants::HALF_PI, Mat4, Mat4Ext, Transform, Vec4};

/// COLLADA loading errors
#[derive(Error, Debug)]
pub enum ColladaError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
    /// The root element is not `<COLLADA>`
    #[error("Not a COLLADA document: root element is <{0}>")]
    NotCollada(String),
    /// A numeric array holds a non-number
    #[error("Invalid number '{value}' in {context}")]
    InvalidNumber {
        /// Element or id being parsed
        context: String,
        /// Offending token
        value: String,
    },
    /// A required child element is absent
    #[error("{owner} has no <{element}> element")]
    MissingElement {
        /// Element name
        element: String,
        /// Id of the owning element
        owner: String,
    },
    /// A required input semantic is absent
    #[error("{owner} has no {semantic} input")]
    MissingSemantic {
        /// Semantic name
        semantic: String,
        /// Id of the owning element
        owner: String,
    },
    /// An input references an unknown source
    #[error("{owner} references missing source {source_id}")]
    MissingSource {
        /// Referenced source id
        source_id: String,
        /// Id of the owning element
        owner: String,
    },
    /// An index stream points past its source
    #[error("Index out of range in {0}")]
    IndexOutOfRange(String),
}

/// Declared up axis of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpAxis {
    /// X up
    XUp,
    /// Y up, the engine convention
    #[default]
    YUp,
    /// Z up, converted on load
    ZUp,
}

impl UpAxis {
    fn parse(value: &str) -> Self {
        match value {
            "X_UP" => Self::XUp,
            "Z_UP" => Self::ZUp,
            _ => Self::YUp,
        }
    }

    /// Bring a world-space matrix into Y-up space
    pub fn swap_matrix(self, matrix: &Mat4) -> Mat4 {
        match self {
            Self::ZUp => Mat4::rotation_x(-HALF_PI) * matrix,
            _ => *matrix,
        }
    }

    /// Bring an inverse-bind matrix into Y-up space
    pub fn swap_inverse_matrix(self, matrix: &Mat4) -> Mat4 {
        match self {
            Self::ZUp => matrix * Mat4::rotation_x(HALF_PI),
            _ => *matrix,
        }
    }
}

/// A parsed COLLADA document
#[derive(Debug, Clone)]
pub struct Collada {
    /// File stem, used to name animations
    pub name: String,
    /// Schema version attribute
    pub collada_version: String,
    /// Contributor author
    pub author: String,
    /// Exporting tool
    pub authoring_tool: String,
    /// Creation timestamp text
    pub created: String,
    /// Modification timestamp text
    pub modified: String,
    /// Unit name, `meter` when absent
    pub unit_name: String,
    /// Meters per unit
    pub unit_meter: f32,
    /// Declared up axis
    pub up_axis: UpAxis,

    nodes: Vec<ColladaNode>,
    node_name_map: HashMap<String, String>,
    controllers: Vec<ColladaController>,
    animations: Vec<ColladaAnimation>,
    geometries: Vec<ColladaGeometry>,
}

impl Collada {
    /// Load a `.dae` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ColladaError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map_or_else(|| "collada".to_string(), |stem| stem.to_string_lossy().into_owned());
        Self::parse(&contents, &name)
    }

    /// Parse a document from text
    pub fn parse(contents: &str, name: &str) -> Result<Self, ColladaError> {
        let document = roxmltree::Document::parse(contents)?;
        let root = document.root_element();
        if !root.has_tag_name("COLLADA") {
            return Err(ColladaError::NotCollada(root.tag_name().name().to_string()));
        }

        let unit = find_path(root, "asset/unit");
        let mut collada = Self {
            name: name.to_string(),
            collada_version: attr(Some(root), "version").to_string(),
            author: text(find_path(root, "asset/contributor/author")).to_string(),
            authoring_tool: text(find_path(root, "asset/contributor/authoring_tool")).to_string(),
            created: text(find_path(root, "asset/created")).to_string(),
            modified: text(find_path(root, "asset/modified")).to_string(),
            unit_name: unit
                .and_then(|u| u.attribute("name"))
                .unwrap_or("meter")
                .to_string(),
            unit_meter: attr(unit, "meter").parse().unwrap_or(1.0),
            up_axis: UpAxis::parse(text(find_path(root, "asset/up_axis"))),
            nodes: Vec::new(),
            node_name_map: HashMap::new(),
            controllers: Vec::new(),
            animations: Vec::new(),
            geometries: Vec::new(),
        };

        for xml_node in find_all_path(root, "library_visual_scenes/visual_scene/node") {
            collada.nodes.push(ColladaNode::parse(xml_node)?);
        }
        let mut node_name_map = HashMap::new();
        for node in &collada.nodes {
            node.visit(&mut |n| {
                node_name_map.insert(n.id.clone(), n.name.clone());
            });
        }
        collada.node_name_map = node_name_map;

        for xml_controller in find_all_path(root, "library_controllers/controller") {
            collada.controllers.push(ColladaController::parse(xml_controller)?);
        }

        // exporters may wrap channels in an outer <animation>
        let mut xml_animations = Vec::new();
        for xml_animation in find_all_path(root, "library_animations/animation") {
            collect_channel_animations(xml_animation, &mut xml_animations);
        }
        for xml_animation in xml_animations {
            if let Some(animation) = ColladaAnimation::parse(xml_animation, &collada.node_name_map)? {
                collada.animations.push(animation);
            }
        }

        for xml_geometry in find_all_path(root, "library_geometries/geometry") {
            match ColladaGeometry::parse(xml_geometry, &collada.controllers) {
                Ok(geometry) => collada.geometries.push(geometry),
                Err(err) => log::warn!("{}: dropping geometry: {}", collada.name, err),
            }
        }

        Ok(collada)
    }

    /// Convert to engine-space mesh data
    pub fn get_mesh_data(&self) -> MeshData {
        let skeletons: Vec<(SkeletonData, Vec<usize>)> = self.build_skeletons();
        let geometries = self.build_geometries(&skeletons);
        let animations = skeletons
            .iter()
            .filter_map(|(skeleton, _)| self.build_animation(skeleton))
            .collect();

        MeshData {
            geometries,
            skeletons: skeletons.into_iter().map(|(skeleton, _)| skeleton).collect(),
            animations,
        }
    }

    fn find_node(&self, predicate: &dyn Fn(&ColladaNode) -> bool) -> Option<&ColladaNode> {
        self.nodes.iter().find_map(|node| node.find(predicate))
    }

    /// One skeleton per distinct controller name, in topological bone order.
    ///
    /// Also returns, per bone, the controller's original joint index.
    fn build_skeletons(&self) -> Vec<(SkeletonData, Vec<usize>)> {
        let mut skeletons: Vec<(SkeletonData, Vec<usize>)> = Vec::new();

        for controller in &self.controllers {
            if controller.bone_names.is_empty() || skeletons.iter().any(|(s, _)| s.name == controller.name) {
                continue;
            }

            let mut order: Vec<(usize, Option<usize>)> = Vec::new();
            if let Some(root) = self.find_node(&|n| n.name == controller.name) {
                collect_bones(root, None, &controller.bone_names, &mut order);
            }
            for (joint, name) in controller.bone_names.iter().enumerate() {
                let already = order.iter().any(|(j, _)| controller.bone_names[*j] == *name);
                if !already {
                    log::warn!("{}: bone {} is not under armature {}", self.name, name, controller.name);
                    order.push((joint, None));
                }
            }

            let bones = order
                .iter()
                .map(|&(joint, parent)| {
                    let inverse_bind = controller.inv_bind_matrices.get(joint).copied().unwrap_or_else(|| {
                        log::warn!("{}: bone {} has no inverse bind matrix", self.name, controller.bone_names[joint]);
                        Mat4::identity()
                    });
                    BoneData {
                        name: controller.bone_names[joint].clone(),
                        parent,
                        inverse_bind_matrix: self.up_axis.swap_inverse_matrix(&inverse_bind),
                    }
                })
                .collect();

            let joints = order.iter().map(|(joint, _)| *joint).collect();
            skeletons.push((
                SkeletonData {
                    name: controller.name.clone(),
                    bones,
                },
                joints,
            ));
        }

        skeletons
    }

    fn build_geometries(&self, skeletons: &[(SkeletonData, Vec<usize>)]) -> Vec<GeometryData> {
        self.geometries
            .iter()
            .map(|geometry| {
                let skin_controller = self.controllers.iter().find(|c| c.skin_source == geometry.id);
                let node = self
                    .find_node(&|n| {
                        n.instance_geometry == geometry.id
                            || skin_controller.is_some_and(|c| !c.id.is_empty() && n.instance_controller == c.id)
                    })
                    .or_else(|| self.find_node(&|n| n.name == geometry.name));

                let node_matrix = node.map_or_else(Mat4::identity, |n| n.matrix);
                let bind_shape = skin_controller.map_or(node_matrix, |c| c.bind_shape_matrix * node_matrix);
                let bind_shape = self.up_axis.swap_matrix(&bind_shape);

                let mut data = GeometryData {
                    name: geometry.name.clone(),
                    positions: geometry
                        .positions
                        .iter()
                        .map(|p| (bind_shape * Vec4::new(p.x, p.y, p.z, 1.0)).xyz())
                        .collect(),
                    normals: geometry
                        .normals
                        .iter()
                        .map(|n| {
                            let n = (bind_shape * Vec4::new(n.x, n.y, n.z, 0.0)).xyz();
                            n.try_normalize(f32::EPSILON).unwrap_or(n)
                        })
                        .collect(),
                    colors: geometry.colors.clone(),
                    texcoords: geometry.texcoords.clone(),
                    indices: geometry.indices.clone(),
                    ..Default::default()
                };

                if let Some(controller) = geometry.controller.map(|index| &self.controllers[index]) {
                    if let Some((skeleton, joint_order)) = skeletons.iter().find(|(s, _)| s.name == controller.name) {
                        data.skeleton_name = Some(skeleton.name.clone());
                        data.bone_weights = geometry.bone_weights.clone();
                        data.bone_indices = geometry
                            .bone_indices
                            .iter()
                            .enumerate()
                            .map(|(vertex, joints)| {
                                let weights = geometry.bone_weights.get(vertex).copied().unwrap_or_default();
                                remap_influences(joints, &weights, joint_order)
                            })
                            .collect();
                    }
                }

                data.compute_bounds();
                data
            })
            .collect()
    }

    /// Precompute skinning keys for every bone of `skeleton`.
    ///
    /// Bones are visited parent first. A root key is the swapped raw key; a
    /// child key is its parent's world key times its own raw key. Bones
    /// without a channel hold their rest matrix from the visual scene. When
    /// a child has more keys than its parent, the parent's last key is held.
    fn build_animation(&self, skeleton: &SkeletonData) -> Option<AnimationData> {
        let channels: Vec<Option<&ColladaAnimation>> = skeleton
            .bones
            .iter()
            .map(|bone| {
                self.animations
                    .iter()
                    .find(|a| a.is_transform() && a.target == bone.name && a.output_count() > 0)
            })
            .collect();

        if channels.iter().all(Option::is_none) {
            return None;
        }

        let mut worlds: Vec<Vec<Mat4>> = Vec::with_capacity(skeleton.bones.len());
        for (bone, channel) in skeleton.bones.iter().zip(&channels) {
            let raw_keys: Vec<Mat4> = match channel {
                Some(animation) => {
                    let count = animation.output_count().min(animation.inputs.len());
                    (0..count).filter_map(|frame| animation.output_matrix(frame)).collect()
                }
                None => {
                    let rest = self.find_node(&|n| n.name == bone.name).map_or_else(Mat4::identity, |n| n.matrix);
                    vec![rest]
                }
            };

            let keys = raw_keys
                .iter()
                .enumerate()
                .map(|(frame, raw)| match bone.parent.and_then(|p| worlds.get(p)) {
                    Some(parent_keys) if !parent_keys.is_empty() => parent_keys[frame.min(parent_keys.len() - 1)] * raw,
                    _ => self.up_axis.swap_matrix(raw),
                })
                .collect();
            worlds.push(keys);
        }

        let animation_name = format!("{}_{}", self.name, skeleton.name);
        let nodes = skeleton
            .bones
            .iter()
            .zip(&channels)
            .zip(&worlds)
            .map(|((bone, channel), keys)| {
                let name = format!("{}_{}", animation_name, bone.name);
                match channel {
                    Some(animation) => AnimationNodeData {
                        name,
                        target: bone.name.clone(),
                        times: animation.inputs[..keys.len()].to_vec(),
                        transforms: keys
                            .iter()
                            .map(|world| Transform::from_matrix(&(world * bone.inverse_bind_matrix)))
                            .collect(),
                        interpolations: animation.interpolations.clone(),
                        in_tangents: animation.in_tangents.clone(),
                        out_tangents: animation.out_tangents.clone(),
                    },
                    None => {
                        log::warn!("not found {} animation data", bone.name);
                        AnimationNodeData {
                            name,
                            target: bone.name.clone(),
                            ..Default::default()
                        }
                    }
                }
            })
            .collect();

        Some(AnimationData {
            name: animation_name,
            skeleton_name: skeleton.name.clone(),
            nodes,
        })
    }
}

/// Map controller joint indices to skeleton bone indices.
///
/// `joint_order[bone]` is the controller joint of each bone. Slots without
/// weight stay at bone 0.
fn remap_influences(
    joints: &[u32; MAX_BONE_INFLUENCES],
    weights: &[f32; MAX_BONE_INFLUENCES],
    joint_order: &[usize],
) -> [u32; MAX_BONE_INFLUENCES] {
    let mut bones = [0; MAX_BONE_INFLUENCES];
    for ((bone, &joint), &weight) in bones.iter_mut().zip(joints).zip(weights) {
        if weight.abs() > 0.0 {
            let index = joint_order.iter().position(|&j| j == joint as usize).unwrap_or(0);
            #[allow(clippy::cast_possible_truncation)]
            let index = index as u32;
            *bone = index;
        }
    }
    bones
}

/// Depth-first walk adding armature children that are bones of the skin
fn collect_bones(
    node: &ColladaNode,
    parent: Option<usize>,
    bone_names: &[String],
    order: &mut Vec<(usize, Option<usize>)>,
) {
    for child in &node.children {
        let Some(joint) = bone_names.iter().position(|name| *name == child.name) else {
            continue;
        };
        if order.iter().any(|(j, _)| bone_names[*j] == child.name) {
            continue;
        }
        order.push((joint, parent));
        let index = order.len() - 1;
        collect_bones(child, Some(index), bone_names, order);
    }
}

fn collect_channel_animations<'a, 'input>(
    xml_animation: roxmltree::Node<'a, 'input>,
    out: &mut Vec<roxmltree::Node<'a, 'input>>,
) {
    if source::child(xml_animation, "channel").is_some() {
        out.push(xml_animation);
    }
    for nested in source::children(xml_animation, "animation") {
        collect_channel_animations(nested, out);
    }
}
