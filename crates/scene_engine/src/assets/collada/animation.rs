//! Animation channels

use std::collections::HashMap;

use roxmltree::Node;

use super::source::{attr, child, parse_semantics, parse_sources, sanitize_name, SemanticInput, Source};
use super::ColladaError;
use crate::assets::mesh_data::Interpolation;
use crate::foundation::math::Mat4;

/// Channel type whose outputs are full 4x4 matrices
pub(super) const TRANSFORM_CHANNEL: &str = "transform";

/// One `<animation>` with a single sampler and channel
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ColladaAnimation {
    pub id: String,
    /// Target node name
    pub target: String,
    /// Animated property, e.g. `transform` or `location.X`
    pub channel_type: String,
    pub inputs: Vec<f32>,
    pub outputs: Vec<f32>,
    pub output_stride: usize,
    pub interpolations: Vec<Interpolation>,
    pub in_tangents: Vec<f32>,
    pub out_tangents: Vec<f32>,
}

impl ColladaAnimation {
    /// Parse an animation; returns `None` for channels without a target,
    /// a type or any key times
    pub fn parse(
        xml_animation: Node<'_, '_>,
        node_name_map: &HashMap<String, String>,
    ) -> Result<Option<Self>, ColladaError> {
        let sources = parse_sources(xml_animation)?;
        let semantics = child(xml_animation, "sampler").map(parse_semantics).unwrap_or_default();

        let target_attr = attr(child(xml_animation, "channel"), "target");
        let (target, channel_type) = match target_attr.split_once('/') {
            Some((node_id, channel_type)) => {
                let node_id = sanitize_name(node_id);
                let target = node_name_map.get(&node_id).cloned().unwrap_or(node_id);
                (target, channel_type.to_string())
            }
            None => (String::new(), String::new()),
        };

        let source_for = |semantic| lookup_source(&semantics, &sources, semantic);
        let floats = |semantic| source_for(semantic).map(|s| s.all_floats().to_vec()).unwrap_or_default();

        let animation = Self {
            id: sanitize_name(attr(Some(xml_animation), "id")),
            inputs: floats("INPUT"),
            outputs: floats("OUTPUT"),
            output_stride: source_for("OUTPUT").map_or(1, |s| s.stride.max(1)),
            interpolations: source_for("INTERPOLATION")
                .map(|s| s.names().iter().map(|name| Interpolation::parse(name)).collect())
                .unwrap_or_default(),
            in_tangents: floats("IN_TANGENT"),
            out_tangents: floats("OUT_TANGENT"),
            target,
            channel_type,
        };

        if animation.target.is_empty() || animation.channel_type.is_empty() || animation.inputs.is_empty() {
            log::error!("{} has an invalid animation.", animation.id);
            return Ok(None);
        }

        Ok(Some(animation))
    }

    pub fn is_transform(&self) -> bool {
        self.channel_type == TRANSFORM_CHANNEL
    }

    /// Output of key `frame` as a matrix, for transform channels
    pub fn output_matrix(&self, frame: usize) -> Option<Mat4> {
        if !self.is_transform() {
            return None;
        }
        self.outputs
            .get(frame * 16..(frame + 1) * 16)
            .map(Mat4::from_row_slice)
    }

    /// Number of complete output keys
    pub fn output_count(&self) -> usize {
        if self.is_transform() {
            self.outputs.len() / 16
        } else {
            self.outputs.len() / self.output_stride
        }
    }
}

fn lookup_source<'s>(
    semantics: &HashMap<String, SemanticInput>,
    sources: &'s HashMap<String, Source>,
    semantic: &str,
) -> Option<&'s Source> {
    semantics.get(semantic).and_then(|input| sources.get(&input.source))
}
