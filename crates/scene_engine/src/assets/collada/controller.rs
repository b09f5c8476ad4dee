//! Skin controllers

use roxmltree::Node;

use super::source::{attr, child, find_path, parse_list, parse_semantics, parse_sources, sanitize_name, semantic_stride, strip_ref, text};
use super::ColladaError;
use crate::assets::mesh_data::MAX_BONE_INFLUENCES;
use crate::foundation::math::Mat4;

/// A `<controller>` with its `<skin>` resolved into per-vertex influences
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ColladaController {
    pub name: String,
    pub id: String,
    pub skin_source: String,
    pub bind_shape_matrix: Mat4,
    pub bone_names: Vec<String>,
    pub bone_indices: Vec<[u32; MAX_BONE_INFLUENCES]>,
    pub bone_weights: Vec<[f32; MAX_BONE_INFLUENCES]>,
    pub inv_bind_matrices: Vec<Mat4>,
}

impl ColladaController {
    pub fn parse(xml_controller: Node<'_, '_>) -> Result<Self, ColladaError> {
        let mut controller = Self {
            name: sanitize_name(attr(Some(xml_controller), "name")),
            id: sanitize_name(attr(Some(xml_controller), "id")),
            skin_source: String::new(),
            bind_shape_matrix: Mat4::identity(),
            bone_names: Vec::new(),
            bone_indices: Vec::new(),
            bone_weights: Vec::new(),
            inv_bind_matrices: Vec::new(),
        };

        let Some(xml_skin) = child(xml_controller, "skin") else {
            return Ok(controller);
        };

        controller.skin_source = sanitize_name(strip_ref(attr(Some(xml_skin), "source")));

        let bind_shape: Vec<f32> = parse_list(text(child(xml_skin, "bind_shape_matrix")), &controller.id)?;
        if bind_shape.len() == 16 {
            controller.bind_shape_matrix = Mat4::from_row_slice(&bind_shape);
        }

        let sources = parse_sources(xml_skin)?;
        let joint_semantics = child(xml_skin, "joints").map(parse_semantics).unwrap_or_default();

        if let Some(xml_weights) = child(xml_skin, "vertex_weights") {
            let weight_semantics = parse_semantics(xml_weights);
            let stride = semantic_stride(&weight_semantics);
            let vcounts: Vec<usize> = parse_list(text(child(xml_weights, "vcount")), &controller.id)?;
            let v_list: Vec<usize> = parse_list(text(find_path(xml_weights, "v")), &controller.id)?;

            let joint_offset = weight_semantics.get("JOINT").map(|input| input.offset);
            let weight_input = weight_semantics.get("WEIGHT");
            let weight_values = weight_input
                .and_then(|input| sources.get(&input.source))
                .map(|source| source.all_floats())
                .unwrap_or_default();

            let mut cursor = 0;
            for vcount in vcounts {
                let influences = v_list
                    .get(cursor..cursor + vcount * stride)
                    .ok_or_else(|| ColladaError::IndexOutOfRange(format!("{} vertex_weights", controller.id)))?;
                cursor += vcount * stride;

                let mut indices = [0_u32; MAX_BONE_INFLUENCES];
                let mut weights = [0.0_f32; MAX_BONE_INFLUENCES];
                for slot in 0..vcount.min(MAX_BONE_INFLUENCES) {
                    if let Some(offset) = joint_offset {
                        #[allow(clippy::cast_possible_truncation)]
                        let joint = influences[slot * stride + offset] as u32;
                        indices[slot] = joint;
                    }
                    if let Some(input) = weight_input {
                        let weight_index = influences[slot * stride + input.offset];
                        weights[slot] = weight_values.get(weight_index).copied().unwrap_or(0.0);
                    }
                }
                controller.bone_indices.push(indices);
                controller.bone_weights.push(weights);
            }
        }

        if let Some(joint) = joint_semantics.get("JOINT") {
            if let Some(source) = sources.get(&joint.source) {
                controller.bone_names = source.names().to_vec();
            }
        }

        if let Some(inv_bind) = joint_semantics.get("INV_BIND_MATRIX") {
            if let Some(source) = sources.get(&inv_bind.source) {
                controller.inv_bind_matrices = source
                    .all_floats()
                    .chunks_exact(16)
                    .map(Mat4::from_row_slice)
                    .collect();
            }
        }

        Ok(controller)
    }

    /// Number of skinned vertices
    pub fn vertex_count(&self) -> usize {
        self.bone_indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CONTROLLER: &str = r##"<controller id="Armature_Cube-skin" name="Armature">
        <skin source="#Cube-mesh">
            <bind_shape_matrix>1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1</bind_shape_matrix>
            <source id="joints"><Name_array count="2">Root Arm</Name_array>
                <technique_common><accessor count="2" stride="1"/></technique_common></source>
            <source id="binds"><float_array count="32">
                1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1
                1 0 0 0 0 1 0 -2 0 0 1 0 0 0 0 1</float_array>
                <technique_common><accessor count="2" stride="16"/></technique_common></source>
            <source id="weights"><float_array count="3">1 0.25 0.75</float_array>
                <technique_common><accessor count="3" stride="1"/></technique_common></source>
            <joints>
                <input semantic="JOINT" source="#joints"/>
                <input semantic="INV_BIND_MATRIX" source="#binds"/>
            </joints>
            <vertex_weights count="2">
                <input semantic="JOINT" source="#joints" offset="0"/>
                <input semantic="WEIGHT" source="#weights" offset="1"/>
                <vcount>1 2</vcount>
                <v>0 0  0 1 1 2</v>
            </vertex_weights>
        </skin>
    </controller>"##;

    #[test]
    fn test_influences_are_padded_to_four() {
        let doc = roxmltree::Document::parse(CONTROLLER).unwrap();
        let controller = ColladaController::parse(doc.root_element()).unwrap();
        assert_eq!(controller.skin_source, "Cube-mesh");
        assert_eq!(controller.bone_names, vec!["Root", "Arm"]);
        assert_eq!(controller.vertex_count(), 2);
        assert_eq!(controller.bone_indices[0], [0, 0, 0, 0]);
        assert_eq!(controller.bone_weights[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(controller.bone_indices[1], [0, 1, 0, 0]);
        assert_eq!(controller.bone_weights[1], [0.25, 0.75, 0.0, 0.0]);
        assert_eq!(controller.inv_bind_matrices.len(), 2);
        assert_relative_eq!(controller.inv_bind_matrices[1].m24, -2.0);
    }

    #[test]
    fn test_truncated_weight_stream_is_an_error() {
        let broken = CONTROLLER.replace("<v>0 0  0 1 1 2</v>", "<v>0 0 0</v>");
        let doc = roxmltree::Document::parse(&broken).unwrap();
        assert!(matches!(
            ColladaController::parse(doc.root_element()),
            Err(ColladaError::IndexOutOfRange(_))
        ));
    }
}
