//! Mesh primitives

use std::collections::HashMap;

use roxmltree::Node;

use super::controller::ColladaController;
use super::source::{
    attr, child, children, find_all_path, parse_list, parse_semantics, parse_sources, sanitize_name,
    semantic_stride, strip_ref, text, SemanticInput, Source,
};
use super::ColladaError;
use crate::assets::mesh_data::{triangulate_polygon, VertexDeduplicator, MAX_BONE_INFLUENCES};
use crate::foundation::math::{Vec2, Vec3, Vec4};

const PRIMITIVE_TAGS: [&str; 3] = ["polygons", "polylist", "triangles"];

/// A `<geometry>` flattened into indexed vertex streams in source space
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct ColladaGeometry {
    pub name: String,
    pub id: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<Vec4>,
    pub texcoords: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub bone_indices: Vec<[u32; MAX_BONE_INFLUENCES]>,
    pub bone_weights: Vec<[f32; MAX_BONE_INFLUENCES]>,
    /// Index of the skin controller, kept only when its vertex count matches
    pub controller: Option<usize>,
}

/// Triangulated primitive data before deduplication
struct Primitive {
    semantics: HashMap<String, SemanticInput>,
    stride: usize,
    /// Flattened per-corner index tuples, three corners per triangle
    corners: Vec<usize>,
}

impl ColladaGeometry {
    /// Parse a geometry and, if a controller skins it, its bone streams.
    ///
    /// A controller whose vertex count differs from the position source is
    /// logged and ignored, leaving a static geometry.
    pub fn parse(xml_geometry: Node<'_, '_>, controllers: &[ColladaController]) -> Result<Self, ColladaError> {
        let mut geometry = Self {
            name: sanitize_name(attr(Some(xml_geometry), "name")),
            id: sanitize_name(attr(Some(xml_geometry), "id")),
            ..Default::default()
        };
        let mut controller = controllers.iter().position(|c| c.skin_source == geometry.id);

        let xml_mesh = child(xml_geometry, "mesh").ok_or_else(|| ColladaError::MissingElement {
            element: "mesh".to_string(),
            owner: geometry.id.clone(),
        })?;
        let sources = parse_sources(xml_mesh)?;

        let position_source_id = find_all_path(xml_mesh, "vertices/input")
            .into_iter()
            .find(|input| attr(Some(*input), "semantic") == "POSITION")
            .map(|input| strip_ref(attr(Some(input), "source")).to_string())
            .ok_or_else(|| ColladaError::MissingSemantic {
                semantic: "POSITION".to_string(),
                owner: geometry.id.clone(),
            })?;
        let position_source = sources.get(&position_source_id).ok_or_else(|| ColladaError::MissingSource {
            source_id: position_source_id.clone(),
            owner: geometry.id.clone(),
        })?;

        if let Some(index) = controller {
            let vertex_count = position_source.count();
            let bone_weight_count = controllers[index].vertex_count();
            if vertex_count != bone_weight_count {
                log::error!(
                    "{}: different count. vertex_count : {}, bone_weight_count : {}; loading as static geometry",
                    geometry.name,
                    vertex_count,
                    bone_weight_count
                );
                controller = None;
            }
        }
        geometry.controller = controller;

        let primitive = parse_primitive(xml_mesh, &geometry.id)?;
        geometry.build(&primitive, &sources, position_source, controller.map(|i| &controllers[i]))?;
        Ok(geometry)
    }

    fn build(
        &mut self,
        primitive: &Primitive,
        sources: &HashMap<String, Source>,
        position_source: &Source,
        controller: Option<&ColladaController>,
    ) -> Result<(), ColladaError> {
        let vertex_offset = primitive
            .semantics
            .get("VERTEX")
            .map(|input| input.offset)
            .ok_or_else(|| ColladaError::MissingSemantic {
                semantic: "VERTEX".to_string(),
                owner: self.id.clone(),
            })?;

        let normal_stream = input_stream(primitive, sources, "NORMAL", &self.id)?;
        let color_stream = input_stream(primitive, sources, "COLOR", &self.id)?;
        let texcoord_stream = input_stream(primitive, sources, "TEXCOORD", &self.id)?;

        let out_of_range = || ColladaError::IndexOutOfRange(self.id.clone());
        let mut dedup = VertexDeduplicator::new();
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut colors = Vec::new();
        let mut texcoords = Vec::new();
        let mut bone_indices = Vec::new();
        let mut bone_weights = Vec::new();

        for tuple in primitive.corners.chunks_exact(primitive.stride) {
            if !dedup.push(tuple.to_vec()) {
                continue;
            }

            let position_index = tuple[vertex_offset];
            let p = position_source.floats(position_index).ok_or_else(out_of_range)?;
            positions.push(vec3(p));

            if let Some(controller) = controller {
                bone_indices.push(*controller.bone_indices.get(position_index).ok_or_else(out_of_range)?);
                bone_weights.push(*controller.bone_weights.get(position_index).ok_or_else(out_of_range)?);
            }

            if let Some((offset, source)) = normal_stream {
                normals.push(vec3(source.floats(tuple[offset]).ok_or_else(out_of_range)?));
            }

            if let Some((offset, source)) = color_stream {
                let c = source.floats(tuple[offset]).ok_or_else(out_of_range)?;
                let component = |i: usize, default: f32| c.get(i).copied().unwrap_or(default);
                colors.push(Vec4::new(component(0, 0.0), component(1, 0.0), component(2, 0.0), component(3, 1.0)));
            }

            if let Some((offset, source)) = texcoord_stream {
                let t = source.floats(tuple[offset]).ok_or_else(out_of_range)?;
                texcoords.push(Vec2::new(
                    t.first().copied().unwrap_or(0.0),
                    t.get(1).copied().unwrap_or(0.0),
                ));
            }
        }

        self.positions = positions;
        self.normals = normals;
        self.colors = colors;
        self.texcoords = texcoords;
        self.bone_indices = bone_indices;
        self.bone_weights = bone_weights;
        self.indices = dedup.into_indices();
        Ok(())
    }
}

/// Offset and source of an optional primitive input
fn input_stream<'s>(
    primitive: &Primitive,
    sources: &'s HashMap<String, Source>,
    semantic: &str,
    owner: &str,
) -> Result<Option<(usize, &'s Source)>, ColladaError> {
    match primitive.semantics.get(semantic) {
        None => Ok(None),
        Some(input) => sources
            .get(&input.source)
            .map(|source| Some((input.offset, source)))
            .ok_or_else(|| ColladaError::MissingSource {
                source_id: input.source.clone(),
                owner: owner.to_string(),
            }),
    }
}

fn vec3(values: &[f32]) -> Vec3 {
    let component = |i: usize| values.get(i).copied().unwrap_or(0.0);
    Vec3::new(component(0), component(1), component(2))
}

/// Read the first primitive element and fan-triangulate it
fn parse_primitive(xml_mesh: Node<'_, '_>, owner: &str) -> Result<Primitive, ColladaError> {
    let (tag, xml_primitive) = PRIMITIVE_TAGS
        .iter()
        .find_map(|tag| child(xml_mesh, tag).map(|node| (*tag, node)))
        .ok_or_else(|| ColladaError::MissingElement {
            element: PRIMITIVE_TAGS.join("|"),
            owner: owner.to_string(),
        })?;

    let semantics = parse_semantics(xml_primitive);
    let stride = semantic_stride(&semantics);

    let (vcounts, polygon_indices): (Vec<usize>, Vec<usize>) = match tag {
        "triangles" => {
            let indices: Vec<usize> = parse_list(text(child(xml_primitive, "p")), owner)?;
            let triangle_count = indices.len() / (stride * 3);
            (vec![3; triangle_count], indices)
        }
        "polylist" => (
            parse_list(text(child(xml_primitive, "vcount")), owner)?,
            parse_list(text(child(xml_primitive, "p")), owner)?,
        ),
        _ => {
            let mut vcounts = Vec::new();
            let mut indices = Vec::new();
            for xml_p in children(xml_primitive, "p") {
                let polygon: Vec<usize> = parse_list(text(Some(xml_p)), owner)?;
                vcounts.push(polygon.len() / stride);
                indices.extend(polygon);
            }
            (vcounts, indices)
        }
    };

    let mut corners = Vec::with_capacity(polygon_indices.len());
    let mut cursor = 0;
    for vcount in vcounts {
        let polygon = polygon_indices
            .get(cursor..cursor + vcount * stride)
            .ok_or_else(|| ColladaError::IndexOutOfRange(owner.to_string()))?;
        cursor += vcount * stride;

        for triangle in triangulate_polygon(vcount) {
            for corner in triangle {
                corners.extend_from_slice(&polygon[corner * stride..(corner + 1) * stride]);
            }
        }
    }

    Ok(Primitive {
        semantics,
        stride,
        corners,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = r##"<geometry id="Plane-mesh" name="Plane">
        <mesh>
            <source id="pos"><float_array count="12">0 0 0  1 0 0  1 1 0  0 1 0</float_array>
                <technique_common><accessor count="4" stride="3"/></technique_common></source>
            <source id="nrm"><float_array count="3">0 0 1</float_array>
                <technique_common><accessor count="1" stride="3"/></technique_common></source>
            <vertices id="verts"><input semantic="POSITION" source="#pos"/></vertices>
            <polylist count="1">
                <input semantic="VERTEX" source="#verts" offset="0"/>
                <input semantic="NORMAL" source="#nrm" offset="1"/>
                <vcount>4</vcount>
                <p>0 0 1 0 2 0 3 0</p>
            </polylist>
        </mesh>
    </geometry>"##;

    #[test]
    fn test_polylist_quad_is_fanned() {
        let doc = roxmltree::Document::parse(QUAD).unwrap();
        let geometry = ColladaGeometry::parse(doc.root_element(), &[]).unwrap();
        assert_eq!(geometry.name, "Plane");
        assert_eq!(geometry.positions.len(), 4);
        assert_eq!(geometry.normals.len(), 4);
        assert_eq!(geometry.indices, vec![0, 1, 2, 2, 3, 0]);
        assert!(geometry.controller.is_none());
    }

    #[test]
    fn test_polygons_element() {
        let xml = QUAD
            .replace("<polylist count=\"1\">", "<polygons count=\"1\">")
            .replace("</polylist>", "</polygons>")
            .replace("<vcount>4</vcount>", "");
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let geometry = ColladaGeometry::parse(doc.root_element(), &[]).unwrap();
        assert_eq!(geometry.indices, vec![0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn test_missing_vertex_semantic() {
        let xml = QUAD.replace("semantic=\"VERTEX\"", "semantic=\"BINORMAL\"");
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert!(matches!(
            ColladaGeometry::parse(doc.root_element(), &[]),
            Err(ColladaError::MissingSemantic { .. })
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let xml = QUAD.replace("<p>0 0 1 0 2 0 3 0</p>", "<p>0 0 1 0 2 0 9 0</p>");
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert!(matches!(
            ColladaGeometry::parse(doc.root_element(), &[]),
            Err(ColladaError::IndexOutOfRange(_))
        ));
    }
}
