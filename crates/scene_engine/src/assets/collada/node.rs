//! Visual scene nodes

use roxmltree::Node;

use super::source::{attr, child, children, parse_list, sanitize_name, strip_ref, text};
use super::ColladaError;
use crate::foundation::math::{utils, Mat4, Vec3};

/// One `<node>` of the visual scene with its children
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ColladaNode {
    pub name: String,
    pub id: String,
    pub node_type: String,
    pub matrix: Mat4,
    pub instance_controller: String,
    pub instance_geometry: String,
    pub children: Vec<ColladaNode>,
}

impl ColladaNode {
    pub fn parse(xml_node: Node<'_, '_>) -> Result<Self, ColladaError> {
        let name = sanitize_name(attr(Some(xml_node), "name"));
        let matrix = parse_node_matrix(xml_node, &name)?;

        let children = children(xml_node, "node")
            .map(ColladaNode::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: sanitize_name(attr(Some(xml_node), "id")),
            node_type: attr(Some(xml_node), "type").to_string(),
            matrix,
            instance_controller: sanitize_name(strip_ref(attr(child(xml_node, "instance_controller"), "url"))),
            instance_geometry: sanitize_name(strip_ref(attr(child(xml_node, "instance_geometry"), "url"))),
            children,
            name,
        })
    }

    /// Depth-first search over this node and its descendants
    pub fn find<'a>(&'a self, predicate: &dyn Fn(&ColladaNode) -> bool) -> Option<&'a ColladaNode> {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|node| node.find(predicate))
    }

    /// Visit this node and every descendant
    pub fn visit(&self, visitor: &mut dyn FnMut(&ColladaNode)) {
        visitor(self);
        for node in &self.children {
            node.visit(visitor);
        }
    }
}

/// Either a `<matrix>` or the `<translate>`, `<rotate>` and `<scale>`
/// elements composed in document order
fn parse_node_matrix(xml_node: Node<'_, '_>, name: &str) -> Result<Mat4, ColladaError> {
    if let Some(xml_matrix) = child(xml_node, "matrix") {
        let values: Vec<f32> = parse_list(text(Some(xml_matrix)), name)?;
        if values.len() == 16 {
            return Ok(Mat4::from_row_slice(&values));
        }
        log::error!("{name} node has an invalid matrix.");
        return Ok(Mat4::identity());
    }

    let mut matrix = Mat4::identity();
    for element in xml_node.children().filter(Node::is_element) {
        let tag = element.tag_name().name();
        if !matches!(tag, "translate" | "rotate" | "scale") {
            continue;
        }

        let values: Vec<f32> = parse_list(text(Some(element)), name)?;
        match (tag, values.as_slice()) {
            ("translate", &[x, y, z]) => {
                matrix *= Mat4::new_translation(&Vec3::new(x, y, z));
            }
            ("rotate", &[x, y, z, angle]) => {
                let axis = Vec3::new(x, y, z);
                if let Some(axis) = nalgebra::Unit::try_new(axis, f32::EPSILON) {
                    matrix *= Mat4::from_axis_angle(&axis, utils::deg_to_rad(angle));
                }
            }
            ("scale", &[x, y, z]) => {
                matrix *= Mat4::new_nonuniform_scaling(&Vec3::new(x, y, z));
            }
            _ => log::error!("{name} node has an invalid {tag}."),
        }
    }
    Ok(matrix)
}
