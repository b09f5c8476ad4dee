//! Typed `<source>` arrays, `<input>` semantics and XML helpers

use std::collections::HashMap;
use std::str::FromStr;

use roxmltree::Node;

use super::ColladaError;

/// First child element named `name`
pub(super) fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

/// All child elements named `name`
pub(super) fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.has_tag_name(name))
}

/// Follow a `/` separated path of first-match children
pub(super) fn find_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    path.split('/').try_fold(node, |current, name| child(current, name))
}

/// Every element reachable through a `/` separated path
pub(super) fn find_all_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for name in path.split('/') {
        current = current
            .into_iter()
            .flat_map(|n| n.children().filter(|c| c.has_tag_name(name)))
            .collect();
    }
    current
}

/// Element text, empty when absent
pub(super) fn text<'a>(node: Option<Node<'a, '_>>) -> &'a str {
    node.and_then(|n| n.text()).unwrap_or_default().trim()
}

/// Attribute value, empty when absent
pub(super) fn attr<'a>(node: Option<Node<'a, '_>>, name: &str) -> &'a str {
    node.and_then(|n| n.attribute(name)).unwrap_or_default()
}

/// Strip the leading `#` of a URI fragment reference
pub(super) fn strip_ref(reference: &str) -> &str {
    reference.strip_prefix('#').unwrap_or(reference)
}

/// COLLADA ids and names with `.` replaced, matching the animation targets
pub(super) fn sanitize_name(name: &str) -> String {
    name.replace('.', "_")
}

/// Parse a whitespace separated list of numbers
pub(super) fn parse_list<T: FromStr>(data: &str, context: &str) -> Result<Vec<T>, ColladaError> {
    data.split_whitespace()
        .map(|value| {
            value.parse().map_err(|_| ColladaError::InvalidNumber {
                context: context.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Payload of a `<source>`
#[derive(Debug, Clone, PartialEq)]
pub(super) enum SourceArray {
    Float(Vec<f32>),
    Name(Vec<String>),
}

/// One `<source>` element with its accessor stride
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Source {
    pub stride: usize,
    pub data: SourceArray,
}

impl Source {
    /// Number of accessor elements
    pub fn count(&self) -> usize {
        let len = match &self.data {
            SourceArray::Float(values) => values.len(),
            SourceArray::Name(names) => names.len(),
        };
        len / self.stride.max(1)
    }

    /// Float tuple at accessor element `index`
    pub fn floats(&self, index: usize) -> Option<&[f32]> {
        match &self.data {
            SourceArray::Float(values) => {
                let stride = self.stride.max(1);
                values.get(index * stride..(index + 1) * stride)
            }
            SourceArray::Name(_) => None,
        }
    }

    /// Every float value, ignoring stride
    pub fn all_floats(&self) -> &[f32] {
        match &self.data {
            SourceArray::Float(values) => values,
            SourceArray::Name(_) => &[],
        }
    }

    /// Every name value
    pub fn names(&self) -> &[String] {
        match &self.data {
            SourceArray::Name(names) => names,
            SourceArray::Float(_) => &[],
        }
    }
}

/// Parse every direct `<source>` child into `{id: source}`
pub(super) fn parse_sources(element: Node<'_, '_>) -> Result<HashMap<String, Source>, ColladaError> {
    let mut sources = HashMap::new();
    for xml_source in children(element, "source") {
        let id = attr(Some(xml_source), "id").to_string();
        let stride = attr(find_path(xml_source, "technique_common/accessor"), "stride")
            .parse::<usize>()
            .unwrap_or(1);

        let data = if let Some(array) = child(xml_source, "float_array") {
            SourceArray::Float(parse_list(text(Some(array)), &id)?)
        } else if let Some(array) = child(xml_source, "Name_array") {
            SourceArray::Name(text(Some(array)).split_whitespace().map(sanitize_name).collect())
        } else {
            continue;
        };

        sources.insert(id, Source { stride, data });
    }
    Ok(sources)
}

/// One `<input>` of a primitive, sampler or skin
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SemanticInput {
    pub source: String,
    pub offset: usize,
    pub set: u32,
}

/// Parse every direct `<input>` child into `{semantic: input}`.
///
/// Inputs in a non-zero set get the set number appended to their semantic
/// (`TEXCOORD1`), so the primary set keeps the bare name.
pub(super) fn parse_semantics(element: Node<'_, '_>) -> HashMap<String, SemanticInput> {
    let mut semantics = HashMap::new();
    for xml_input in children(element, "input") {
        let set = attr(Some(xml_input), "set").parse::<u32>().unwrap_or(0);
        let mut semantic = attr(Some(xml_input), "semantic").to_string();
        if set != 0 {
            semantic.push_str(&set.to_string());
        }
        let source = strip_ref(attr(Some(xml_input), "source")).to_string();
        let offset = attr(Some(xml_input), "offset").parse::<usize>().unwrap_or(0);
        semantics.insert(semantic, SemanticInput { source, offset, set });
    }
    semantics
}

/// Number of indices per vertex in an interleaved `<p>` or `<v>` stream
pub(super) fn semantic_stride(semantics: &HashMap<String, SemanticInput>) -> usize {
    semantics.values().map(|input| input.offset + 1).max().unwrap_or(1)
}
