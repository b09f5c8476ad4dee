//! Loader output records
//!
//! Both mesh loaders produce a [`MeshData`]: plain vectors with no GPU or
//! scene state attached. The resource manager turns it into shared
//! runtime objects.

use std::collections::HashMap;
use std::hash::Hash;

use crate::foundation::math::{Mat4, Transform, Vec2, Vec3, Vec4};

/// Maximum bone influences stored per vertex
pub const MAX_BONE_INFLUENCES: usize = 4;

/// Default texture coordinate for vertices without one
pub const DEFAULT_TEXCOORD: [f32; 2] = [0.0, 0.0];

/// Default normal for vertices without one
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// Axis-aligned bounds of a vertex stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    /// Smallest corner
    pub bound_min: Vec3,
    /// Largest corner
    pub bound_max: Vec3,
    /// Midpoint of the box
    pub bound_center: Vec3,
    /// Length of the box diagonal
    pub radius: f32,
}

impl Default for BoundBox {
    fn default() -> Self {
        Self {
            bound_min: Vec3::zeros(),
            bound_max: Vec3::zeros(),
            bound_center: Vec3::zeros(),
            radius: 0.0,
        }
    }
}

impl BoundBox {
    /// Compute bounds of a point set; empty input yields a zero box
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut points = points.into_iter().peekable();
        if points.peek().is_none() {
            return Self::default();
        }

        let mut bound_min = Vec3::repeat(f32::MAX);
        let mut bound_max = Vec3::repeat(f32::MIN);
        for point in points {
            bound_min = bound_min.inf(point);
            bound_max = bound_max.sup(point);
        }
        Self::from_min_max(bound_min, bound_max)
    }

    /// Build from corners
    pub fn from_min_max(bound_min: Vec3, bound_max: Vec3) -> Self {
        Self {
            bound_min,
            bound_max,
            bound_center: (bound_min + bound_max) * 0.5,
            radius: (bound_max - bound_min).norm(),
        }
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Self) -> Self {
        Self::from_min_max(self.bound_min.inf(&other.bound_min), self.bound_max.sup(&other.bound_max))
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.bound_min, self.bound_max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }
}

/// One drawable vertex stream as produced by a loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    /// Geometry name
    pub name: String,
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Unit vertex normals
    pub normals: Vec<Vec3>,
    /// Vertex colours, empty when the source has none
    pub colors: Vec<Vec4>,
    /// Texture coordinates, empty when the source has none
    pub texcoords: Vec<Vec2>,
    /// Triangle list indices
    pub indices: Vec<u32>,
    /// Skeleton the bone streams refer to
    pub skeleton_name: Option<String>,
    /// Four bone indices per vertex
    pub bone_indices: Vec<[u32; MAX_BONE_INFLUENCES]>,
    /// Four bone weights per vertex
    pub bone_weights: Vec<[f32; MAX_BONE_INFLUENCES]>,
    /// Bounds of `positions`
    pub bound_box: BoundBox,
}

impl GeometryData {
    /// Recompute `bound_box` from the positions
    pub fn compute_bounds(&mut self) {
        self.bound_box = BoundBox::from_points(&self.positions);
    }

    /// Whether the geometry carries skinning streams
    pub fn has_skinning(&self) -> bool {
        self.skeleton_name.is_some() && !self.bone_indices.is_empty()
    }
}

/// One bone of a loaded skeleton, already in parent-before-child order
#[derive(Debug, Clone, PartialEq)]
pub struct BoneData {
    /// Unique bone name
    pub name: String,
    /// Index of the parent bone
    pub parent: Option<usize>,
    /// Bind-pose world to bone space
    pub inverse_bind_matrix: Mat4,
}

/// Loaded skeleton
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonData {
    /// Skeleton name
    pub name: String,
    /// Bones in topological order
    pub bones: Vec<BoneData>,
}

/// Keyframe interpolation kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// Linear blend between keys
    #[default]
    Linear,
    /// Bezier curve using tangents
    Bezier,
    /// Hold the previous key
    Step,
}

impl Interpolation {
    /// Parse a COLLADA interpolation name; unknown names fall back to linear
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "BEZIER" => Self::Bezier,
            "STEP" => Self::Step,
            _ => Self::Linear,
        }
    }
}

/// Keyframes for one bone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationNodeData {
    /// Node name, unique within the file
    pub name: String,
    /// Target bone name
    pub target: String,
    /// Key times in seconds
    pub times: Vec<f32>,
    /// Skinning transform per key
    pub transforms: Vec<Transform>,
    /// Interpolation per key
    pub interpolations: Vec<Interpolation>,
    /// Incoming tangents, flattened
    pub in_tangents: Vec<f32>,
    /// Outgoing tangents, flattened
    pub out_tangents: Vec<f32>,
}

/// All bone channels of one skeleton's animation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationData {
    /// Animation name
    pub name: String,
    /// Skeleton the nodes are ordered for
    pub skeleton_name: String,
    /// One node per bone, in bone order
    pub nodes: Vec<AnimationNodeData>,
}

/// Everything a mesh file produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Drawable geometries
    pub geometries: Vec<GeometryData>,
    /// Skeletons referenced by skinned geometries
    pub skeletons: Vec<SkeletonData>,
    /// Animations, one per skeleton
    pub animations: Vec<AnimationData>,
}

/// Corner triples of a fan triangulation of a polygon with `corners` corners.
///
/// The first triangle is `(0, 1, 2)`; each further corner `i` adds
/// `(i - 1, i, 0)`, so a quad yields `(0, 1, 2), (2, 3, 0)`. Polygons with
/// fewer than three corners produce nothing.
pub fn triangulate_polygon(corners: usize) -> impl Iterator<Item = [usize; 3]> {
    let first = (corners >= 3).then_some([0, 1, 2]);
    first
        .into_iter()
        .chain((3..corners.max(3)).map(|i| [i - 1, i, 0]))
}

/// Deduplicates vertex keys into a compact vertex stream
pub struct VertexDeduplicator<K> {
    index_map: HashMap<K, u32>,
    indices: Vec<u32>,
}

impl<K: Eq + Hash> Default for VertexDeduplicator<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> VertexDeduplicator<K> {
    /// Create an empty deduplicator
    pub fn new() -> Self {
        Self {
            index_map: HashMap::new(),
            indices: Vec::new(),
        }
    }

    /// Emit an index for `key`; returns true when the key is new and the
    /// caller must append the vertex
    pub fn push(&mut self, key: K) -> bool {
        #[allow(clippy::cast_possible_truncation)]
        let next = self.index_map.len() as u32;
        let index = *self.index_map.entry(key).or_insert(next);
        self.indices.push(index);
        index == next
    }

    /// Number of unique vertices
    pub fn vertex_count(&self) -> usize {
        self.index_map.len()
    }

    /// Finish and return the index buffer
    pub fn into_indices(self) -> Vec<u32> {
        self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounds_of_unit_tetrahedron() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let bounds = BoundBox::from_points(&points);
        assert_eq!(bounds.bound_min, Vec3::zeros());
        assert_eq!(bounds.bound_max, Vec3::repeat(1.0));
        assert_relative_eq!(bounds.radius, 3.0_f32.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(bounds.bound_center, Vec3::repeat(0.5));
    }

    #[test]
    fn test_empty_bounds() {
        let bounds = BoundBox::from_points(std::iter::empty::<&Vec3>());
        assert_eq!(bounds, BoundBox::default());
    }

    #[test]
    fn test_fan_triangulation() {
        assert_eq!(triangulate_polygon(3).collect::<Vec<_>>(), vec![[0, 1, 2]]);
        assert_eq!(triangulate_polygon(4).collect::<Vec<_>>(), vec![[0, 1, 2], [2, 3, 0]]);
        assert_eq!(
            triangulate_polygon(5).collect::<Vec<_>>(),
            vec![[0, 1, 2], [2, 3, 0], [3, 4, 0]]
        );
        assert_eq!(triangulate_polygon(2).count(), 0);
    }

    #[test]
    fn test_deduplicator_reuses_indices() {
        let mut dedup = VertexDeduplicator::new();
        assert!(dedup.push((0, 0)));
        assert!(dedup.push((1, 0)));
        assert!(!dedup.push((0, 0)));
        assert_eq!(dedup.vertex_count(), 2);
        assert_eq!(dedup.into_indices(), vec![0, 1, 0]);
    }

    #[test]
    fn test_interpolation_parse() {
        assert_eq!(Interpolation::parse("LINEAR"), Interpolation::Linear);
        assert_eq!(Interpolation::parse("bezier"), Interpolation::Bezier);
        assert_eq!(Interpolation::parse("STEP"), Interpolation::Step);
        assert_eq!(Interpolation::parse("HERMITE"), Interpolation::Linear);
    }
}
