//! Drawable vertex streams
//!
//! A [`Geometry`] is immutable once built. Streams are kept as typed
//! vectors for CPU work (bounds, culling) and exposed as byte slices for
//! upload.

use crate::assets::mesh_data::{BoundBox, GeometryData, MAX_BONE_INFLUENCES};
use crate::foundation::math::{Vec2, Vec3, Vec4};

/// Floats per interleaved vertex: position, normal, texcoord
pub const VERTEX_FLOATS: usize = 3 + 3 + 2;

/// One vertex stream set
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    id: usize,
    name: String,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    colors: Vec<Vec4>,
    texcoords: Vec<Vec2>,
    indices: Vec<u32>,
    skeleton_name: Option<String>,
    bone_indices: Vec<[u32; MAX_BONE_INFLUENCES]>,
    bone_weights: Vec<[f32; MAX_BONE_INFLUENCES]>,
    bound_box: BoundBox,
}

impl Geometry {
    /// Take ownership of loader output under a sort id
    pub fn from_data(id: usize, data: GeometryData) -> Self {
        let bound_box = if data.bound_box == BoundBox::default() && !data.positions.is_empty() {
            BoundBox::from_points(&data.positions)
        } else {
            data.bound_box
        };
        Self {
            id,
            name: data.name,
            positions: data.positions,
            normals: data.normals,
            colors: data.colors,
            texcoords: data.texcoords,
            indices: data.indices,
            skeleton_name: data.skeleton_name,
            bone_indices: data.bone_indices,
            bone_weights: data.bone_weights,
            bound_box,
        }
    }

    /// Sort key, unique per resource manager
    pub fn id(&self) -> usize {
        self.id
    }

    /// Geometry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertex positions
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Unit normals
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Vertex colours, may be empty
    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    /// Texture coordinates, may be empty
    pub fn texcoords(&self) -> &[Vec2] {
        &self.texcoords
    }

    /// Triangle list
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Skeleton the bone indices refer to
    pub fn skeleton_name(&self) -> Option<&str> {
        self.skeleton_name.as_deref()
    }

    /// Four bone indices per vertex
    pub fn bone_indices(&self) -> &[[u32; MAX_BONE_INFLUENCES]] {
        &self.bone_indices
    }

    /// Four bone weights per vertex
    pub fn bone_weights(&self) -> &[[f32; MAX_BONE_INFLUENCES]] {
        &self.bone_weights
    }

    /// Bounds of the positions
    pub fn bound_box(&self) -> &BoundBox {
        &self.bound_box
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Whether bone streams are present
    pub fn has_skinning(&self) -> bool {
        self.skeleton_name.is_some() && self.bone_indices.len() == self.positions.len()
    }

    /// Interleaved `position, normal, texcoord` floats
    ///
    /// Missing normals or texcoords are written as zeros.
    pub fn interleaved_vertices(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertex_count() * VERTEX_FLOATS);
        for (i, position) in self.positions.iter().enumerate() {
            let normal = self.normals.get(i).copied().unwrap_or_else(Vec3::zeros);
            let texcoord = self.texcoords.get(i).copied().unwrap_or_else(Vec2::zeros);
            out.extend_from_slice(position.as_slice());
            out.extend_from_slice(normal.as_slice());
            out.extend_from_slice(texcoord.as_slice());
        }
        out
    }

    /// Interleaved vertex stream as bytes
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.interleaved_vertices()).to_vec()
    }

    /// Index stream as bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Bone index stream as bytes
    pub fn bone_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bone_indices)
    }

    /// Bone weight stream as bytes
    pub fn bone_weight_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bone_weights)
    }
}
