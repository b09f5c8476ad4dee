//! Bone hierarchy
//!
//! Bones are stored in topological order: every parent index is smaller
//! than the index of its children, so a single forward pass visits parents
//! before children.

use std::collections::HashMap;

use thiserror::Error;

use crate::assets::mesh_data::SkeletonData;
use crate::foundation::math::Mat4;

/// Skeleton construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkeletonError {
    /// A bone refers to a parent that does not precede it
    #[error("Bone {bone} (index {index}) has parent {parent}, which does not precede it")]
    ParentOrder {
        /// Bone name
        bone: String,
        /// Bone index
        index: usize,
        /// Parent index
        parent: usize,
    },

    /// Two bones share a name
    #[error("Duplicate bone name: {0}")]
    DuplicateName(String),
}

/// One bone of a skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Unique name within the skeleton
    pub name: String,
    /// Position in the skeleton's bone list
    pub index: usize,
    /// Parent bone index, `None` for roots
    pub parent: Option<usize>,
    /// Bind-pose world to bone space
    pub inverse_bind_matrix: Mat4,
}

/// Ordered bones with parent links and a name lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    name: String,
    bones: Vec<Bone>,
    bone_map: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
}

impl Skeleton {
    /// Build a skeleton from `(name, parent, inverse_bind)` triples
    pub fn new(
        name: impl Into<String>,
        bones: impl IntoIterator<Item = (String, Option<usize>, Mat4)>,
    ) -> Result<Self, SkeletonError> {
        let mut skeleton = Self {
            name: name.into(),
            bones: Vec::new(),
            bone_map: HashMap::new(),
            children: Vec::new(),
        };

        for (index, (bone_name, parent, inverse_bind_matrix)) in bones.into_iter().enumerate() {
            if let Some(parent) = parent {
                if parent >= index {
                    return Err(SkeletonError::ParentOrder {
                        bone: bone_name,
                        index,
                        parent,
                    });
                }
                skeleton.children[parent].push(index);
            }
            if skeleton.bone_map.insert(bone_name.clone(), index).is_some() {
                return Err(SkeletonError::DuplicateName(bone_name));
            }

            skeleton.children.push(Vec::new());
            skeleton.bones.push(Bone {
                name: bone_name,
                index,
                parent,
                inverse_bind_matrix,
            });
        }

        Ok(skeleton)
    }

    /// Build from loader output
    pub fn from_data(data: &SkeletonData) -> Result<Self, SkeletonError> {
        Self::new(
            data.name.clone(),
            data.bones
                .iter()
                .map(|bone| (bone.name.clone(), bone.parent, bone.inverse_bind_matrix)),
        )
    }

    /// Skeleton name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All bones in topological order
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Number of bones
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Bone by index
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Index of the bone called `name`
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_map.get(name).copied()
    }

    /// Indices of bones without a parent
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones.iter().filter(|b| b.parent.is_none()).map(|b| b.index)
    }

    /// Direct children of bone `index`
    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map_or(&[], Vec::as_slice)
    }

    /// Number of ancestors of bone `index`
    pub fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = self.bones.get(index).and_then(|b| b.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.bones[parent].parent;
        }
        depth
    }

    /// Depth-first preorder over every root's subtree
    pub fn traversal(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.bones.len());
        let mut stack: Vec<usize> = self.roots().collect();
        stack.reverse();
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.children(index).iter().rev());
        }
        order
    }
}
