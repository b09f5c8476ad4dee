//! Skeletal animation
//!
//! [`Skeleton`] holds bones in parent-first order; [`Animation`] samples
//! precomputed skinning transforms per bone.

pub mod clip;
pub mod skeleton;

pub use clip::{Animation, AnimationBuffer, AnimationNode};
pub use skeleton::{Bone, Skeleton, SkeletonError};
