//! Keyframed bone animation
//!
//! Keys hold precomputed skinning transforms, so sampling a frame yields
//! matrices that move bind-pose vertices straight into the animated pose.

use crate::assets::mesh_data::{AnimationData, AnimationNodeData, Interpolation};
use crate::foundation::math::{Mat4, Transform};

use super::skeleton::Skeleton;

/// Keys for one bone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationNode {
    /// Node name
    pub name: String,
    /// Target bone name
    pub target: String,
    /// Target bone index, resolved against the skeleton
    pub bone_index: Option<usize>,
    /// Key times, strictly ascending
    pub times: Vec<f32>,
    /// Skinning transform per key
    pub transforms: Vec<Transform>,
    /// Interpolation per key
    pub interpolations: Vec<Interpolation>,
    /// Incoming tangents
    pub in_tangents: Vec<f32>,
    /// Outgoing tangents
    pub out_tangents: Vec<f32>,
}

impl AnimationNode {
    /// Build from loader output
    pub fn from_data(data: &AnimationNodeData, bone_index: Option<usize>) -> Self {
        let mut node = Self {
            name: data.name.clone(),
            target: data.target.clone(),
            bone_index,
            times: data.times.clone(),
            transforms: data.transforms.clone(),
            interpolations: data.interpolations.clone(),
            in_tangents: data.in_tangents.clone(),
            out_tangents: data.out_tangents.clone(),
        };
        node.interpolations.resize(node.times.len(), Interpolation::Linear);
        if !node.has_ascending_times() {
            log::warn!("Animation node {} has unordered key times, ignoring its keys", node.name);
        }
        node
    }

    /// Whether the node has strictly ascending keys and its key lists agree in length
    pub fn is_valid(&self) -> bool {
        !self.times.is_empty()
            && self.times.len() == self.transforms.len()
            && self.times.len() == self.interpolations.len()
            && self.has_ascending_times()
    }

    fn has_ascending_times(&self) -> bool {
        self.times.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Number of keys
    pub fn frame_count(&self) -> usize {
        self.times.len()
    }

    /// Interpolated transform between key `frame` and the next key.
    ///
    /// Past the last key the node holds its last key. Invalid nodes yield
    /// the identity.
    pub fn get_transform(&self, frame: usize, next_frame: usize, rate: f32) -> Transform {
        if !self.is_valid() {
            return Transform::identity();
        }
        let last = self.frame_count() - 1;
        let frame = frame.min(last);
        let next_frame = next_frame.min(last);

        match self.interpolations[frame] {
            Interpolation::Step => self.transforms[frame],
            // bezier tangents are carried but sampled linearly
            Interpolation::Linear | Interpolation::Bezier => {
                self.transforms[frame].interpolate(&self.transforms[next_frame], rate)
            }
        }
    }
}

/// One animation clip: a node per bone of its skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    name: String,
    skeleton_name: String,
    nodes: Vec<AnimationNode>,
    frame_times: Vec<f32>,
    length: f32,
}

impl Animation {
    /// Build from loader output, resolving node targets against `skeleton`
    pub fn from_data(data: &AnimationData, skeleton: Option<&Skeleton>) -> Self {
        let nodes = data
            .nodes
            .iter()
            .map(|node| {
                let bone_index = skeleton.and_then(|s| s.bone_index(&node.target));
                AnimationNode::from_data(node, bone_index)
            })
            .collect();
        Self::new(data.name.clone(), data.skeleton_name.clone(), nodes)
    }

    /// Build from nodes; the frame timeline is taken from the longest node
    pub fn new(name: String, skeleton_name: String, nodes: Vec<AnimationNode>) -> Self {
        let frame_times = nodes
            .iter()
            .filter(|node| node.is_valid())
            .max_by_key(|node| node.frame_count())
            .map(|node| node.times.clone())
            .unwrap_or_default();
        let length = nodes
            .iter()
            .filter(|node| node.is_valid())
            .filter_map(|node| node.times.last().copied())
            .fold(0.0_f32, f32::max);

        Self {
            name,
            skeleton_name,
            nodes,
            frame_times,
            length,
        }
    }

    /// Animation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Skeleton the nodes are ordered for
    pub fn skeleton_name(&self) -> &str {
        &self.skeleton_name
    }

    /// Per-bone nodes
    pub fn nodes(&self) -> &[AnimationNode] {
        &self.nodes
    }

    /// Number of keys in the frame timeline
    pub fn frame_count(&self) -> usize {
        self.frame_times.len()
    }

    /// Key times of the frame timeline
    pub fn frame_times(&self) -> &[f32] {
        &self.frame_times
    }

    /// Last key time across all nodes
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Fractional frame index for `time`.
    ///
    /// The integer part is the key segment containing `time`, the fraction
    /// is the position inside it. Times past the last key map to the last
    /// frame.
    pub fn time_to_frame(&self, time: f32) -> f32 {
        let count = self.frame_count();
        if count < 2 {
            return 0.0;
        }

        let next = self.frame_times.partition_point(|&t| t <= time);
        if next == 0 {
            return 0.0;
        }
        if next >= count {
            #[allow(clippy::cast_precision_loss)]
            return (count - 1) as f32;
        }

        let start = self.frame_times[next - 1];
        let end = self.frame_times[next];
        let rate = if end > start { (time - start) / (end - start) } else { 0.0 };
        #[allow(clippy::cast_precision_loss)]
        let frame = (next - 1) as f32;
        frame + rate.clamp(0.0, 1.0)
    }

    /// Skinning matrices for a fractional `frame`, one per node.
    ///
    /// Frames wrap past the end of the timeline and the last key blends
    /// into the first.
    pub fn sample(&self, frame: f32) -> Vec<Mat4> {
        let mut transforms = Vec::with_capacity(self.nodes.len());
        self.sample_into(frame, &mut transforms);
        transforms
    }

    /// Like [`Animation::sample`], writing into an existing buffer
    pub fn sample_into(&self, frame: f32, out: &mut Vec<Mat4>) {
        out.clear();
        let count = self.frame_count().max(1);
        let frame = frame.max(0.0);
        let rate = frame.fract();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = frame.floor() as usize % count;
        let next = (index + 1) % count;

        out.extend(
            self.nodes
                .iter()
                .map(|node| node.get_transform(index, next, rate).to_matrix()),
        );
    }
}

/// Sampled skinning buffers of an animation, cached by frame
#[derive(Debug, Clone, Default)]
pub struct AnimationBuffer {
    last_frame: Option<f32>,
    transforms: Vec<Mat4>,
    prev_transforms: Vec<Mat4>,
}

impl AnimationBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Resample `animation` at `frame` unless that frame is already cached.
    ///
    /// The previous sample moves to the previous-frame buffer.
    pub fn update(&mut self, animation: &Animation, frame: f32) -> &[Mat4] {
        if self.last_frame != Some(frame) {
            std::mem::swap(&mut self.transforms, &mut self.prev_transforms);
            animation.sample_into(frame, &mut self.transforms);
            if self.prev_transforms.len() != self.transforms.len() {
                self.prev_transforms.clone_from(&self.transforms);
            }
            self.last_frame = Some(frame);
        }
        &self.transforms
    }

    /// Current skinning matrices
    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    /// Skinning matrices of the previous sample
    pub fn prev_transforms(&self) -> &[Mat4] {
        &self.prev_transforms
    }

    /// Frame of the cached sample
    pub fn last_frame(&self) -> Option<f32> {
        self.last_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Quat, Vec3};
    use approx::assert_relative_eq;

    fn node(target: &str, times: &[f32], positions: &[f32]) -> AnimationNode {
        AnimationNode {
            name: format!("clip_{target}"),
            target: target.to_string(),
            bone_index: None,
            times: times.to_vec(),
            transforms: positions.iter().map(|&x| Transform::from_position(Vec3::new(x, 0.0, 0.0))).collect(),
            interpolations: vec![Interpolation::Linear; times.len()],
            ..Default::default()
        }
    }

    fn clip() -> Animation {
        Animation::new(
            "clip".to_string(),
            "rig".to_string(),
            vec![node("root", &[0.0, 1.0, 3.0], &[0.0, 2.0, 6.0]), AnimationNode::default()],
        )
    }

    #[test]
    fn test_timeline() {
        let animation = clip();
        assert_eq!(animation.frame_count(), 3);
        assert_relative_eq!(animation.length(), 3.0);
        assert_eq!(animation.frame_times(), &[0.0, 1.0, 3.0]);
        assert!(animation.nodes()[0].is_valid());
        assert!(!animation.nodes()[1].is_valid());
    }

    #[test]
    fn test_unordered_keys_are_ignored() {
        let data = AnimationNodeData {
            name: "clip_arm".to_string(),
            target: "arm".to_string(),
            times: vec![0.0, 3.0, 1.0, 2.0],
            transforms: vec![Transform::identity(); 4],
            ..Default::default()
        };
        let unordered = AnimationNode::from_data(&data, None);
        assert!(!unordered.is_valid());
        assert_relative_eq!(unordered.get_transform(1, 2, 0.5).to_matrix(), Mat4::identity());

        let alone = Animation::new("bad".to_string(), "rig".to_string(), vec![unordered.clone()]);
        assert_eq!(alone.frame_count(), 0);
        assert_relative_eq!(alone.length(), 0.0);
        assert_relative_eq!(alone.time_to_frame(1.5), 0.0);

        let mixed = Animation::new(
            "mixed".to_string(),
            "rig".to_string(),
            vec![node("root", &[0.0, 1.0, 3.0], &[0.0, 2.0, 6.0]), unordered],
        );
        assert_eq!(mixed.frame_times(), &[0.0, 1.0, 3.0]);
        assert_relative_eq!(mixed.length(), 3.0);
        assert_relative_eq!(mixed.time_to_frame(2.0), 1.5);

        let repeated = node("root", &[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]);
        assert!(!repeated.is_valid());
    }

    #[test]
    fn test_time_to_frame() {
        let animation = clip();
        assert_relative_eq!(animation.time_to_frame(-1.0), 0.0);
        assert_relative_eq!(animation.time_to_frame(0.5), 0.5);
        assert_relative_eq!(animation.time_to_frame(2.0), 1.5);
        assert_relative_eq!(animation.time_to_frame(10.0), 2.0);
    }

    #[test]
    fn test_sample_interpolates_and_wraps() {
        let animation = clip();
        let matrices = animation.sample(1.5);
        assert_eq!(matrices.len(), 2);
        assert_relative_eq!(matrices[0].translation_part(), Vec3::new(4.0, 0.0, 0.0), epsilon = 1e-5);
        // empty node contributes identity
        assert_relative_eq!(matrices[1], Mat4::identity());

        // last key blends back into the first
        let wrapped = animation.sample(2.5);
        assert_relative_eq!(wrapped[0].translation_part(), Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
        let past_end = animation.sample(3.0);
        assert_relative_eq!(past_end[0].translation_part(), Vec3::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_is_slerped() {
        let mut rotating = node("root", &[0.0, 1.0], &[0.0, 0.0]);
        rotating.transforms[1].rotation = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        let animation = Animation::new("spin".to_string(), "rig".to_string(), vec![rotating]);

        let half = animation.sample(0.5);
        let expected = Mat4::rotation_y(std::f32::consts::FRAC_PI_4);
        assert_relative_eq!(half[0], expected, epsilon = 1e-5);
    }

    #[test]
    fn test_step_holds_previous_key() {
        let mut stepped = node("root", &[0.0, 1.0], &[0.0, 10.0]);
        stepped.interpolations = vec![Interpolation::Step; 2];
        let animation = Animation::new("step".to_string(), "rig".to_string(), vec![stepped]);
        let matrices = animation.sample(0.9);
        assert_relative_eq!(matrices[0].translation_part(), Vec3::zeros());
    }

    #[test]
    fn test_buffer_caches_last_frame() {
        let animation = clip();
        let mut buffer = AnimationBuffer::new();
        buffer.update(&animation, 1.0);
        assert_eq!(buffer.last_frame(), Some(1.0));
        assert_relative_eq!(buffer.transforms()[0].translation_part(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(buffer.prev_transforms()[0].translation_part(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);

        buffer.update(&animation, 0.0);
        assert_relative_eq!(buffer.transforms()[0].translation_part(), Vec3::zeros(), epsilon = 1e-5);
        assert_relative_eq!(buffer.prev_transforms()[0].translation_part(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
    }
}
