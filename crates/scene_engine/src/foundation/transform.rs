//! Transform object
//!
//! Euler-angle transform with lazy matrix updates and previous-frame
//! snapshots. Cameras, lights and actors all embed one.
//!
//! The world matrix composes as `translate * rotate * scale * local`. The
//! columns of the rotation matrix are the basis vectors of the object:
//! column 0 is `left`, column 1 is `up`, column 2 is `front`.

use std::fmt::Write as _;

use super::math::{constants, utils, Mat4, Vec3};

/// Position, Euler rotation and scale with cached matrices
#[derive(Debug, Clone, PartialEq)]
pub struct TransformObject {
    local: Option<Mat4>,

    pos: Vec3,
    rot: Vec3,
    scale: Vec3,

    prev_pos: Vec3,
    prev_rot: Vec3,
    prev_scale: Vec3,
    prev_pos_store: Vec3,

    left: Vec3,
    up: Vec3,
    front: Vec3,

    rotation_matrix: Mat4,
    matrix: Mat4,
    inverse_matrix: Mat4,
    prev_matrix: Mat4,
    prev_inverse_matrix: Mat4,

    updated: bool,
}

impl Default for TransformObject {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformObject {
    /// Create an identity transform
    pub fn new() -> Self {
        Self::with_local(None)
    }

    /// Create a transform with an optional local matrix applied before scale
    pub fn with_local(local: Option<Mat4>) -> Self {
        let mut transform = Self {
            local,
            pos: Vec3::zeros(),
            rot: Vec3::zeros(),
            scale: Vec3::repeat(1.0),
            prev_pos: Vec3::zeros(),
            prev_rot: Vec3::zeros(),
            prev_scale: Vec3::repeat(1.0),
            prev_pos_store: Vec3::zeros(),
            left: Vec3::from(constants::WORLD_LEFT),
            up: Vec3::from(constants::WORLD_UP),
            front: Vec3::from(constants::WORLD_FRONT),
            rotation_matrix: Mat4::identity(),
            matrix: Mat4::identity(),
            inverse_matrix: Mat4::identity(),
            prev_matrix: Mat4::identity(),
            prev_inverse_matrix: Mat4::identity(),
            updated: true,
        };
        transform.update_transform(true, true);
        transform
    }

    /// Reset to origin, no rotation and unit scale
    pub fn reset_transform(&mut self) {
        self.updated = true;
        self.pos = Vec3::zeros();
        self.rot = Vec3::zeros();
        self.scale = Vec3::repeat(1.0);
        self.update_transform(true, true);
    }

    /// Copy position, rotation and scale from another transform
    pub fn copy_from(&mut self, other: &Self) {
        self.pos = other.pos;
        self.rot = other.rot;
        self.scale = other.scale;
        self.update_transform(true, true);
    }

    /// Replace the local matrix; the next update recomputes the world matrix
    pub fn set_local_matrix(&mut self, local: Option<Mat4>) {
        self.local = local;
        self.update_transform(true, true);
    }

    // Translation

    /// Current position
    pub fn get_pos(&self) -> Vec3 {
        self.pos
    }

    /// Position before the last positional change
    pub fn get_prev_pos(&self) -> Vec3 {
        self.prev_pos_store
    }

    /// Set position
    pub fn set_pos(&mut self, pos: Vec3) {
        self.pos = pos;
    }

    /// Set the x coordinate
    pub fn set_pos_x(&mut self, x: f32) {
        self.pos.x = x;
    }

    /// Set the y coordinate
    pub fn set_pos_y(&mut self, y: f32) {
        self.pos.y = y;
    }

    /// Set the z coordinate
    pub fn set_pos_z(&mut self, z: f32) {
        self.pos.z = z;
    }

    /// Move by a world-space offset
    pub fn move_pos(&mut self, offset: Vec3) {
        self.pos += offset;
    }

    /// Move along world X
    pub fn move_x(&mut self, amount: f32) {
        self.pos.x += amount;
    }

    /// Move along world Y
    pub fn move_y(&mut self, amount: f32) {
        self.pos.y += amount;
    }

    /// Move along world Z
    pub fn move_z(&mut self, amount: f32) {
        self.pos.z += amount;
    }

    /// Move along the current left vector
    pub fn move_left(&mut self, amount: f32) {
        self.pos += self.left * amount;
    }

    /// Move along the current up vector
    pub fn move_up(&mut self, amount: f32) {
        self.pos += self.up * amount;
    }

    /// Move along the current front vector
    pub fn move_front(&mut self, amount: f32) {
        self.pos += self.front * amount;
    }

    // Rotation

    /// Euler rotation (pitch, yaw, roll) in radians, each in `[0, 2π)`
    pub fn get_rotation(&self) -> Vec3 {
        self.rot
    }

    /// Rotation about X
    pub fn get_pitch(&self) -> f32 {
        self.rot.x
    }

    /// Rotation about Y
    pub fn get_yaw(&self) -> f32 {
        self.rot.y
    }

    /// Rotation about Z
    pub fn get_roll(&self) -> f32 {
        self.rot.z
    }

    /// Set all three Euler angles
    pub fn set_rotation(&mut self, rot: Vec3) {
        self.rot = rot.map(utils::wrap_angle);
    }

    /// Set rotation about X
    pub fn set_pitch(&mut self, pitch: f32) {
        self.rot.x = utils::wrap_angle(pitch);
    }

    /// Set rotation about Y
    pub fn set_yaw(&mut self, yaw: f32) {
        self.rot.y = utils::wrap_angle(yaw);
    }

    /// Set rotation about Z
    pub fn set_roll(&mut self, roll: f32) {
        self.rot.z = utils::wrap_angle(roll);
    }

    /// Add to all three Euler angles
    pub fn rotation(&mut self, delta: Vec3) {
        self.rotation_pitch(delta.x);
        self.rotation_yaw(delta.y);
        self.rotation_roll(delta.z);
    }

    /// Add to the pitch
    pub fn rotation_pitch(&mut self, delta: f32) {
        self.set_pitch(self.rot.x + delta);
    }

    /// Add to the yaw
    pub fn rotation_yaw(&mut self, delta: f32) {
        self.set_yaw(self.rot.y + delta);
    }

    /// Add to the roll
    pub fn rotation_roll(&mut self, delta: f32) {
        self.set_roll(self.rot.z + delta);
    }

    // Scale

    /// Current scale
    pub fn get_scale(&self) -> Vec3 {
        self.scale
    }

    /// Set scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Set the x scale
    pub fn set_scale_x(&mut self, x: f32) {
        self.scale.x = x;
    }

    /// Set the y scale
    pub fn set_scale_y(&mut self, y: f32) {
        self.scale.y = y;
    }

    /// Set the z scale
    pub fn set_scale_z(&mut self, z: f32) {
        self.scale.z = z;
    }

    /// Add to the scale
    pub fn scaling(&mut self, delta: Vec3) {
        self.scale += delta;
    }

    /// Add to the x scale
    pub fn scale_x(&mut self, delta: f32) {
        self.scale.x += delta;
    }

    /// Add to the y scale
    pub fn scale_y(&mut self, delta: f32) {
        self.scale.y += delta;
    }

    /// Add to the z scale
    pub fn scale_z(&mut self, delta: f32) {
        self.scale.z += delta;
    }

    // Derived values

    /// Basis vector along local +X
    pub fn left(&self) -> Vec3 {
        self.left
    }

    /// Basis vector along local +Y
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Basis vector along local +Z
    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// Rotation part of the world matrix
    pub fn rotation_matrix(&self) -> &Mat4 {
        &self.rotation_matrix
    }

    /// World matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Inverse world matrix, valid when updates request it
    pub fn inverse_matrix(&self) -> &Mat4 {
        &self.inverse_matrix
    }

    /// World matrix of the previous changed frame
    pub fn prev_matrix(&self) -> &Mat4 {
        &self.prev_matrix
    }

    /// Inverse world matrix of the previous changed frame
    pub fn prev_inverse_matrix(&self) -> &Mat4 {
        &self.prev_inverse_matrix
    }

    /// Whether the last update changed anything
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Recompute matrices for whatever changed since the last call.
    ///
    /// Previous matrices are stashed when this or the previous call saw a
    /// change, so a transform that stops moving reports identical current
    /// and previous matrices one frame later. Returns whether anything
    /// changed.
    pub fn update_transform(&mut self, update_inverse: bool, force_update: bool) -> bool {
        let prev_updated = self.updated;
        self.updated = false;

        if self.prev_pos != self.pos || force_update {
            self.prev_pos_store = self.prev_pos;
            self.prev_pos = self.pos;
            self.updated = true;
        }

        if self.prev_rot != self.rot || force_update {
            self.prev_rot = self.rot;
            self.updated = true;
            self.update_rotation_matrix();
        }

        if self.prev_scale != self.scale || force_update {
            self.prev_scale = self.scale;
            self.updated = true;
        }

        if prev_updated || self.updated {
            self.prev_matrix = self.matrix;
            if update_inverse {
                self.prev_inverse_matrix = self.inverse_matrix;
            }
        }

        if self.updated {
            let translate = Mat4::new_translation(&self.pos);
            let scale = Mat4::new_nonuniform_scaling(&self.scale);
            let local = self.local.unwrap_or_else(Mat4::identity);
            self.matrix = translate * self.rotation_matrix * scale * local;

            if update_inverse {
                self.inverse_matrix = self.compute_inverse();
            }
        }

        self.updated
    }

    fn compute_inverse(&self) -> Mat4 {
        let mut inverse = self.rotation_matrix.transpose() * Mat4::new_translation(&-self.pos);
        if self.scale.iter().all(|s| *s != 0.0) {
            inverse = Mat4::new_nonuniform_scaling(&self.scale.map(|s| 1.0 / s)) * inverse;
        }
        match self.local.and_then(|local| local.try_inverse()) {
            Some(local_inverse) => local_inverse * inverse,
            None => inverse,
        }
    }

    fn update_rotation_matrix(&mut self) {
        let (sb, cb) = self.rot.x.sin_cos();
        let (sh, ch) = self.rot.y.sin_cos();
        let (sa, ca) = self.rot.z.sin_cos();

        let left = Vec3::new(ch * ca, sa, -sh * ca);
        let up = Vec3::new(sh * sb - ch * sa * cb, ca * cb, sh * sa * cb + ch * sb);
        let front = Vec3::new(ch * sa * sb + sh * cb, -ca * sb, -sh * sa * sb + ch * cb);

        self.left = left.normalize();
        self.up = up.normalize();
        self.front = front.normalize();

        let mut rotation = Mat4::identity();
        rotation.fixed_view_mut::<3, 1>(0, 0).copy_from(&self.left);
        rotation.fixed_view_mut::<3, 1>(0, 1).copy_from(&self.up);
        rotation.fixed_view_mut::<3, 1>(0, 2).copy_from(&self.front);
        self.rotation_matrix = rotation;
    }

    /// Multi-line text summary for debug overlays
    pub fn transform_infos(&self) -> String {
        let fmt_vec = |v: &Vec3| format!("{:.2} {:.2} {:.2}", v.x, v.y, v.z);
        let mut text = String::new();
        let _ = writeln!(text, "\tPosition : {}", fmt_vec(&self.pos));
        let _ = writeln!(text, "\tRotation : {}", fmt_vec(&self.rot));
        let _ = writeln!(text, "\tFront : {}", fmt_vec(&self.front));
        let _ = writeln!(text, "\tLeft : {}", fmt_vec(&self.left));
        let _ = writeln!(text, "\tUp : {}", fmt_vec(&self.up));
        text.push_str("\tMatrix");
        for row in self.matrix.row_iter() {
            let _ = write!(text, "\n\t{:.2} {:.2} {:.2} {:.2}", row[0], row[1], row[2], row[3]);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::HALF_PI, constants::TAU, Vec4};
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_basis() {
        let transform = TransformObject::new();
        assert_relative_eq!(*transform.matrix(), Mat4::identity());
        assert_relative_eq!(transform.left(), Vec3::x());
        assert_relative_eq!(transform.up(), Vec3::y());
        assert_relative_eq!(transform.front(), Vec3::z());
    }

    #[test]
    fn test_composition_order() {
        let mut transform = TransformObject::new();
        transform.set_pos(Vec3::new(1.0, 2.0, 3.0));
        transform.set_scale(Vec3::repeat(2.0));
        transform.set_yaw(HALF_PI);
        assert!(transform.update_transform(true, false));

        // yaw by 90 degrees turns +X into -Z
        let p = transform.matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.xyz(), Vec3::new(1.0, 2.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(transform.front(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_matches_matrix() {
        let mut transform = TransformObject::new();
        transform.set_pos(Vec3::new(-4.0, 0.5, 9.0));
        transform.set_rotation(Vec3::new(0.3, 1.1, 2.0));
        transform.set_scale(Vec3::new(1.0, 2.0, 0.5));
        transform.update_transform(true, false);
        let product = transform.inverse_matrix() * transform.matrix();
        assert_relative_eq!(product, Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_wraps_into_range() {
        let mut transform = TransformObject::new();
        transform.set_yaw(-HALF_PI);
        assert_relative_eq!(transform.get_yaw(), 3.0 * HALF_PI, epsilon = 1e-6);
        transform.rotation_pitch(TAU + 0.25);
        assert_relative_eq!(transform.get_pitch(), 0.25, epsilon = 1e-5);
        let rot = transform.get_rotation();
        assert!(rot.iter().all(|r| (0.0..TAU).contains(r)));
    }

    #[test]
    fn test_basis_orthonormal() {
        let mut transform = TransformObject::new();
        transform.set_rotation(Vec3::new(0.7, 2.3, 5.1));
        transform.update_transform(false, false);
        let (l, u, f) = (transform.left(), transform.up(), transform.front());
        assert_relative_eq!(l.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(f.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(l.dot(&u), 0.0, epsilon = 1e-5);
        assert_relative_eq!(u.dot(&f), 0.0, epsilon = 1e-5);
        assert_relative_eq!(f.dot(&l), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_prev_matrix_tracks_one_frame_behind() {
        let mut transform = TransformObject::new();
        transform.update_transform(false, false);
        transform.update_transform(false, false);
        assert!(!transform.is_updated());

        transform.move_x(5.0);
        assert!(transform.update_transform(false, false));
        assert_relative_eq!(*transform.prev_matrix(), Mat4::identity());
        assert_relative_eq!(transform.get_prev_pos(), Vec3::zeros());

        // the frame after a change snapshots the settled matrix
        assert!(!transform.update_transform(false, false));
        assert_relative_eq!(*transform.prev_matrix(), *transform.matrix());
    }

    #[test]
    fn test_move_front_uses_basis() {
        let mut transform = TransformObject::new();
        transform.set_yaw(HALF_PI);
        transform.update_transform(false, false);
        transform.move_front(2.0);
        assert_relative_eq!(transform.get_pos(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_reset_and_infos() {
        let mut transform = TransformObject::new();
        transform.set_pos(Vec3::new(1.0, 1.0, 1.0));
        transform.update_transform(false, false);
        transform.reset_transform();
        assert_relative_eq!(*transform.matrix(), Mat4::identity());
        assert!(transform.transform_infos().contains("Position : 0.00 0.00 0.00"));
    }
}
