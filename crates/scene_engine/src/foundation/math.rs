//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics and animation.
//!
//! All matrices use the column-vector convention: a point is transformed as
//! `M * p`, and a world matrix composes as `translate * rotate * scale`.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
///
/// Used as the decomposed keyframe representation of bone animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (`T * R * S`)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine matrix into position, rotation and scale
    ///
    /// Shear is discarded. Axes with zero length keep a unit scale so the
    /// rotation extraction stays finite.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let axis_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31);
        let axis_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32);
        let axis_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33);
        let scale = Vec3::new(
            non_zero_or_one(axis_x.magnitude()),
            non_zero_or_one(axis_y.magnitude()),
            non_zero_or_one(axis_z.magnitude()),
        );

        let rotation_matrix = Mat3::from_columns(&[
            axis_x / scale.x,
            axis_y / scale.y,
            axis_z / scale.z,
        ]);
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Interpolate between two transforms
    ///
    /// Position and scale are linearly interpolated, rotation takes the
    /// shortest spherical path.
    pub fn interpolate(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(&other.position, t),
            rotation: utils::quat_slerp(&self.rotation, &other.rotation, t),
            scale: self.scale.lerp(&other.scale, t),
        }
    }
}

fn non_zero_or_one(value: f32) -> f32 {
    if value.abs() > f32::EPSILON { value } else { 1.0 }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// World left axis
    pub const WORLD_LEFT: [f32; 3] = [1.0, 0.0, 0.0];

    /// World up axis
    pub const WORLD_UP: [f32; 3] = [0.0, 1.0, 0.0];

    /// World front axis
    pub const WORLD_FRONT: [f32; 3] = [0.0, 0.0, 1.0];
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Wrap an angle into `[0, 2π)`
    pub fn wrap_angle(radians: f32) -> f32 {
        if (0.0..constants::TAU).contains(&radians) {
            return radians;
        }
        let wrapped = radians.rem_euclid(constants::TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        if wrapped >= constants::TAU { 0.0 } else { wrapped }
    }

    /// Largest absolute component of a vector
    pub fn max_abs_component(v: &Vec3) -> f32 {
        v.x.abs().max(v.y.abs()).max(v.z.abs())
    }

    /// Spherical interpolation that never panics on opposite quaternions
    ///
    /// Takes the shortest arc and falls back to normalized lerp when the
    /// inputs are nearly parallel.
    pub fn quat_slerp(a: &Quat, b: &Quat, t: f32) -> Quat {
        let qa = a.as_ref().coords;
        let mut qb = b.as_ref().coords;
        let mut cos_theta = qa.dot(&qb);
        if cos_theta < 0.0 {
            qb = -qb;
            cos_theta = -cos_theta;
        }

        let blended = if cos_theta > 0.999_999 {
            qa * (1.0 - t) + qb * t
        } else {
            let theta = cos_theta.acos();
            let inv_sin = 1.0 / theta.sin();
            qa * (((1.0 - t) * theta).sin() * inv_sin) + qb * ((t * theta).sin() * inv_sin)
        };

        Quat::new_normalize(nalgebra::Quaternion::from(blended))
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create an OpenGL style perspective projection matrix
    ///
    /// `fov_y_degrees <= 0` falls back to 45 degrees and `near == far`
    /// falls back to a `[0, 1000]` depth range.
    fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create an OpenGL style orthographic projection matrix
    fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Translation part of an affine matrix
    fn translation_part(&self) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let (near, far) = if (far - near).abs() <= f32::EPSILON {
            (0.0, 1000.0)
        } else {
            (near, far)
        };
        let fov_y_degrees = if fov_y_degrees <= 0.0 { 45.0 } else { fov_y_degrees };
        let aspect = if aspect > 0.0 { aspect } else { 1.0 };

        let tan_half_fovy = (fov_y_degrees.to_radians() * 0.5).tan();
        let depth = far - near;

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = -(far + near) / depth;
        result[(2, 3)] = -2.0 * near * far / depth;
        result[(3, 2)] = -1.0;
        result
    }

    fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::identity();
        result[(0, 0)] = 2.0 / (right - left);
        result[(1, 1)] = 2.0 / (top - bottom);
        result[(2, 2)] = -2.0 / (far - near);
        result[(0, 3)] = -(right + left) / (right - left);
        result[(1, 3)] = -(top + bottom) / (top - bottom);
        result[(2, 3)] = -(far + near) / (far - near);
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new_translation(&-eye);

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self.m14, self.m24, self.m34)
    }
}
