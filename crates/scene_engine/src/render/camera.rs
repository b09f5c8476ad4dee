//! # Scene camera
//!
//! Perspective camera driven by a [`TransformObject`]. The camera looks
//! along `-front` (OpenGL view space looks down `-Z`), so the view matrix is
//! the inverse of the transform's world matrix.
//!
//! Besides the usual matrices the camera keeps:
//! - previous-frame copies of view, projection and view-projection
//! - a view matrix without translation (`view_origin`), used for sky
//!   rendering and for the side planes of the frustum
//! - the outward normals of the four frustum side planes
//! - the half angle of a cone enclosing the frustum

use crate::core::CameraConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::foundation::transform::TransformObject;
use crate::scene::scene_data::{CameraSaveData, TransformSaveData};

/// Perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    /// Unique camera name
    pub name: String,
    /// Placement
    pub transform: TransformObject,

    /// Scene units per meter
    pub meter_per_unit: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near plane
    pub near: f32,
    /// Far plane
    pub far: f32,
    /// Width over height
    pub aspect: f32,
    /// Keyboard movement speed
    pub move_speed: f32,
    /// Middle-button pan speed
    pub pan_speed: f32,
    /// Right-button rotation speed
    pub rotation_speed: f32,

    projection: Mat4,
    prev_projection: Mat4,
    view: Mat4,
    prev_view: Mat4,
    view_origin: Mat4,
    prev_view_origin: Mat4,
    view_projection: Mat4,
    prev_view_projection: Mat4,
    frustum_vectors: [Vec3; 4],
    half_cone: f32,
}

impl Camera {
    /// Create a camera at the origin
    pub fn new(name: impl Into<String>) -> Self {
        let mut camera = Self {
            name: name.into(),
            transform: TransformObject::new(),
            meter_per_unit: 1.0,
            fov: 60.0,
            near: 0.1,
            far: 2000.0,
            aspect: 1.0,
            move_speed: 1.0,
            pan_speed: 1.0,
            rotation_speed: 0.005,
            projection: Mat4::identity(),
            prev_projection: Mat4::identity(),
            view: Mat4::identity(),
            prev_view: Mat4::identity(),
            view_origin: Mat4::identity(),
            prev_view_origin: Mat4::identity(),
            view_projection: Mat4::identity(),
            prev_view_projection: Mat4::identity(),
            frustum_vectors: [Vec3::zeros(); 4],
            half_cone: 0.0,
        };
        camera.update_projection(None, None, true);
        camera.update(true);
        camera
    }

    /// Create from save data
    pub fn from_save_data(data: &CameraSaveData) -> Self {
        let mut camera = Self::new(data.name.clone());
        camera.fov = data.fov;
        camera.near = data.near;
        camera.far = data.far;
        data.transform.apply(&mut camera.transform);
        camera.update_projection(None, None, true);
        camera.update(true);
        camera
    }

    /// Capture save data
    pub fn save_data(&self) -> CameraSaveData {
        CameraSaveData {
            name: self.name.clone(),
            transform: TransformSaveData::from_transform(&self.transform),
            fov: self.fov,
            near: self.near,
            far: self.far,
        }
    }

    /// Take clip range, field of view and navigation speeds from `config`
    pub fn apply_config(&mut self, config: &CameraConfig) {
        self.meter_per_unit = config.meter_per_unit;
        self.near = config.near;
        self.far = config.far;
        self.move_speed = config.move_speed;
        self.pan_speed = config.pan_speed;
        self.rotation_speed = config.rotation_speed;
        self.update_projection(Some(config.fov), None, true);
    }

    /// Rebuild the projection when `fov` or `aspect` changed, or when forced
    pub fn update_projection(&mut self, fov: Option<f32>, aspect: Option<f32>, force: bool) {
        let fov = fov.unwrap_or(self.fov);
        let aspect = aspect.unwrap_or(self.aspect);
        if !force && (fov - self.fov).abs() <= f32::EPSILON && (aspect - self.aspect).abs() <= f32::EPSILON {
            return;
        }

        self.fov = fov;
        self.aspect = aspect;
        self.projection = Mat4::perspective(self.fov, self.aspect, self.near, self.far);
        let tan_half = (self.fov.to_radians() * 0.5).tan();
        self.half_cone = (tan_half * self.aspect.mul_add(self.aspect, 1.0).sqrt()).atan();
        self.update_frustum_vectors();
        self.view_projection = self.projection * self.view;
    }

    /// Update view matrices from the transform.
    ///
    /// Previous-frame copies are taken before recomputing. Returns whether
    /// the camera moved.
    pub fn update(&mut self, force: bool) -> bool {
        self.prev_projection = self.projection;
        self.prev_view = self.view;
        self.prev_view_origin = self.view_origin;
        self.prev_view_projection = self.view_projection;

        let updated = self.transform.update_transform(true, force);
        if updated || force {
            self.view = *self.transform.inverse_matrix();
            self.view_origin = self.view;
            self.view_origin.fixed_view_mut::<3, 1>(0, 3).fill(0.0);
            self.view_projection = self.projection * self.view;
            self.update_frustum_vectors();
        }
        updated
    }

    /// Gribb-Hartmann side planes of `projection * view_origin`, as
    /// outward unit normals: left, right, bottom, top
    fn update_frustum_vectors(&mut self) {
        let m = self.projection * self.view_origin;
        let row = |i: usize| Vec3::new(m[(i, 0)], m[(i, 1)], m[(i, 2)]);
        let (r0, r1, r3) = (row(0), row(1), row(3));
        let inward = [r3 + r0, r3 - r0, r3 + r1, r3 - r1];
        for (vector, plane) in self.frustum_vectors.iter_mut().zip(inward) {
            *vector = -plane.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros);
        }
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.transform.get_pos()
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Projection of the previous frame
    pub fn prev_projection(&self) -> &Mat4 {
        &self.prev_projection
    }

    /// World to view matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// View matrix of the previous frame
    pub fn prev_view(&self) -> &Mat4 {
        &self.prev_view
    }

    /// View matrix without translation
    pub fn view_origin(&self) -> &Mat4 {
        &self.view_origin
    }

    /// Translation-free view of the previous frame
    pub fn prev_view_origin(&self) -> &Mat4 {
        &self.prev_view_origin
    }

    /// `projection * view`
    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// View-projection of the previous frame
    pub fn prev_view_projection(&self) -> &Mat4 {
        &self.prev_view_projection
    }

    /// Outward normals of the left, right, bottom and top planes
    pub fn frustum_vectors(&self) -> &[Vec3; 4] {
        &self.frustum_vectors
    }

    /// Half angle in radians of the cone enclosing the frustum
    pub fn half_cone(&self) -> f32 {
        self.half_cone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        let mut camera = Camera::new("main");
        camera.update_projection(Some(90.0), Some(1.0), false);
        camera
    }

    #[test]
    fn test_view_is_inverse_of_transform() {
        let mut camera = camera();
        camera.transform.set_pos(Vec3::new(1.0, 2.0, 3.0));
        assert!(camera.update(false));
        let eye = camera.view() * Vec4::new(1.0, 2.0, 3.0, 1.0);
        assert_relative_eq!(eye, Vec4::new(0.0, 0.0, 0.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(camera.view_origin().translation_part(), Vec3::zeros());
    }

    #[test]
    fn test_previous_frame_copies() {
        let mut camera = camera();
        camera.transform.set_pos(Vec3::new(0.0, 0.0, 5.0));
        camera.update(false);
        let first_view = *camera.view();
        camera.transform.set_pos(Vec3::new(0.0, 0.0, 10.0));
        camera.update(false);
        assert_relative_eq!(*camera.prev_view(), first_view);
        assert!((camera.view() - first_view).norm() > 1.0);
    }

    #[test]
    fn test_frustum_vectors_point_outward() {
        let camera = camera();
        // camera looks down -Z; a point ahead is inside every side plane
        let ahead = Vec3::new(0.0, 0.0, -10.0);
        for normal in camera.frustum_vectors() {
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-5);
            assert!(normal.dot(&ahead) < 0.0);
        }
        // with a 90 degree fov the left plane normal is (-1, 0, 1) / sqrt(2)
        let left = camera.frustum_vectors()[0];
        assert_relative_eq!(left, Vec3::new(-1.0, 0.0, 1.0).normalize(), epsilon = 1e-5);
    }

    #[test]
    fn test_half_cone() {
        let camera = camera();
        let expected = 2.0_f32.sqrt().atan();
        assert_relative_eq!(camera.half_cone(), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_save_data_round_trip() {
        let mut camera = camera();
        camera.transform.set_pos(Vec3::new(4.0, 5.0, 6.0));
        camera.update(false);
        let restored = Camera::from_save_data(&camera.save_data());
        assert_relative_eq!(restored.position(), Vec3::new(4.0, 5.0, 6.0));
        assert_relative_eq!(restored.fov, 90.0);
    }
}
