//! Lighting objects

use crate::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};
use crate::foundation::transform::TransformObject;
use crate::scene::scene_data::{LightProbeSaveData, MainLightSaveData, PointLightSaveData, TransformSaveData};

/// Directional light (like sunlight) that casts the scene's shadows
#[derive(Debug, Clone)]
pub struct MainLight {
    /// Light name
    pub name: String,
    /// Orientation; the light shines along `-front`
    pub transform: TransformObject,
    /// Colour with intensity in `w`
    pub color: Vec4,
    /// Half width of the shadow volume
    pub shadow_width: f32,
    /// Half height of the shadow volume
    pub shadow_height: f32,
    /// Half depth of the shadow volume
    pub shadow_depth: f32,
    shadow_projection: Mat4,
    shadow_view_projection: Mat4,
    changed: bool,
}

impl MainLight {
    /// Create from save data
    pub fn from_save_data(data: &MainLightSaveData) -> Self {
        let mut light = Self {
            name: data.name.clone(),
            transform: TransformObject::new(),
            color: Vec4::from(data.color),
            shadow_width: data.shadow_width,
            shadow_height: data.shadow_height,
            shadow_depth: data.shadow_depth,
            shadow_projection: Mat4::identity(),
            shadow_view_projection: Mat4::identity(),
            changed: true,
        };
        data.transform.apply(&mut light.transform);
        light.update_shadow_projection();
        light
    }

    /// Capture save data
    pub fn save_data(&self) -> MainLightSaveData {
        MainLightSaveData {
            name: self.name.clone(),
            transform: TransformSaveData::from_transform(&self.transform),
            color: self.color.into(),
            shadow_width: self.shadow_width,
            shadow_height: self.shadow_height,
            shadow_depth: self.shadow_depth,
        }
    }

    /// Rebuild the shadow volume projection after its extents changed
    pub fn update_shadow_projection(&mut self) {
        self.shadow_projection = Mat4::ortho(
            -self.shadow_width,
            self.shadow_width,
            -self.shadow_height,
            self.shadow_height,
            -self.shadow_depth,
            self.shadow_depth,
        );
        self.changed = true;
    }

    /// Recenter the shadow volume on the camera.
    ///
    /// `shadow_view_projection = ortho * light_view * translate(-camera_pos)`
    pub fn update(&mut self, camera_pos: Vec3) {
        self.changed |= self.transform.update_transform(true, false);
        let light_view = self.transform.inverse_matrix();
        self.shadow_view_projection =
            self.shadow_projection * light_view * Mat4::new_translation(&(-camera_pos));
    }

    /// Light direction (from the light towards the scene)
    pub fn direction(&self) -> Vec3 {
        -self.transform.front()
    }

    /// World to shadow clip space
    pub fn shadow_view_projection(&self) -> &Mat4 {
        &self.shadow_view_projection
    }

    /// Returns and resets whether the light changed since the last call
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

/// Point light (like a lightbulb)
#[derive(Debug, Clone)]
pub struct PointLight {
    /// Unique light name
    pub name: String,
    /// Placement
    pub transform: TransformObject,
    /// Light colour
    pub color: Vec3,
    /// Influence radius
    pub radius: f32,
}

impl PointLight {
    /// Create from save data
    pub fn from_save_data(data: &PointLightSaveData) -> Self {
        let mut light = Self {
            name: data.name.clone(),
            transform: TransformObject::new(),
            color: Vec3::from(data.color),
            radius: data.radius,
        };
        data.transform.apply(&mut light.transform);
        light.transform.update_transform(false, true);
        light
    }

    /// Capture save data
    pub fn save_data(&self) -> PointLightSaveData {
        PointLightSaveData {
            name: self.name.clone(),
            transform: TransformSaveData::from_transform(&self.transform),
            color: self.color.into(),
            radius: self.radius,
        }
    }

    /// Apply pending transform changes
    pub fn update(&mut self) {
        self.transform.update_transform(false, false);
    }
}

/// Environment capture point
#[derive(Debug, Clone)]
pub struct LightProbe {
    /// Unique probe name
    pub name: String,
    /// Placement
    pub transform: TransformObject,
}

impl LightProbe {
    /// Create from save data
    pub fn from_save_data(data: &LightProbeSaveData) -> Self {
        let mut probe = Self {
            name: data.name.clone(),
            transform: TransformObject::new(),
        };
        data.transform.apply(&mut probe.transform);
        probe.transform.update_transform(false, true);
        probe
    }

    /// Capture save data
    pub fn save_data(&self) -> LightProbeSaveData {
        LightProbeSaveData {
            name: self.name.clone(),
            transform: TransformSaveData::from_transform(&self.transform),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shadow_volume_follows_camera() {
        let mut light = MainLight::from_save_data(&MainLightSaveData {
            transform: TransformSaveData::default(),
            shadow_width: 10.0,
            shadow_height: 10.0,
            shadow_depth: 10.0,
            ..Default::default()
        });
        let camera_pos = Vec3::new(50.0, 0.0, 0.0);
        light.update(camera_pos);

        let at_camera = light.shadow_view_projection() * Vec4::new(50.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(at_camera.xyz(), Vec3::zeros(), epsilon = 1e-5);
        let edge = light.shadow_view_projection() * Vec4::new(60.0, 10.0, 0.0, 1.0);
        assert_relative_eq!(edge.xyz(), Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_changed_flag() {
        let mut light = MainLight::from_save_data(&MainLightSaveData::default());
        light.update(Vec3::zeros());
        assert!(light.take_changed());
        light.update(Vec3::zeros());
        assert!(!light.take_changed());
        light.transform.rotation_yaw(0.5);
        light.update(Vec3::zeros());
        assert!(light.take_changed());
    }

    #[test]
    fn test_point_light_save_data() {
        let data = PointLightSaveData {
            name: "lamp".to_string(),
            radius: 3.0,
            ..Default::default()
        };
        let light = PointLight::from_save_data(&data);
        assert_eq!(light.save_data(), data);
    }
}
