//! Render info gathering and culling
//!
//! Each pass walks the actors, asks a culling predicate about every
//! geometry and collects the survivors as [`RenderInfo`] values. Predicates
//! return `true` when the geometry should be skipped.

use std::sync::Arc;

use crate::foundation::math::{constants, Vec3};
use crate::scene::{Actor, ActorHandle};

use super::camera::Camera;
use super::geometry::Geometry;
use super::light::{MainLight, PointLight};
use super::material::{Material, MaterialInstance};

/// One geometry of one actor queued for a pass
#[derive(Debug, Clone)]
pub struct RenderInfo {
    /// Owning actor
    pub actor: ActorHandle,
    /// Geometry index inside the actor's mesh
    pub geometry_index: usize,
    /// Geometry to draw
    pub geometry: Arc<Geometry>,
    /// Material of the instance, if any
    pub material: Option<Arc<Material>>,
    /// Material instance bound to the geometry
    pub material_instance: Option<Arc<MaterialInstance>>,
}

impl RenderInfo {
    /// Material id used for state sorting
    pub fn material_id(&self) -> Option<usize> {
        self.material.as_ref().map(|material| material.id)
    }

    /// Whether this item belongs to the translucent queue
    pub fn is_translucent(&self) -> bool {
        self.material_instance
            .as_ref()
            .is_some_and(|instance| instance.is_translucent())
    }
}

/// Geometry level culling predicate; `true` culls
pub type CullingFn = fn(&Camera, &MainLight, &Actor, &Geometry) -> bool;

/// Never culls
pub fn always_pass(_camera: &Camera, _light: &MainLight, _actor: &Actor, _geometry: &Geometry) -> bool {
    false
}

/// Cull a whole actor whose bounding sphere lies outside the camera's
/// bounding cone
pub fn cone_sphere_culling_actor(camera: &Camera, actor: &Actor) -> bool {
    let mut to_actor = actor.transform.get_pos() - camera.position();
    let dist = to_actor.norm();
    if dist > 0.0 {
        to_actor /= dist;
    }

    let cos_angle = to_actor.dot(&(-camera.transform.front())).clamp(-1.0, 1.0);
    let rad = cos_angle.acos() - camera.half_cone();
    let projected_dist = dist * rad.sin();
    let radius = actor.bound_box().radius * actor.max_scale();

    (rad > 0.0 && radius < projected_dist) || (rad > constants::HALF_PI && radius < dist)
}

/// Cull a geometry whose bounding sphere is outside any side plane of the
/// camera frustum
pub fn view_frustum_culling_geometry(camera: &Camera, _light: &MainLight, actor: &Actor, geometry: &Geometry) -> bool {
    let to_geometry = actor.world_bound_center(geometry) - camera.position();
    let radius = actor.effective_radius(geometry);
    camera
        .frustum_vectors()
        .iter()
        .any(|plane| radius < plane.dot(&to_geometry))
}

/// Cull a geometry whose bounds fall entirely outside the shadow volume
pub fn shadow_culling(_camera: &Camera, light: &MainLight, actor: &Actor, geometry: &Geometry) -> bool {
    let to_clip = light.shadow_view_projection() * actor.transform.matrix();
    let mut minimum = Vec3::repeat(f32::MAX);
    let mut maximum = Vec3::repeat(f32::MIN);
    for corner in geometry.bound_box().corners() {
        let clip = to_clip.transform_point(&corner.into()).coords;
        minimum = minimum.inf(&clip);
        maximum = maximum.sup(&clip);
    }
    maximum.iter().any(|&x| x < -1.0) || minimum.iter().any(|&x| x > 1.0)
}

/// Append the visible geometries of `actors` to the output queues.
///
/// Translucent items go to `translucent` when given and are dropped
/// otherwise. Hidden actors are skipped.
pub fn gather_render_infos<'a>(
    culling: CullingFn,
    camera: &Camera,
    light: &MainLight,
    actors: impl IntoIterator<Item = (ActorHandle, &'a Actor)>,
    solid: &mut Vec<RenderInfo>,
    mut translucent: Option<&mut Vec<RenderInfo>>,
) {
    for (handle, actor) in actors {
        if !actor.visible {
            continue;
        }
        for (index, geometry) in actor.mesh().geometries().iter().enumerate() {
            if culling(camera, light, actor, geometry) {
                continue;
            }

            let material_instance = actor.material_instance(index).cloned();
            let render_info = RenderInfo {
                actor: handle,
                geometry_index: index,
                geometry: Arc::clone(geometry),
                material: material_instance.as_ref().map(|instance| Arc::clone(&instance.material)),
                material_instance,
            };

            if render_info.is_translucent() {
                if let Some(out) = translucent.as_deref_mut() {
                    out.push(render_info);
                }
            } else {
                solid.push(render_info);
            }
        }
    }
}

/// Stable sort by geometry then material
pub fn sort_render_infos(render_infos: &mut [RenderInfo]) {
    render_infos.sort_by_key(|info| (info.geometry.id(), info.material_id()));
}

/// Point light data submitted to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightInfo {
    /// World position
    pub position: Vec3,
    /// Linear colour
    pub color: Vec3,
    /// Influence radius
    pub radius: f32,
}

/// Point lights whose sphere touches the camera frustum, at most `max_count`
pub fn cull_point_lights<'a>(
    camera: &Camera,
    lights: impl IntoIterator<Item = &'a PointLight>,
    max_count: usize,
) -> Vec<PointLightInfo> {
    lights
        .into_iter()
        .filter(|light| {
            let to_light = light.transform.get_pos() - camera.position();
            camera
                .frustum_vectors()
                .iter()
                .all(|plane| plane.dot(&to_light) <= light.radius)
        })
        .take(max_count)
        .map(|light| PointLightInfo {
            position: light.transform.get_pos(),
            color: light.color,
            radius: light.radius,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::TypedHandleMap;
    use crate::scene::actor::tests::cube_model;
    use crate::scene::scene_data::{MainLightSaveData, PointLightSaveData};

    fn light() -> MainLight {
        let mut light = MainLight::from_save_data(&MainLightSaveData::default());
        light.update(Vec3::zeros());
        light
    }

    fn actor_at(name: &str, id: usize, translucent: bool, pos: Vec3) -> Actor {
        let mut actor = Actor::new_static(name, cube_model(name, id, translucent));
        actor.transform.set_pos(pos);
        actor.update(0.0);
        actor
    }

    #[test]
    fn test_frustum_culls_actor_behind_camera() {
        let camera = Camera::new("main");
        let light = light();
        let behind = actor_at("behind", 0, false, camera.position() + camera.transform.front() * 100.0);
        let geometry = Arc::clone(behind.geometry(0).unwrap());
        assert!(view_frustum_culling_geometry(&camera, &light, &behind, &geometry));

        let here = actor_at("here", 0, false, camera.position());
        assert!(!view_frustum_culling_geometry(&camera, &light, &here, &geometry));

        let ahead = actor_at("ahead", 0, false, camera.position() - camera.transform.front() * 100.0);
        assert!(!view_frustum_culling_geometry(&camera, &light, &ahead, &geometry));
    }

    #[test]
    fn test_culled_geometry_exceeds_a_plane() {
        let camera = Camera::new("main");
        let light = light();
        for pos in [Vec3::new(50.0, 0.0, -10.0), Vec3::new(0.0, -80.0, -5.0), Vec3::new(3.0, 2.0, -40.0)] {
            let actor = actor_at("probe", 0, false, pos);
            let geometry = Arc::clone(actor.geometry(0).unwrap());
            if view_frustum_culling_geometry(&camera, &light, &actor, &geometry) {
                let to_geometry = actor.world_bound_center(&geometry) - camera.position();
                let radius = actor.effective_radius(&geometry);
                assert!(camera.frustum_vectors().iter().any(|plane| plane.dot(&to_geometry) > radius));
            }
        }
    }

    #[test]
    fn test_cone_sphere_culling() {
        let camera = Camera::new("main");
        let ahead = actor_at("ahead", 0, false, Vec3::new(0.0, 0.0, -20.0));
        assert!(!cone_sphere_culling_actor(&camera, &ahead));
        let behind = actor_at("behind", 0, false, Vec3::new(0.0, 0.0, 20.0));
        assert!(cone_sphere_culling_actor(&camera, &behind));
        let beside = actor_at("beside", 0, false, Vec3::new(200.0, 0.0, -1.0));
        assert!(cone_sphere_culling_actor(&camera, &beside));
    }

    #[test]
    fn test_shadow_culling() {
        let camera = Camera::new("main");
        let light = light();
        let near = actor_at("near", 0, false, Vec3::zeros());
        let geometry = Arc::clone(near.geometry(0).unwrap());
        assert!(!shadow_culling(&camera, &light, &near, &geometry));

        let far = actor_at("far", 0, false, Vec3::new(1000.0, 0.0, 0.0));
        assert!(shadow_culling(&camera, &light, &far, &geometry));
    }

    #[test]
    fn test_gather_partitions_and_sorts() {
        let camera = Camera::new("main");
        let light = light();
        let mut actors = TypedHandleMap::new();
        let front = -camera.transform.front();
        let b = actors.insert(actor_at("b", 2, false, front * 5.0));
        let glass = actors.insert(actor_at("glass", 1, true, front * 6.0));
        let a = actors.insert(actor_at("a", 0, false, front * 7.0));
        let mut hidden = actor_at("hidden", 3, false, front * 8.0);
        hidden.visible = false;
        actors.insert(hidden);

        let gather = |translucent: bool| {
            let mut solid = Vec::new();
            let mut translucent_out = Vec::new();
            gather_render_infos(
                view_frustum_culling_geometry,
                &camera,
                &light,
                actors.iter(),
                &mut solid,
                translucent.then_some(&mut translucent_out),
            );
            sort_render_infos(&mut solid);
            (solid, translucent_out)
        };

        let (solid, translucent) = gather(true);
        let order: Vec<_> = solid.iter().map(|info| info.actor).collect();
        assert_eq!(order, vec![a, b]);
        assert_eq!(translucent.len(), 1);
        assert_eq!(translucent[0].actor, glass);

        let (again, _) = gather(true);
        let repeat: Vec<_> = again.iter().map(|info| (info.actor, info.geometry.id())).collect();
        let first: Vec<_> = solid.iter().map(|info| (info.actor, info.geometry.id())).collect();
        assert_eq!(first, repeat);

        let (shadow_solid, dropped) = gather(false);
        assert_eq!(shadow_solid.len(), 2);
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let camera = Camera::new("main");
        let light = light();
        let mut actors = TypedHandleMap::new();
        let front = -camera.transform.front();
        let first = actors.insert(actor_at("first", 4, false, front * 3.0));
        let second = actors.insert(actor_at("second", 4, false, front * 4.0));

        let mut solid = Vec::new();
        gather_render_infos(always_pass, &camera, &light, [(first, actors.get(first).unwrap()), (second, actors.get(second).unwrap())], &mut solid, None);
        sort_render_infos(&mut solid);
        assert_eq!(solid[0].actor, first);
        assert_eq!(solid[1].actor, second);
    }

    #[test]
    fn test_point_light_culling_and_cap() {
        let camera = Camera::new("main");
        let front = -camera.transform.front();
        let lights: Vec<PointLight> = [front * 10.0, front * 20.0, -front * 50.0, front * 30.0]
            .into_iter()
            .map(|pos| {
                let mut light = PointLight::from_save_data(&PointLightSaveData {
                    radius: 2.0,
                    ..Default::default()
                });
                light.transform.set_pos(pos);
                light
            })
            .collect();

        let visible = cull_point_lights(&camera, &lights, 10);
        assert_eq!(visible.len(), 3);
        assert!(visible.iter().all(|info| info.position.dot(&front) > 0.0));
        assert_eq!(cull_point_lights(&camera, &lights, 2).len(), 2);
    }
}
