//! Scene management
//!
//! ```text
//! ResourceManager (shared Models)
//!      ↓
//! SceneManager (actors, cameras, lights) ── culling ──→ RenderQueues
//!      ↓
//! SceneRenderer
//! ```
//!
//! Actors hold an `Arc<Model>` from the resource manager and their own
//! transform, instancing and animation state. The scene manager owns every
//! object by name and rebuilds the per-pass render queues each frame.

pub mod actor;
pub mod scene_data;
pub mod scene_manager;

pub use actor::{Actor, ActorKind, Instancing, RangeVariable, SkeletonState};
pub use scene_data::{
    ActorSaveData, AtmosphereSaveData, CameraSaveData, EffectSaveData, InstancingSaveData, LightProbeSaveData,
    MainLightSaveData, OceanSaveData, PointLightSaveData, SceneSaveData, TransformSaveData,
};
pub use scene_manager::{
    ActorHandle, ObjectKind, RenderQueues, SceneError, SceneListener, SceneManager, SceneObject, SceneState,
};
