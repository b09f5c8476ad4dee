//! # Scene Engine
//!
//! Real-time 3D scene engine core: COLLADA and OBJ loading, skeletal
//! animation, culled render queues, a named render target pool and a
//! windowing backend seam.
//!
//! ## Features
//!
//! - **Assets**: COLLADA geometry, skins and animations; Wavefront OBJ
//! - **Animation**: precomputed per-bone skinning transforms, interpolated on playback
//! - **Scene**: named cameras, lights, actors and environment objects with save data
//! - **Render targets**: named targets plus a temporary pool keyed by size and format
//! - **Input**: normalized events and per-tick input state behind [`input::EventBackend`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct Viewer;
//!
//! impl Application for Viewer {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let model = engine.resources_mut().load_mesh_file("assets/cube.obj")?;
//!         engine.scene_mut().add_object_here(model);
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::headless(EngineConfig::default())?;
//!     let mut backend = HeadlessBackend::new().with_frame_limit(60);
//!     engine.run(&mut backend, &mut Viewer)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod config;
pub mod core;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{Animation, Skeleton},
        assets::{AssetError, ResourceManager},
        core::{Config, EngineConfig},
        foundation::{
            math::{Mat4, Vec3},
            time::{Stopwatch, Timer},
            transform::TransformObject,
        },
        input::{Event, EventBackend, HeadlessBackend, InputMode, InputState, Keycode, MouseButton},
        render::{Camera, HeadlessRenderer, Model, RenderTargetManager, SceneRenderer},
        scene::{ActorHandle, SceneError, SceneManager, SceneSaveData},
        AppError, Application, Engine, EngineError,
    };
}
