//! # Rendering
//!
//! Renderer-facing data of the engine: drawable assets, the camera and
//! lights, render target management and the per-frame gathering of render
//! infos. Graphics API access is kept behind two seams:
//!
//! - [`TextureDevice`] allocates texture storage for render targets
//! - [`SceneRenderer`] draws the queues the scene manager built
//!
//! Both have headless implementations so the whole pipeline runs without a
//! GPU.

pub mod camera;
pub mod device;
pub mod environment;
pub mod geometry;
pub mod light;
pub mod material;
pub mod mesh;
pub mod render_info;
pub mod render_target;
pub mod renderer;
pub mod spline;

pub use camera::Camera;
pub use device::{DeviceError, HeadlessDevice, TextureDevice, TextureHandle};
pub use environment::{Atmosphere, Ocean};
pub use geometry::Geometry;
pub use light::{LightProbe, MainLight, PointLight};
pub use material::{BlendMode, Material, MaterialInstance};
pub use mesh::{Mesh, Model};
pub use render_info::{CullingFn, PointLightInfo, RenderInfo};
pub use render_target::{
    FilterMode, InternalFormat, RenderTarget, RenderTargetDesc, RenderTargetError, RenderTargetKind,
    RenderTargetManager, RenderTargetNames, RenderTargetOption, WrapMode,
};
pub use renderer::{HeadlessRenderer, RenderError, RenderStats, SceneRenderer};
pub use spline::{Spline3D, SplinePoint};
