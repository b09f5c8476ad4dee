//! Asset loading
//!
//! Loaders turn mesh files into plain [`MeshData`]; the [`ResourceManager`]
//! converts that into the shared runtime types.

pub mod collada;
pub mod mesh_data;
pub mod obj_loader;
pub mod resource_manager;

pub use collada::{Collada, ColladaError, UpAxis};
pub use mesh_data::{BoundBox, GeometryData, MeshData};
pub use obj_loader::{ObjError, ObjLoader};
pub use resource_manager::{ResourceConfig, ResourceManager};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// IO error outside a loader
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// COLLADA document rejected
    #[error("COLLADA error: {0}")]
    Collada(#[from] ColladaError),

    /// OBJ file rejected
    #[error("OBJ error: {0}")]
    Obj(#[from] ObjError),

    /// No loader for this file
    #[error("Unknown mesh file extension: {0}")]
    UnknownExtension(String),
}
