//! Asset loading: meshes and images
//!
//! Loaders produce the engine's CPU-side types ([`crate::geometry::Geometry`],
//! [`crate::rhi::TextureDesc`]); uploading them to the GPU stays the caller's
//! job, so asset IO never touches the render interface.

pub mod image_loader;
pub mod obj_loader;

pub use image_loader::{checker_texture, load_texture, ImageError};
pub use obj_loader::{ObjError, ObjLoader};
