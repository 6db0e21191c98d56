//! # PBR Engine
//!
//! A real-time physically based rendering engine over OpenGL. GPU resources
//! live behind typed handles in a render hardware interface
//! ([`rhi::RenderInterface`]); a [`renderer::Renderer`] sequences per-frame
//! uniform-buffer updates, material uploads, and draw calls against it.
//!
//! ## Features
//!
//! - **Handle-based RHI**: buffers, vertex arrays, programs, and textures
//!   behind generation-checked handles; stale handles are rejected, never
//!   dereferenced
//! - **Fixed-protocol renderer**: camera and light uniform blocks shared
//!   across programs, tone mapping applied once per frame
//! - **Scene graph**: cameras, shapes, and lights with monotonic aggregate
//!   bounds
//! - **PBR materials**: metallic/roughness workflow with environment maps
//! - **Asset loading**: OBJ meshes and common image formats
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pbr_engine::config::AppConfig;
//! use pbr_engine::renderer::Renderer;
//! use pbr_engine::rhi::{GlowBackend, RenderInterface};
//! use pbr_engine::scene::Scene;
//! use pbr_engine::window::Window;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let mut window = Window::new(&config.window)?;
//!
//!     let mut rhi = RenderInterface::new(Box::new(GlowBackend::new(window.load_gl())));
//!     rhi.initialize()?;
//!
//!     let mut renderer = Renderer::new(&config.renderer);
//!     renderer.prepare(&mut rhi)?;
//!
//!     let scene = Scene::new();
//!     let camera = scene.cameras().first().cloned().expect("scene has a camera");
//!
//!     while !window.should_close() {
//!         window.poll_events();
//!         if let Err(e) = renderer.render(&mut rhi, &scene, &camera) {
//!             log::error!("frame error: {e}");
//!         }
//!         window.swap_buffers();
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod geometry;
pub mod material;
pub mod renderer;
pub mod rhi;
pub mod scene;
pub mod window;

pub use config::AppConfig;
pub use geometry::{Geometry, Vertex};
pub use material::{Material, PbrMaterial};
pub use renderer::{Renderer, ToneOperator};
pub use rhi::{RenderInterface, RhiError, RhiResult};
pub use scene::{Camera, Light, Scene, Shape};
