//! Graphics backend implementations
//!
//! Contains the platform implementations of [`crate::rhi::GlApi`]. Currently
//! OpenGL through `glow`; the trait boundary leaves room for other backends.

mod glow_backend;

pub use glow_backend::GlowBackend;
