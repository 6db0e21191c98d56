//! Shader sources and program descriptions
//!
//! A [`ShaderSource`] is one GLSL stage; a [`Shader`] collects the compiled
//! stages of a program by name and is handed to
//! [`crate::rhi::RenderInterface::link_program`]. The built-in engine
//! shaders are embedded so the library works without an asset directory.

use std::path::Path;

use crate::rhi::error::{RhiError, RhiResult};

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
    /// Geometry stage
    Geometry,
}

impl ShaderStage {
    /// GL enum for this stage
    #[must_use]
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        }
    }
}

/// GLSL source for a single shader stage
#[derive(Debug, Clone)]
pub struct ShaderSource {
    name: String,
    stage: ShaderStage,
    source: String,
}

impl ShaderSource {
    /// Wrap in-memory GLSL text
    pub fn new(stage: ShaderStage, name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage,
            source: source.into(),
        }
    }

    /// Read GLSL text from a file; the file name becomes the source name
    pub fn from_file<P: AsRef<Path>>(stage: ShaderStage, path: P) -> RhiResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| RhiError::ShaderCompile {
                name: path.display().to_string(),
                log: format!("could not read source file: {e}"),
            })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(stage, name, source))
    }

    /// Source name used in diagnostics
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pipeline stage
    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// GLSL text
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A named collection of compiled shader stages, ready to link
#[derive(Debug, Clone)]
pub struct Shader {
    name: String,
    stages: Vec<u32>,
}

impl Shader {
    /// Create an empty program description
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Add a compiled stage (a native id from
    /// [`crate::rhi::RenderInterface::compile_shader`])
    pub fn add_stage(&mut self, native: u32) -> &mut Self {
        self.stages.push(native);
        self
    }

    /// Program name used in diagnostics
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native ids of the attached stages
    #[must_use]
    pub fn stages(&self) -> &[u32] {
        &self.stages
    }
}

/// Built-in GLSL sources shipped with the engine
pub mod builtin {
    /// Shared vertex stage for all built-in programs
    pub const LIGHTING_VERT: &str = include_str!("../../shaders/lighting.vert");
    /// Untextured lit fragment stage
    pub const LIGHTING_FRAG: &str = include_str!("../../shaders/lighting.frag");
    /// Textured lit fragment stage
    pub const LIGHTING_TEX_FRAG: &str = include_str!("../../shaders/lighting_tex.frag");
    /// PBR fragment stage
    pub const PBR_FRAG: &str = include_str!("../../shaders/pbr.frag");

    /// Name of the untextured lit program
    pub const LIGHTING: &str = "lighting";
    /// Name of the textured lit program
    pub const LIGHTING_TEX: &str = "lighting_tex";
    /// Name of the PBR program
    pub const PBR: &str = "pbr";
}
