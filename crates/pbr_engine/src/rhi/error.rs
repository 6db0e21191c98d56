//! Error types for the render hardware interface
//!
//! Two failure families deliberately do NOT show up here: stale or null
//! resource handles (consuming operations reject them and return `false`
//! without touching the driver) and per-uniform name lookups that miss
//! (the setter becomes a no-op, matching GL's own behavior for location -1).
//! Everything that allocates, compiles, or talks to the driver at a
//! checkpoint returns [`RhiResult`].

use thiserror::Error;

/// Errors reported by the render hardware interface
#[derive(Error, Debug)]
pub enum RhiError {
    /// `initialize` was called more than once on the same interface
    #[error("render interface is already initialized")]
    AlreadyInitialized,

    /// A resource creation call was issued before `initialize`
    #[error("render interface is not initialized")]
    NotInitialized,

    /// The driver refused to allocate a resource (buffer, vertex array,
    /// texture or program object)
    #[error("resource allocation failed: {0}")]
    ResourceAllocation(String),

    /// A shader stage failed to compile; `log` carries the driver's info log
    #[error("shader '{name}' failed to compile:\n{log}")]
    ShaderCompile {
        /// Name of the shader source
        name: String,
        /// Driver compile log
        log: String,
    },

    /// A program failed to link; `log` carries the driver's info log
    #[error("program '{name}' failed to link:\n{log}")]
    ProgramLink {
        /// Name of the program
        name: String,
        /// Driver link log
        log: String,
    },

    /// One or more driver errors were pending at a checkpoint
    ///
    /// Every pending error has already been drained and logged individually
    /// by the time this is returned.
    #[error("driver reported {count} error(s) at '{context}'")]
    Driver {
        /// Description of the checkpoint that polled the error queue
        context: String,
        /// Number of distinct error codes drained
        count: usize,
    },
}

/// Result type for RHI operations
pub type RhiResult<T> = Result<T, RhiError>;
