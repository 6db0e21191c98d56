//! Graphics API abstraction trait
//!
//! [`GlApi`] is the narrow slice of OpenGL that [`crate::rhi::RenderInterface`]
//! actually uses. Native object ids are plain `u32` with `0` meaning "no
//! object", and enum parameters are the raw GL constants re-exported by
//! `glow` (which are available without a live context, so tests can share
//! them). The one production implementation is
//! [`crate::rhi::backends::GlowBackend`]; tests drive the interface with a
//! recording fake instead of a driver.
//!
//! Keeping this seam narrow is what makes the rest of the crate safe code:
//! every `unsafe` GL call lives behind it.

/// Minimal OpenGL surface required by the render hardware interface
///
/// Methods mirror their GL counterparts one-to-one and perform no
/// validation; the interface above is responsible for never passing a
/// dead native id.
pub trait GlApi {
    // ---- buffers ----

    /// Create a buffer object
    fn create_buffer(&self) -> Result<u32, String>;
    /// Delete a buffer object
    fn delete_buffer(&self, buffer: u32);
    /// Bind a buffer to a target (`0` unbinds)
    fn bind_buffer(&self, target: u32, buffer: u32);
    /// Bind a buffer to an indexed binding point
    fn bind_buffer_base(&self, target: u32, index: u32, buffer: u32);
    /// Allocate and optionally fill the bound buffer
    fn buffer_data(&self, target: u32, size: usize, data: Option<&[u8]>, usage: u32);
    /// Overwrite a range of the bound buffer
    fn buffer_sub_data(&self, target: u32, offset: i32, data: &[u8]);

    // ---- vertex arrays ----

    /// Create a vertex array object
    fn create_vertex_array(&self) -> Result<u32, String>;
    /// Delete a vertex array object
    fn delete_vertex_array(&self, vertex_array: u32);
    /// Bind a vertex array (`0` unbinds)
    fn bind_vertex_array(&self, vertex_array: u32);
    /// Enable a vertex attribute slot
    fn enable_vertex_attrib(&self, index: u32);
    /// Describe a vertex attribute in the bound array buffer
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    // ---- drawing ----

    /// Issue a non-indexed draw over the bound vertex array
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
    /// Issue an indexed draw over the bound vertex array
    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32);

    // ---- shaders and programs ----

    /// Create a shader object for a stage
    fn create_shader(&self, stage: u32) -> Result<u32, String>;
    /// Replace a shader object's source
    fn shader_source(&self, shader: u32, source: &str);
    /// Compile a shader object
    fn compile_shader(&self, shader: u32);
    /// Query compile success
    fn compile_status(&self, shader: u32) -> bool;
    /// Fetch the compile info log
    fn shader_info_log(&self, shader: u32) -> String;
    /// Delete a shader object
    fn delete_shader(&self, shader: u32);

    /// Create a program object
    fn create_program(&self) -> Result<u32, String>;
    /// Attach a shader object to a program
    fn attach_shader(&self, program: u32, shader: u32);
    /// Detach a shader object from a program
    fn detach_shader(&self, program: u32, shader: u32);
    /// Link a program
    fn link_program(&self, program: u32);
    /// Query link success
    fn link_status(&self, program: u32) -> bool;
    /// Fetch the link info log
    fn program_info_log(&self, program: u32) -> String;
    /// Delete a program object
    fn delete_program(&self, program: u32);
    /// Bind a program as current (`0` unbinds)
    fn use_program(&self, program: u32);

    // ---- uniforms ----

    /// Resolve a uniform location in a program
    fn uniform_location(&self, program: u32, name: &str) -> Option<u32>;
    /// Resolve a named uniform block index in a program
    fn uniform_block_index(&self, program: u32, name: &str) -> Option<u32>;
    /// Assign a uniform block to a binding point
    fn uniform_block_binding(&self, program: u32, block_index: u32, binding: u32);

    /// Set an `int`/sampler uniform on the current program
    fn set_uniform_i32(&self, location: u32, value: i32);
    /// Set a `float` uniform on the current program
    fn set_uniform_f32(&self, location: u32, value: f32);
    /// Set a `vec3` uniform on the current program
    fn set_uniform_vec3(&self, location: u32, value: &[f32; 3]);
    /// Set a `vec4` uniform on the current program
    fn set_uniform_vec4(&self, location: u32, value: &[f32; 4]);
    /// Set a `mat3` uniform (column-major) on the current program
    fn set_uniform_mat3(&self, location: u32, value: &[f32; 9]);
    /// Set a `mat4` uniform (column-major) on the current program
    fn set_uniform_mat4(&self, location: u32, value: &[f32; 16]);

    // ---- textures ----

    /// Create a texture object
    fn create_texture(&self) -> Result<u32, String>;
    /// Delete a texture object
    fn delete_texture(&self, texture: u32);
    /// Bind a texture to a target (`0` unbinds)
    fn bind_texture(&self, target: u32, texture: u32);
    /// Select the active texture unit (`glow::TEXTURE0 + unit`)
    fn active_texture(&self, unit: u32);
    /// Upload a 2D image to the bound texture
    fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        pixel_type: u32,
        pixels: Option<&[u8]>,
    );
    /// Set an integer texture parameter on the bound texture
    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    /// Generate mipmaps for the bound texture
    fn generate_mipmap(&self, target: u32);

    // ---- pipeline state ----

    /// Set the viewport rectangle
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    /// Set the clear color
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    /// Clear the listed framebuffer attachments
    fn clear(&self, mask: u32);
    /// Enable a capability
    fn enable(&self, capability: u32);
    /// Disable a capability
    fn disable(&self, capability: u32);
    /// Set the depth comparison function
    fn depth_func(&self, func: u32);

    // ---- error polling ----

    /// Pop one pending error code (`glow::NO_ERROR` when the queue is empty)
    fn get_error(&self) -> u32;
}
