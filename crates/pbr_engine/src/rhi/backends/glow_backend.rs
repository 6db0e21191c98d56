//! OpenGL backend over a `glow` context
//!
//! Every method translates between the interface's raw `u32` native ids
//! (`0` = no object) and glow's `NonZeroU32`-backed handle types, then makes
//! the corresponding GL call. This module owns all the `unsafe` in the crate;
//! callers are expected to pass only ids previously returned by the same
//! context, which the handle tables in [`crate::rhi`] guarantee.

use std::num::NonZeroU32;

use glow::HasContext;

use super::super::api::GlApi;

/// [`GlApi`] implementation backed by a live OpenGL context
pub struct GlowBackend {
    gl: glow::Context,
}

impl GlowBackend {
    /// Wrap an already-created glow context
    #[must_use]
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }
}

fn buffer(id: u32) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(id).map(glow::NativeBuffer)
}

fn vertex_array(id: u32) -> Option<glow::NativeVertexArray> {
    NonZeroU32::new(id).map(glow::NativeVertexArray)
}

fn shader(id: u32) -> glow::NativeShader {
    // Interface never passes 0 for object-typed parameters
    glow::NativeShader(NonZeroU32::new(id).unwrap_or(NonZeroU32::MIN))
}

fn program(id: u32) -> Option<glow::NativeProgram> {
    NonZeroU32::new(id).map(glow::NativeProgram)
}

fn texture(id: u32) -> Option<glow::NativeTexture> {
    NonZeroU32::new(id).map(glow::NativeTexture)
}

fn location(loc: u32) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(loc)
}

impl GlApi for GlowBackend {
    fn create_buffer(&self) -> Result<u32, String> {
        unsafe { self.gl.create_buffer().map(|b| b.0.get()) }
    }

    fn delete_buffer(&self, id: u32) {
        if let Some(b) = buffer(id) {
            unsafe { self.gl.delete_buffer(b) }
        }
    }

    fn bind_buffer(&self, target: u32, id: u32) {
        unsafe { self.gl.bind_buffer(target, buffer(id)) }
    }

    fn bind_buffer_base(&self, target: u32, index: u32, id: u32) {
        unsafe { self.gl.bind_buffer_base(target, index, buffer(id)) }
    }

    fn buffer_data(&self, target: u32, size: usize, data: Option<&[u8]>, usage: u32) {
        unsafe {
            match data {
                Some(bytes) => self.gl.buffer_data_u8_slice(target, bytes, usage),
                None => self.gl.buffer_data_size(target, size as i32, usage),
            }
        }
    }

    fn buffer_sub_data(&self, target: u32, offset: i32, data: &[u8]) {
        unsafe { self.gl.buffer_sub_data_u8_slice(target, offset, data) }
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        unsafe { self.gl.create_vertex_array().map(|v| v.0.get()) }
    }

    fn delete_vertex_array(&self, id: u32) {
        if let Some(v) = vertex_array(id) {
            unsafe { self.gl.delete_vertex_array(v) }
        }
    }

    fn bind_vertex_array(&self, id: u32) {
        unsafe { self.gl.bind_vertex_array(vertex_array(id)) }
    }

    fn enable_vertex_attrib(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, data_type, normalized, stride, offset)
        }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode, first, count) }
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        unsafe { self.gl.draw_elements(mode, count, element_type, offset) }
    }

    fn create_shader(&self, stage: u32) -> Result<u32, String> {
        unsafe { self.gl.create_shader(stage).map(|s| s.0.get()) }
    }

    fn shader_source(&self, id: u32, source: &str) {
        unsafe { self.gl.shader_source(shader(id), source) }
    }

    fn compile_shader(&self, id: u32) {
        unsafe { self.gl.compile_shader(shader(id)) }
    }

    fn compile_status(&self, id: u32) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader(id)) }
    }

    fn shader_info_log(&self, id: u32) -> String {
        unsafe { self.gl.get_shader_info_log(shader(id)) }
    }

    fn delete_shader(&self, id: u32) {
        unsafe { self.gl.delete_shader(shader(id)) }
    }

    fn create_program(&self) -> Result<u32, String> {
        unsafe { self.gl.create_program().map(|p| p.0.get()) }
    }

    fn attach_shader(&self, program_id: u32, shader_id: u32) {
        if let Some(p) = program(program_id) {
            unsafe { self.gl.attach_shader(p, shader(shader_id)) }
        }
    }

    fn detach_shader(&self, program_id: u32, shader_id: u32) {
        if let Some(p) = program(program_id) {
            unsafe { self.gl.detach_shader(p, shader(shader_id)) }
        }
    }

    fn link_program(&self, id: u32) {
        if let Some(p) = program(id) {
            unsafe { self.gl.link_program(p) }
        }
    }

    fn link_status(&self, id: u32) -> bool {
        program(id).is_some_and(|p| unsafe { self.gl.get_program_link_status(p) })
    }

    fn program_info_log(&self, id: u32) -> String {
        program(id).map_or_else(String::new, |p| unsafe { self.gl.get_program_info_log(p) })
    }

    fn delete_program(&self, id: u32) {
        if let Some(p) = program(id) {
            unsafe { self.gl.delete_program(p) }
        }
    }

    fn use_program(&self, id: u32) {
        unsafe { self.gl.use_program(program(id)) }
    }

    fn uniform_location(&self, id: u32, name: &str) -> Option<u32> {
        let p = program(id)?;
        unsafe { self.gl.get_uniform_location(p, name).map(|l| l.0) }
    }

    fn uniform_block_index(&self, id: u32, name: &str) -> Option<u32> {
        let p = program(id)?;
        unsafe { self.gl.get_uniform_block_index(p, name) }
    }

    fn uniform_block_binding(&self, id: u32, block_index: u32, binding: u32) {
        if let Some(p) = program(id) {
            unsafe { self.gl.uniform_block_binding(p, block_index, binding) }
        }
    }

    fn set_uniform_i32(&self, loc: u32, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&location(loc)), value) }
    }

    fn set_uniform_f32(&self, loc: u32, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(&location(loc)), value) }
    }

    fn set_uniform_vec3(&self, loc: u32, value: &[f32; 3]) {
        unsafe { self.gl.uniform_3_f32_slice(Some(&location(loc)), value) }
    }

    fn set_uniform_vec4(&self, loc: u32, value: &[f32; 4]) {
        unsafe { self.gl.uniform_4_f32_slice(Some(&location(loc)), value) }
    }

    fn set_uniform_mat3(&self, loc: u32, value: &[f32; 9]) {
        unsafe {
            self.gl
                .uniform_matrix_3_f32_slice(Some(&location(loc)), false, value)
        }
    }

    fn set_uniform_mat4(&self, loc: u32, value: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&location(loc)), false, value)
        }
    }

    fn create_texture(&self) -> Result<u32, String> {
        unsafe { self.gl.create_texture().map(|t| t.0.get()) }
    }

    fn delete_texture(&self, id: u32) {
        if let Some(t) = texture(id) {
            unsafe { self.gl.delete_texture(t) }
        }
    }

    fn bind_texture(&self, target: u32, id: u32) {
        unsafe { self.gl.bind_texture(target, texture(id)) }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(unit) }
    }

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
    ) {
        unsafe {
            self.gl.tex_image_2d(
                target,
                level,
                internal_format,
                width,
                height,
                0,
                format,
                pixel_type,
                pixels,
            );
        }
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(target, parameter, value) }
    }

    fn generate_mipmap(&self, target: u32) {
        unsafe { self.gl.generate_mipmap(target) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        unsafe { self.gl.clear(mask) }
    }

    fn enable(&self, capability: u32) {
        unsafe { self.gl.enable(capability) }
    }

    fn disable(&self, capability: u32) {
        unsafe { self.gl.disable(capability) }
    }

    fn depth_func(&self, func: u32) {
        unsafe { self.gl.depth_func(func) }
    }

    fn get_error(&self) -> u32 {
        unsafe { self.gl.get_error() }
    }
}
