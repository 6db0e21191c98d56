//! Recording fake of [`GlApi`] for driver-free tests
//!
//! The fake hands out sequential native ids, journals every call as a
//! [`Call`], and simulates just enough driver behavior for the interface's
//! contract to be observable: compilation fails for sources containing
//! `#error`, linking requires a compiled vertex and fragment stage, and a
//! test can enqueue error codes for `get_error` to report.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use super::api::GlApi;

/// One recorded driver call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer(u32),
    DeleteBuffer(u32),
    BindBuffer { target: u32, buffer: u32 },
    BindBufferBase { target: u32, index: u32, buffer: u32 },
    BufferData { target: u32, size: usize, usage: u32 },
    BufferSubData { target: u32, offset: i32, len: usize },
    CreateVertexArray(u32),
    DeleteVertexArray(u32),
    BindVertexArray(u32),
    EnableVertexAttrib(u32),
    VertexAttribPointer { index: u32, size: i32, stride: i32, offset: i32 },
    DrawArrays { mode: u32, first: i32, count: i32 },
    DrawElements { mode: u32, count: i32 },
    CreateShader { stage: u32, shader: u32 },
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    DeleteProgram(u32),
    UseProgram(u32),
    UniformLocationQuery { program: u32, name: String },
    UniformBlockQuery { program: u32, name: String },
    UniformBlockBinding { program: u32, block_index: u32, binding: u32 },
    SetI32 { location: u32, value: i32 },
    SetF32 { location: u32, value: f32 },
    SetVec3 { location: u32, value: [f32; 3] },
    SetVec4 { location: u32, value: [f32; 4] },
    SetMat3 { location: u32 },
    SetMat4 { location: u32 },
    CreateTexture(u32),
    DeleteTexture(u32),
    BindTexture { target: u32, texture: u32 },
    ActiveTexture(u32),
    TexImage2D { width: i32, height: i32 },
    TexParameter { parameter: u32, value: i32 },
    GenerateMipmap(u32),
    Viewport { width: i32, height: i32 },
    ClearColor,
    Clear(u32),
    Enable(u32),
    Disable(u32),
    DepthFunc(u32),
}

#[derive(Default)]
struct ShaderState {
    stage: u32,
    source: String,
    compiled_ok: bool,
}

#[derive(Default)]
struct ProgramState {
    /// (shader id, stage) pairs attached at link time
    attached: Vec<(u32, u32)>,
    linked_ok: bool,
}

/// In-memory driver double
///
/// Wrap in an `Rc` and hand a clone to [`super::RenderInterface::new`]; the
/// test keeps the other clone for inspection.
pub struct FakeApi {
    next_id: Cell<u32>,
    calls: RefCell<Vec<Call>>,
    errors: RefCell<VecDeque<u32>>,
    shaders: RefCell<HashMap<u32, ShaderState>>,
    programs: RefCell<HashMap<u32, ProgramState>>,
    locations: RefCell<HashMap<(u32, String), u32>>,
    next_location: Cell<u32>,
    block_indices: RefCell<HashMap<(u32, String), u32>>,
    next_block_index: Cell<u32>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            calls: RefCell::new(Vec::new()),
            errors: RefCell::new(VecDeque::new()),
            shaders: RefCell::new(HashMap::new()),
            programs: RefCell::new(HashMap::new()),
            locations: RefCell::new(HashMap::new()),
            next_location: Cell::new(0),
            block_indices: RefCell::new(HashMap::new()),
            next_block_index: Cell::new(0),
        }
    }

    /// All calls recorded since the last [`clear_calls`](Self::clear_calls)
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Forget the recorded calls (ids and object state are kept)
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Enqueue an error code for a later `get_error` to pop
    pub fn push_error(&self, code: u32) {
        self.errors.borrow_mut().push_back(code);
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn fresh_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl GlApi for Rc<FakeApi> {
    fn create_buffer(&self) -> Result<u32, String> {
        let id = self.fresh_id();
        self.record(Call::CreateBuffer(id));
        Ok(id)
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(Call::DeleteBuffer(buffer));
    }

    fn bind_buffer(&self, target: u32, buffer: u32) {
        self.record(Call::BindBuffer { target, buffer });
    }

    fn bind_buffer_base(&self, target: u32, index: u32, buffer: u32) {
        self.record(Call::BindBufferBase { target, index, buffer });
    }

    fn buffer_data(&self, target: u32, size: usize, data: Option<&[u8]>, usage: u32) {
        let size = data.map_or(size, <[u8]>::len);
        self.record(Call::BufferData { target, size, usage });
    }

    fn buffer_sub_data(&self, target: u32, offset: i32, data: &[u8]) {
        self.record(Call::BufferSubData {
            target,
            offset,
            len: data.len(),
        });
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let id = self.fresh_id();
        self.record(Call::CreateVertexArray(id));
        Ok(id)
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        self.record(Call::DeleteVertexArray(vertex_array));
    }

    fn bind_vertex_array(&self, vertex_array: u32) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn enable_vertex_attrib(&self, index: u32) {
        self.record(Call::EnableVertexAttrib(index));
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        _data_type: u32,
        _normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.record(Call::VertexAttribPointer { index, size, stride, offset });
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        self.record(Call::DrawArrays { mode, first, count });
    }

    fn draw_elements(&self, mode: u32, count: i32, _element_type: u32, _offset: i32) {
        self.record(Call::DrawElements { mode, count });
    }

    fn create_shader(&self, stage: u32) -> Result<u32, String> {
        let id = self.fresh_id();
        self.shaders.borrow_mut().insert(
            id,
            ShaderState {
                stage,
                ..ShaderState::default()
            },
        );
        self.record(Call::CreateShader { stage, shader: id });
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(state) = self.shaders.borrow_mut().get_mut(&shader) {
            state.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        self.record(Call::CompileShader(shader));
        if let Some(state) = self.shaders.borrow_mut().get_mut(&shader) {
            state.compiled_ok = !state.source.contains("#error");
        }
    }

    fn compile_status(&self, shader: u32) -> bool {
        self.shaders
            .borrow()
            .get(&shader)
            .is_some_and(|s| s.compiled_ok)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        match self.shaders.borrow().get(&shader) {
            Some(state) if !state.compiled_ok => {
                "0:1: error: '#error' directive encountered".to_string()
            }
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: u32) {
        self.record(Call::DeleteShader(shader));
        self.shaders.borrow_mut().remove(&shader);
    }

    fn create_program(&self) -> Result<u32, String> {
        let id = self.fresh_id();
        self.programs.borrow_mut().insert(id, ProgramState::default());
        self.record(Call::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(Call::AttachShader { program, shader });
        let stage = self
            .shaders
            .borrow()
            .get(&shader)
            .map_or(0, |s| s.stage);
        if let Some(state) = self.programs.borrow_mut().get_mut(&program) {
            state.attached.push((shader, stage));
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(Call::DetachShader { program, shader });
    }

    fn link_program(&self, program: u32) {
        self.record(Call::LinkProgram(program));
        let shaders = self.shaders.borrow();
        if let Some(state) = self.programs.borrow_mut().get_mut(&program) {
            let has_vertex = state
                .attached
                .iter()
                .any(|&(_, stage)| stage == glow::VERTEX_SHADER);
            let has_fragment = state
                .attached
                .iter()
                .any(|&(_, stage)| stage == glow::FRAGMENT_SHADER);
            let all_compiled = state
                .attached
                .iter()
                .all(|(id, _)| shaders.get(id).is_some_and(|s| s.compiled_ok));
            state.linked_ok = has_vertex && has_fragment && all_compiled;
        }
    }

    fn link_status(&self, program: u32) -> bool {
        self.programs
            .borrow()
            .get(&program)
            .is_some_and(|p| p.linked_ok)
    }

    fn program_info_log(&self, program: u32) -> String {
        match self.programs.borrow().get(&program) {
            Some(state) if !state.linked_ok => {
                "error: program lacks a compiled vertex or fragment stage".to_string()
            }
            _ => String::new(),
        }
    }

    fn delete_program(&self, program: u32) {
        self.record(Call::DeleteProgram(program));
        self.programs.borrow_mut().remove(&program);
    }

    fn use_program(&self, program: u32) {
        self.record(Call::UseProgram(program));
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        self.record(Call::UniformLocationQuery {
            program,
            name: name.to_string(),
        });
        if !self.programs.borrow().contains_key(&program) {
            return None;
        }
        let key = (program, name.to_string());
        let mut locations = self.locations.borrow_mut();
        let location = *locations.entry(key).or_insert_with(|| {
            let next = self.next_location.get();
            self.next_location.set(next + 1);
            next
        });
        Some(location)
    }

    fn uniform_block_index(&self, program: u32, name: &str) -> Option<u32> {
        self.record(Call::UniformBlockQuery {
            program,
            name: name.to_string(),
        });
        if !self.programs.borrow().contains_key(&program) {
            return None;
        }
        let key = (program, name.to_string());
        let mut indices = self.block_indices.borrow_mut();
        let index = *indices.entry(key).or_insert_with(|| {
            let next = self.next_block_index.get();
            self.next_block_index.set(next + 1);
            next
        });
        Some(index)
    }

    fn uniform_block_binding(&self, program: u32, block_index: u32, binding: u32) {
        self.record(Call::UniformBlockBinding {
            program,
            block_index,
            binding,
        });
    }

    fn set_uniform_i32(&self, location: u32, value: i32) {
        self.record(Call::SetI32 { location, value });
    }

    fn set_uniform_f32(&self, location: u32, value: f32) {
        self.record(Call::SetF32 { location, value });
    }

    fn set_uniform_vec3(&self, location: u32, value: &[f32; 3]) {
        self.record(Call::SetVec3 {
            location,
            value: *value,
        });
    }

    fn set_uniform_vec4(&self, location: u32, value: &[f32; 4]) {
        self.record(Call::SetVec4 {
            location,
            value: *value,
        });
    }

    fn set_uniform_mat3(&self, location: u32, _value: &[f32; 9]) {
        self.record(Call::SetMat3 { location });
    }

    fn set_uniform_mat4(&self, location: u32, _value: &[f32; 16]) {
        self.record(Call::SetMat4 { location });
    }

    fn create_texture(&self) -> Result<u32, String> {
        let id = self.fresh_id();
        self.record(Call::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&self, texture: u32) {
        self.record(Call::DeleteTexture(texture));
    }

    fn bind_texture(&self, target: u32, texture: u32) {
        self.record(Call::BindTexture { target, texture });
    }

    fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    fn tex_image_2d(
        &self,
        _target: u32,
        _level: i32,
        _internal_format: i32,
        width: i32,
        height: i32,
        _format: u32,
        _pixel_type: u32,
        _pixels: Option<&[u8]>,
    ) {
        self.record(Call::TexImage2D { width, height });
    }

    fn tex_parameter_i32(&self, _target: u32, parameter: u32, value: i32) {
        self.record(Call::TexParameter { parameter, value });
    }

    fn generate_mipmap(&self, target: u32) {
        self.record(Call::GenerateMipmap(target));
    }

    fn viewport(&self, _x: i32, _y: i32, width: i32, height: i32) {
        self.record(Call::Viewport { width, height });
    }

    fn clear_color(&self, _r: f32, _g: f32, _b: f32, _a: f32) {
        self.record(Call::ClearColor);
    }

    fn clear(&self, mask: u32) {
        self.record(Call::Clear(mask));
    }

    fn enable(&self, capability: u32) {
        self.record(Call::Enable(capability));
    }

    fn disable(&self, capability: u32) {
        self.record(Call::Disable(capability));
    }

    fn depth_func(&self, func: u32) {
        self.record(Call::DepthFunc(func));
    }

    fn get_error(&self) -> u32 {
        self.errors
            .borrow_mut()
            .pop_front()
            .unwrap_or(glow::NO_ERROR)
    }
}
