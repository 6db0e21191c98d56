//! Render hardware interface
//!
//! [`RenderInterface`] is the only boundary the engine crosses into platform
//! graphics calls. It owns every GPU resource behind typed, generation-checked
//! handles and exposes creation, upload, uniform, and draw operations in terms
//! of those handles — raw GL objects never leave this module.
//!
//! ## Handles
//!
//! Each resource category (buffers, vertex arrays, programs, textures) lives
//! in its own table. Handles are `slotmap` keys: an index plus a generation
//! counter, so a handle that outlives its resource is detected
//! deterministically instead of dereferencing a recycled slot. The default
//! key is null and never resolves.
//!
//! ## Error policy
//!
//! Three tiers, applied consistently:
//! - consuming operations given a stale or null handle reject it and return
//!   `false`, leaving driver state untouched;
//! - creation, compilation, and linking return [`RhiResult`] with the
//!   driver's diagnostics attached — nothing in this module terminates the
//!   process;
//! - [`RenderInterface::check_error`] drains the driver's error queue at
//!   caller-chosen checkpoints, logging every pending code.
//!
//! ## Lifecycle
//!
//! All resources are created during scene preparation; the per-frame path
//! (uniform updates, binds, draws) only reuses existing handles. The
//! interface is single-threaded by construction — the GL context is
//! thread-affine — and is passed explicitly to whoever needs it rather than
//! living in a global.

pub mod api;
pub mod backends;
pub mod error;
pub mod shader;
pub mod texture;

#[cfg(test)]
pub(crate) mod test_api;

use std::collections::HashMap;

use bitflags::bitflags;
use slotmap::{Key, SlotMap};

use crate::foundation::math::{Mat3, Mat4, Vec3, Vec4};
use crate::geometry::{Geometry, Vertex};

pub use api::GlApi;
pub use backends::GlowBackend;
pub use error::{RhiError, RhiResult};
pub use shader::{Shader, ShaderSource, ShaderStage};
pub use texture::{SamplerDesc, TextureDesc, TextureFilter, TextureFormat, TextureWrap};

slotmap::new_key_type! {
    /// Handle to a GPU buffer
    pub struct BufferHandle;
    /// Handle to a GPU vertex array
    pub struct VertexArrayHandle;
    /// Handle to a linked shader program
    pub struct ProgramHandle;
    /// Handle to a GPU texture
    pub struct TextureHandle;
}

/// Binding point of the shared camera uniform block
pub const CAMERA_BLOCK_BINDING: u32 = 0;
/// Binding point of the shared lights uniform block
pub const LIGHTS_BLOCK_BINDING: u32 = 1;

/// Name of the camera uniform block in the built-in shaders
pub const CAMERA_BLOCK: &str = "CameraBlock";
/// Name of the lights uniform block in the built-in shaders
pub const LIGHTS_BLOCK: &str = "LightsBlock";
/// Per-object model matrix uniform, registered on every built-in program
pub const MODEL_MATRIX_UNIFORM: &str = "ModelMatrix";
/// Per-object normal matrix uniform, registered on every built-in program
pub const NORMAL_MATRIX_UNIFORM: &str = "NormalMatrix";

/// Classification of a buffer's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Vertex attribute data
    Vertex,
    /// Triangle indices
    Index,
    /// Uniform block data shared across programs
    Uniform,
}

impl BufferTarget {
    fn gl_enum(self) -> u32 {
        match self {
            BufferTarget::Vertex => glow::ARRAY_BUFFER,
            BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
            BufferTarget::Uniform => glow::UNIFORM_BUFFER,
        }
    }
}

/// Expected update frequency of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times
    Static,
    /// Re-specified roughly every frame
    Stream,
    /// Updated repeatedly in place
    Dynamic,
}

impl BufferUsage {
    fn gl_enum(self) -> u32 {
        match self {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Stream => glow::STREAM_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
        }
    }
}

/// Component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// 8-bit signed integer
    Byte,
    /// 16-bit signed integer
    Short,
    /// 32-bit unsigned integer
    UInt,
    /// 32-bit float
    Float,
}

impl AttributeKind {
    fn gl_enum(self) -> u32 {
        match self {
            AttributeKind::Byte => glow::BYTE,
            AttributeKind::Short => glow::SHORT,
            AttributeKind::UInt => glow::UNSIGNED_INT,
            AttributeKind::Float => glow::FLOAT,
        }
    }
}

/// One entry of a vertex buffer layout
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    /// Attribute slot
    pub index: u32,
    /// Number of components
    pub elements: i32,
    /// Component type
    pub kind: AttributeKind,
    /// Byte stride between consecutive vertices
    pub stride: i32,
    /// Byte offset of the first component
    pub offset: i32,
}

bitflags! {
    /// Framebuffer aspects cleared by [`RenderInterface::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        /// Color attachment
        const COLOR = glow::COLOR_BUFFER_BIT;
        /// Depth attachment
        const DEPTH = glow::DEPTH_BUFFER_BIT;
        /// Stencil attachment
        const STENCIL = glow::STENCIL_BUFFER_BIT;
    }
}

struct BufferRecord {
    native: u32,
    target: BufferTarget,
}

struct VertexArrayRecord {
    native: u32,
    vertex_count: u32,
    index_count: u32,
    /// Buffers referenced by this array. Sub-owned: deleting the array does
    /// not delete them.
    buffers: Vec<BufferHandle>,
}

struct ProgramRecord {
    native: u32,
    uniforms: HashMap<String, u32>,
    blocks: HashMap<String, u32>,
}

impl ProgramRecord {
    fn new(native: u32) -> Self {
        Self {
            native,
            uniforms: HashMap::new(),
            blocks: HashMap::new(),
        }
    }
}

struct TextureRecord {
    native: u32,
    target: u32,
}

/// Handle-based facade over the graphics driver
///
/// Construct one per GL context, call [`initialize`](Self::initialize)
/// exactly once, and pass it by reference to the renderer and materials.
pub struct RenderInterface {
    api: Box<dyn GlApi>,

    buffers: SlotMap<BufferHandle, BufferRecord>,
    vertex_arrays: SlotMap<VertexArrayHandle, VertexArrayRecord>,
    programs: SlotMap<ProgramHandle, ProgramRecord>,
    textures: SlotMap<TextureHandle, TextureRecord>,

    /// Program bound by the last successful `use_program`; name-based
    /// uniform setters resolve against it
    current_program: ProgramHandle,
    /// Sentinel entry whose native id is 0 ("no program")
    no_program: ProgramHandle,
    /// 1x1 white fallback texture created at initialization
    default_texture: TextureHandle,
    /// Built-in programs compiled at initialization, by name
    builtins: HashMap<&'static str, ProgramHandle>,

    initialized: bool,
}

impl RenderInterface {
    /// Create an interface over a graphics backend
    ///
    /// No driver calls are made until [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(api: Box<dyn GlApi>) -> Self {
        Self {
            api,
            buffers: SlotMap::with_key(),
            vertex_arrays: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            current_program: ProgramHandle::null(),
            no_program: ProgramHandle::null(),
            default_texture: TextureHandle::null(),
            builtins: HashMap::new(),
            initialized: false,
        }
    }

    /// One-time setup: sentinel program slot, built-in shader programs with
    /// their uniform and uniform-block registrations, default texture, and
    /// depth testing
    ///
    /// Returns [`RhiError::AlreadyInitialized`] on a second call.
    pub fn initialize(&mut self) -> RhiResult<()> {
        if self.initialized {
            return Err(RhiError::AlreadyInitialized);
        }
        // Set before compiling the built-ins below; they go through the
        // same guarded entry points as user resources.
        self.initialized = true;

        self.no_program = self.programs.insert(ProgramRecord::new(0));
        self.current_program = self.no_program;

        let vert = self.compile_shader(&ShaderSource::new(
            ShaderStage::Vertex,
            "lighting.vert",
            shader::builtin::LIGHTING_VERT,
        ))?;

        let fragments = [
            (shader::builtin::LIGHTING, "lighting.frag", shader::builtin::LIGHTING_FRAG),
            (
                shader::builtin::LIGHTING_TEX,
                "lighting_tex.frag",
                shader::builtin::LIGHTING_TEX_FRAG,
            ),
            (shader::builtin::PBR, "pbr.frag", shader::builtin::PBR_FRAG),
        ];

        for (program_name, frag_name, frag_source) in fragments {
            let frag = self.compile_shader(&ShaderSource::new(
                ShaderStage::Fragment,
                frag_name,
                frag_source,
            ))?;

            let mut desc = Shader::new(program_name);
            desc.add_stage(vert).add_stage(frag);
            let program = self.link_program(&desc)?;
            self.delete_shader(frag);

            self.register_uniform(program, MODEL_MATRIX_UNIFORM);
            self.register_uniform(program, NORMAL_MATRIX_UNIFORM);

            self.use_program(program);
            self.set_buffer_block(CAMERA_BLOCK, CAMERA_BLOCK_BINDING);
            self.set_buffer_block(LIGHTS_BLOCK, LIGHTS_BLOCK_BINDING);

            self.builtins.insert(program_name, program);
        }
        self.delete_shader(vert);
        let no_program = self.no_program;
        self.use_program(no_program);

        let white = TextureDesc::solid([255, 255, 255, 255]);
        let sampler = SamplerDesc {
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Nearest,
            generate_mipmaps: false,
            ..SamplerDesc::default()
        };
        self.default_texture = self.create_texture(&white, &sampler)?;
        self.bind_texture(0, self.default_texture);

        self.api.enable(glow::DEPTH_TEST);
        self.api.depth_func(glow::LESS);

        self.check_error("initialize")?;
        log::info!(
            "render interface initialized ({} built-in programs)",
            self.builtins.len()
        );
        Ok(())
    }

    /// Sentinel handle that unbinds the current program
    #[must_use]
    pub fn no_program(&self) -> ProgramHandle {
        self.no_program
    }

    /// The 1x1 white texture created at initialization
    #[must_use]
    pub fn default_texture(&self) -> TextureHandle {
        self.default_texture
    }

    /// Look up a built-in program by name (see [`shader::builtin`])
    #[must_use]
    pub fn builtin_program(&self, name: &str) -> Option<ProgramHandle> {
        self.builtins.get(name).copied()
    }

    /* ===================================================================
            Shaders
    ====================================================================== */

    /// Compile one shader stage, returning its native id
    ///
    /// On failure the driver's compile log is logged and returned inside
    /// [`RhiError::ShaderCompile`]; the shader object is released.
    pub fn compile_shader(&mut self, source: &ShaderSource) -> RhiResult<u32> {
        self.require_initialized()?;

        let native = self.api.create_shader(source.stage().gl_enum()).map_err(|e| {
            RhiError::ResourceAllocation(format!("shader object '{}': {e}", source.name()))
        })?;

        self.api.shader_source(native, source.source());
        self.api.compile_shader(native);

        if self.api.compile_status(native) {
            log::debug!("compiled shader '{}'", source.name());
            return Ok(native);
        }

        let info_log = self.api.shader_info_log(native);
        self.api.delete_shader(native);
        log::error!("shader '{}' compile log:\n{info_log}", source.name());
        Err(RhiError::ShaderCompile {
            name: source.name().to_string(),
            log: info_log,
        })
    }

    /// Delete a compiled shader stage; false if the id is already gone
    pub fn delete_shader(&mut self, native: u32) -> bool {
        if native == 0 {
            return false;
        }
        self.api.delete_shader(native);
        true
    }

    /// Link the compiled stages of `desc` into a program
    ///
    /// Link failure logs the driver's program log and returns
    /// [`RhiError::ProgramLink`]; like compile failure, it is the caller's
    /// decision whether that is fatal.
    pub fn link_program(&mut self, desc: &Shader) -> RhiResult<ProgramHandle> {
        self.require_initialized()?;

        let native = self.api.create_program().map_err(|e| {
            RhiError::ResourceAllocation(format!("program object '{}': {e}", desc.name()))
        })?;

        for &stage in desc.stages() {
            self.api.attach_shader(native, stage);
        }
        self.check_error(&format!("attach stages of '{}'", desc.name()))?;

        self.api.link_program(native);
        if !self.api.link_status(native) {
            let info_log = self.api.program_info_log(native);
            for &stage in desc.stages() {
                self.api.detach_shader(native, stage);
            }
            self.api.delete_program(native);
            log::error!("program '{}' link log:\n{info_log}", desc.name());
            return Err(RhiError::ProgramLink {
                name: desc.name().to_string(),
                log: info_log,
            });
        }

        for &stage in desc.stages() {
            self.api.detach_shader(native, stage);
        }

        let handle = self.programs.insert(ProgramRecord::new(native));
        log::debug!("linked program '{}'", desc.name());
        Ok(handle)
    }

    /// Bind a program and make it the target of name-based uniform setters
    ///
    /// Rejects stale handles. Binding [`no_program`](Self::no_program)
    /// unbinds.
    pub fn use_program(&mut self, handle: ProgramHandle) -> bool {
        let Some(record) = self.programs.get(handle) else {
            return false;
        };
        self.api.use_program(record.native);
        self.current_program = handle;
        true
    }

    /// Handle of the currently bound program
    #[must_use]
    pub fn current_program(&self) -> ProgramHandle {
        self.current_program
    }

    /// Resolve a uniform location once and cache it on the program
    ///
    /// Returns the location, or `None` when the program does not expose the
    /// uniform (e.g. it was optimized out).
    pub fn register_uniform(&mut self, handle: ProgramHandle, name: &str) -> Option<u32> {
        let record = self.programs.get(handle)?;
        if record.native == 0 {
            return None;
        }
        let location = self.api.uniform_location(record.native, name);
        match location {
            Some(loc) => {
                self.programs[handle].uniforms.insert(name.to_string(), loc);
                Some(loc)
            }
            None => {
                log::debug!("uniform '{name}' not found during registration");
                None
            }
        }
    }

    /// Location previously cached by [`register_uniform`](Self::register_uniform)
    ///
    /// A hash lookup, no driver call; this is the per-frame fast path.
    #[must_use]
    pub fn cached_uniform(&self, handle: ProgramHandle, name: &str) -> Option<u32> {
        self.programs.get(handle)?.uniforms.get(name).copied()
    }

    /// Resolve a uniform location without caching
    #[must_use]
    pub fn uniform_location(&self, handle: ProgramHandle, name: &str) -> Option<u32> {
        let record = self.programs.get(handle)?;
        if record.native == 0 {
            return None;
        }
        self.api.uniform_location(record.native, name)
    }

    /// Wire a named uniform block of the current program to a binding point
    pub fn set_buffer_block(&mut self, name: &str, binding: u32) -> bool {
        let Some(record) = self.programs.get(self.current_program) else {
            return false;
        };
        if record.native == 0 {
            return false;
        }
        let Some(index) = self.api.uniform_block_index(record.native, name) else {
            log::warn!("current program has no uniform block '{name}'");
            return false;
        };
        self.api.uniform_block_binding(record.native, index, binding);
        self.programs[self.current_program]
            .blocks
            .insert(name.to_string(), binding);
        true
    }

    /* ===================================================================
            Uniform setters
    ====================================================================== */

    // The name-based family resolves against the current program on every
    // call; the *_at family takes a pre-resolved location. A name that does
    // not resolve makes the setter a no-op, matching GL's location -1.

    /// Set a float uniform by name on the current program
    pub fn set_float(&self, name: &str, value: f32) {
        if let Some(loc) = self.live_location(name) {
            self.api.set_uniform_f32(loc, value);
        }
    }

    /// Set a vec3 uniform by name on the current program
    pub fn set_vector3(&self, name: &str, value: &Vec3) {
        if let Some(loc) = self.live_location(name) {
            self.api.set_uniform_vec3(loc, &(*value).into());
        }
    }

    /// Set a vec4 uniform by name on the current program
    pub fn set_vector4(&self, name: &str, value: &Vec4) {
        if let Some(loc) = self.live_location(name) {
            self.api.set_uniform_vec4(loc, &(*value).into());
        }
    }

    /// Set a mat3 uniform by name on the current program
    pub fn set_matrix3(&self, name: &str, value: &Mat3) {
        if let Some(loc) = self.live_location(name) {
            self.set_matrix3_at(loc, value);
        }
    }

    /// Set a mat4 uniform by name on the current program
    pub fn set_matrix4(&self, name: &str, value: &Mat4) {
        if let Some(loc) = self.live_location(name) {
            self.set_matrix4_at(loc, value);
        }
    }

    /// Point a sampler uniform at a texture unit, by name
    pub fn set_sampler(&self, name: &str, unit: u32) {
        if let Some(loc) = self.live_location(name) {
            self.api.set_uniform_i32(loc, unit as i32);
        }
    }

    /// Set a float uniform at a pre-resolved location
    pub fn set_float_at(&self, location: u32, value: f32) {
        self.api.set_uniform_f32(location, value);
    }

    /// Set a vec3 uniform at a pre-resolved location
    pub fn set_vector3_at(&self, location: u32, value: &Vec3) {
        self.api.set_uniform_vec3(location, &(*value).into());
    }

    /// Set a vec4 uniform at a pre-resolved location
    pub fn set_vector4_at(&self, location: u32, value: &Vec4) {
        self.api.set_uniform_vec4(location, &(*value).into());
    }

    /// Set a mat3 uniform at a pre-resolved location
    pub fn set_matrix3_at(&self, location: u32, value: &Mat3) {
        let mut data = [0.0f32; 9];
        data.copy_from_slice(value.as_slice());
        self.api.set_uniform_mat3(location, &data);
    }

    /// Set a mat4 uniform at a pre-resolved location
    pub fn set_matrix4_at(&self, location: u32, value: &Mat4) {
        let mut data = [0.0f32; 16];
        data.copy_from_slice(value.as_slice());
        self.api.set_uniform_mat4(location, &data);
    }

    fn live_location(&self, name: &str) -> Option<u32> {
        let record = self.programs.get(self.current_program)?;
        if record.native == 0 {
            return None;
        }
        self.api.uniform_location(record.native, name)
    }

    /* ===================================================================
            Buffers
    ====================================================================== */

    /// Allocate a buffer and upload `data` into it
    ///
    /// With `data = None` the buffer is allocated uninitialized at `size`
    /// bytes. `size == 0` is valid and yields an empty buffer that later
    /// draws treat as a no-op. Driver out-of-memory is surfaced as
    /// [`RhiError::ResourceAllocation`] instead of a dangling handle.
    pub fn create_buffer(
        &mut self,
        target: BufferTarget,
        usage: BufferUsage,
        size: usize,
        data: Option<&[u8]>,
    ) -> RhiResult<BufferHandle> {
        self.require_initialized()?;

        let native = self
            .api
            .create_buffer()
            .map_err(RhiError::ResourceAllocation)?;

        let gl_target = target.gl_enum();
        let size = data.map_or(size, <[u8]>::len);
        self.api.bind_buffer(gl_target, native);
        self.api.buffer_data(gl_target, size, data, usage.gl_enum());
        self.api.bind_buffer(gl_target, 0);

        if let Err(e) = self.allocation_check("buffer upload") {
            self.api.delete_buffer(native);
            return Err(e);
        }

        if size == 0 {
            log::debug!("created empty {target:?} buffer");
        }
        Ok(self.buffers.insert(BufferRecord { native, target }))
    }

    /// Overwrite a buffer's contents from the start
    ///
    /// The data must fit the allocation made by
    /// [`create_buffer`](Self::create_buffer).
    pub fn update_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> bool {
        let Some(record) = self.buffers.get(handle) else {
            return false;
        };
        let gl_target = record.target.gl_enum();
        self.api.bind_buffer(gl_target, record.native);
        self.api.buffer_sub_data(gl_target, 0, data);
        self.api.bind_buffer(gl_target, 0);
        true
    }

    /// Delete a buffer; false if the handle is already dead
    pub fn delete_buffer(&mut self, handle: BufferHandle) -> bool {
        match self.buffers.remove(handle) {
            Some(record) => {
                self.api.delete_buffer(record.native);
                true
            }
            None => false,
        }
    }

    /// Attach a buffer to an indexed binding point (uniform blocks)
    pub fn bind_buffer_base(&mut self, handle: BufferHandle, index: u32) -> bool {
        let Some(record) = self.buffers.get(handle) else {
            return false;
        };
        let gl_target = record.target.gl_enum();
        self.api.bind_buffer(gl_target, record.native);
        self.api.bind_buffer_base(gl_target, index, record.native);
        self.api.bind_buffer(gl_target, 0);
        true
    }

    /// Describe the vertex layout stored in a vertex buffer
    ///
    /// Attribute state is captured by the currently bound vertex array.
    /// Rejects handles that are dead or do not reference a vertex buffer.
    pub fn set_buffer_layout(&mut self, handle: BufferHandle, layout: &[VertexAttribute]) -> bool {
        let Some(record) = self.buffers.get(handle) else {
            return false;
        };
        if record.target != BufferTarget::Vertex {
            return false;
        }

        self.api.bind_buffer(glow::ARRAY_BUFFER, record.native);
        for entry in layout {
            self.api.enable_vertex_attrib(entry.index);
            self.api.vertex_attrib_pointer(
                entry.index,
                entry.elements,
                entry.kind.gl_enum(),
                false,
                entry.stride,
                entry.offset,
            );
        }
        self.api.bind_buffer(glow::ARRAY_BUFFER, 0);
        true
    }

    /* ===================================================================
            Vertex arrays and geometry
    ====================================================================== */

    /// Create an empty vertex array
    pub fn create_vertex_array(&mut self) -> RhiResult<VertexArrayHandle> {
        self.require_initialized()?;

        let native = self
            .api
            .create_vertex_array()
            .map_err(RhiError::ResourceAllocation)?;
        Ok(self.vertex_arrays.insert(VertexArrayRecord {
            native,
            vertex_count: 0,
            index_count: 0,
            buffers: Vec::new(),
        }))
    }

    /// Delete a vertex array; false if the handle is already dead
    ///
    /// The array's vertex and index buffers stay alive — they are sub-owned
    /// and must be deleted through [`delete_buffer`](Self::delete_buffer).
    pub fn delete_vertex_array(&mut self, handle: VertexArrayHandle) -> bool {
        match self.vertex_arrays.remove(handle) {
            Some(record) => {
                self.api.delete_vertex_array(record.native);
                true
            }
            None => false,
        }
    }

    /// Upload a geometry's vertex and index data to the GPU
    ///
    /// Creates a vertex array with the engine's fixed three-attribute
    /// layout, records the vertex/index counts used to size draws, and
    /// caches the resulting handle on the geometry. Calling this again for
    /// the same geometry creates a fresh vertex array; the previous one is
    /// not reclaimed here.
    pub fn upload_geometry(&mut self, geometry: &mut Geometry) -> RhiResult<VertexArrayHandle> {
        let handle = self.create_vertex_array()?;
        let vao_native = self.vertex_arrays[handle].native;
        self.api.bind_vertex_array(vao_native);

        let vertex_bytes: &[u8] = bytemuck::cast_slice(geometry.vertices());
        let vbo = self.create_buffer(
            BufferTarget::Vertex,
            BufferUsage::Static,
            vertex_bytes.len(),
            Some(vertex_bytes),
        )?;
        self.set_buffer_layout(vbo, &Vertex::layout());
        let mut attached = vec![vbo];

        let index_count = geometry.indices().len() as u32;
        if index_count > 0 {
            let index_bytes: &[u8] = bytemuck::cast_slice(geometry.indices());
            let ibo = self.create_buffer(
                BufferTarget::Index,
                BufferUsage::Static,
                index_bytes.len(),
                Some(index_bytes),
            )?;
            // The element binding is vertex-array state; re-bind after the
            // upload so the array retains it.
            let ibo_native = self.buffers[ibo].native;
            self.api.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, ibo_native);
            attached.push(ibo);
        }

        let record = &mut self.vertex_arrays[handle];
        record.vertex_count = geometry.vertices().len() as u32;
        record.index_count = index_count;
        record.buffers = attached;

        self.api.bind_vertex_array(0);
        self.api.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, 0);

        geometry.set_vertex_array(handle);
        log::debug!(
            "uploaded geometry: {} vertices, {} indices",
            record.vertex_count,
            record.index_count
        );
        Ok(handle)
    }

    /// Draw all triangles of an uploaded geometry
    ///
    /// Indexed when an index buffer was recorded at upload, non-indexed
    /// otherwise. Empty geometry is a successful no-op; a dead or null
    /// handle is rejected.
    pub fn draw_geometry(&mut self, handle: VertexArrayHandle) -> bool {
        let Some(record) = self.vertex_arrays.get(handle) else {
            return false;
        };
        if record.native == 0 {
            return false;
        }

        self.api.bind_vertex_array(record.native);
        if record.index_count > 0 {
            self.api.draw_elements(
                glow::TRIANGLES,
                record.index_count as i32,
                glow::UNSIGNED_INT,
                0,
            );
        } else if record.vertex_count > 0 {
            self.api.draw_arrays(glow::TRIANGLES, 0, record.vertex_count as i32);
        }
        self.api.bind_vertex_array(0);
        true
    }

    /// Vertex and index counts recorded for an uploaded geometry
    #[must_use]
    pub fn vertex_array_counts(&self, handle: VertexArrayHandle) -> Option<(u32, u32)> {
        self.vertex_arrays
            .get(handle)
            .map(|r| (r.vertex_count, r.index_count))
    }

    /* ===================================================================
            Textures
    ====================================================================== */

    /// Upload a 2D texture with the given sampling state
    pub fn create_texture(
        &mut self,
        desc: &TextureDesc,
        sampler: &SamplerDesc,
    ) -> RhiResult<TextureHandle> {
        self.require_initialized()?;

        if !desc.is_consistent() {
            return Err(RhiError::ResourceAllocation(format!(
                "texture pixel data is {} bytes, expected {}",
                desc.pixels.len(),
                desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel()
            )));
        }

        let native = self
            .api
            .create_texture()
            .map_err(RhiError::ResourceAllocation)?;
        let target = glow::TEXTURE_2D;

        self.api.bind_texture(target, native);
        self.api.tex_image_2d(
            target,
            0,
            desc.format.gl_internal_format(),
            desc.width as i32,
            desc.height as i32,
            desc.format.gl_pixel_format(),
            glow::UNSIGNED_BYTE,
            Some(&desc.pixels),
        );
        for (parameter, value) in sampler.gl_parameters() {
            self.api.tex_parameter_i32(target, parameter, value);
        }
        if sampler.generate_mipmaps {
            self.api.generate_mipmap(target);
        }
        self.api.bind_texture(target, 0);

        if let Err(e) = self.allocation_check("texture upload") {
            self.api.delete_texture(native);
            return Err(e);
        }

        log::debug!("created {}x{} {:?} texture", desc.width, desc.height, desc.format);
        Ok(self.textures.insert(TextureRecord { native, target }))
    }

    /// Bind a texture to a texture unit
    pub fn bind_texture(&mut self, unit: u32, handle: TextureHandle) -> bool {
        let Some(record) = self.textures.get(handle) else {
            return false;
        };
        self.api.active_texture(glow::TEXTURE0 + unit);
        self.api.bind_texture(record.target, record.native);
        true
    }

    /// Delete a texture; false if the handle is already dead
    pub fn delete_texture(&mut self, handle: TextureHandle) -> bool {
        match self.textures.remove(handle) {
            Some(record) => {
                self.api.delete_texture(record.native);
                true
            }
            None => false,
        }
    }

    /* ===================================================================
            Frame state
    ====================================================================== */

    /// Set the viewport to cover a `width` x `height` framebuffer
    pub fn set_viewport(&self, width: u32, height: u32) {
        self.api.viewport(0, 0, width as i32, height as i32);
    }

    /// Set the color used by [`clear`](Self::clear)
    pub fn set_clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.api.clear_color(r, g, b, a);
    }

    /// Clear the listed framebuffer aspects
    pub fn clear(&self, mask: ClearMask) {
        self.api.clear(mask.bits());
    }

    /* ===================================================================
            Driver errors
    ====================================================================== */

    /// Drain and log every pending driver error
    ///
    /// Returns `Err` when at least one error was pending, so callers can
    /// decide per checkpoint whether that is fatal.
    pub fn check_error(&self, context: &str) -> RhiResult<()> {
        let codes = self.drain_errors(context);
        if codes.is_empty() {
            Ok(())
        } else {
            Err(RhiError::Driver {
                context: context.to_string(),
                count: codes.len(),
            })
        }
    }

    fn drain_errors(&self, context: &str) -> Vec<u32> {
        let mut codes = Vec::new();
        loop {
            let code = self.api.get_error();
            if code == glow::NO_ERROR {
                break;
            }
            log::error!("driver error {} at '{context}'", error_string(code));
            codes.push(code);
        }
        codes
    }

    fn allocation_check(&self, what: &str) -> RhiResult<()> {
        let codes = self.drain_errors(what);
        if codes.contains(&glow::OUT_OF_MEMORY) {
            Err(RhiError::ResourceAllocation(format!(
                "driver out of memory during {what}"
            )))
        } else {
            Ok(())
        }
    }

    fn require_initialized(&self) -> RhiResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(RhiError::NotInitialized)
        }
    }
}

impl Drop for RenderInterface {
    /// Release every remaining native object
    ///
    /// The GL context must still be current; in practice the interface is
    /// dropped before the window that owns the context.
    fn drop(&mut self) {
        for record in self.buffers.values() {
            self.api.delete_buffer(record.native);
        }
        for record in self.vertex_arrays.values() {
            self.api.delete_vertex_array(record.native);
        }
        for record in self.programs.values() {
            if record.native != 0 {
                self.api.delete_program(record.native);
            }
        }
        for record in self.textures.values() {
            self.api.delete_texture(record.native);
        }
    }
}

/// Symbolic name for a GL error code
fn error_string(code: u32) -> &'static str {
    match code {
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        _ => "unknown GL error",
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::test_api::{Call, FakeApi};
    use super::*;

    fn init_rhi() -> (Rc<FakeApi>, RenderInterface) {
        let api = Rc::new(FakeApi::new());
        let mut rhi = RenderInterface::new(Box::new(Rc::clone(&api)));
        rhi.initialize().expect("initialize");
        api.clear_calls();
        (api, rhi)
    }

    fn triangle() -> Geometry {
        let mut geo = Geometry::new();
        for position in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            geo.add_vertex(Vertex {
                position,
                normal: [0.0, 0.0, 1.0],
                uv: [0.0, 0.0],
            });
        }
        geo
    }

    #[test]
    fn test_initialize_twice_is_rejected() {
        let (_, mut rhi) = init_rhi();
        assert!(matches!(rhi.initialize(), Err(RhiError::AlreadyInitialized)));
    }

    #[test]
    fn test_initialize_registers_builtin_programs() {
        let (_, rhi) = init_rhi();
        for name in [shader::builtin::LIGHTING, shader::builtin::LIGHTING_TEX, shader::builtin::PBR] {
            let program = rhi.builtin_program(name).expect(name);
            assert!(rhi.cached_uniform(program, MODEL_MATRIX_UNIFORM).is_some());
            assert!(rhi.cached_uniform(program, NORMAL_MATRIX_UNIFORM).is_some());
        }
        assert!(!rhi.default_texture().is_null());
    }

    #[test]
    fn test_create_before_initialize_is_rejected() {
        let api = Rc::new(FakeApi::new());
        let mut rhi = RenderInterface::new(Box::new(Rc::clone(&api)));
        assert!(matches!(
            rhi.create_buffer(BufferTarget::Vertex, BufferUsage::Static, 16, None),
            Err(RhiError::NotInitialized)
        ));
    }

    #[test]
    fn test_buffer_lifecycle() {
        let (_, mut rhi) = init_rhi();
        let handle = rhi
            .create_buffer(BufferTarget::Uniform, BufferUsage::Dynamic, 64, None)
            .unwrap();

        // Valid right after creation
        assert!(rhi.bind_buffer_base(handle, 0));
        assert!(rhi.update_buffer(handle, &[0u8; 64]));

        // Deletion succeeds once, then the handle is dead everywhere
        assert!(rhi.delete_buffer(handle));
        assert!(!rhi.delete_buffer(handle));
        assert!(!rhi.bind_buffer_base(handle, 0));
        assert!(!rhi.update_buffer(handle, &[0u8; 64]));
    }

    #[test]
    fn test_null_handles_are_rejected_without_driver_calls() {
        let (api, mut rhi) = init_rhi();
        assert!(!rhi.bind_buffer_base(BufferHandle::null(), 0));
        assert!(!rhi.update_buffer(BufferHandle::null(), &[]));
        assert!(!rhi.delete_buffer(BufferHandle::null()));
        assert!(!rhi.draw_geometry(VertexArrayHandle::null()));
        assert!(!rhi.delete_vertex_array(VertexArrayHandle::null()));
        assert!(!rhi.use_program(ProgramHandle::null()));
        assert!(!rhi.bind_texture(0, TextureHandle::null()));
        assert!(!rhi.delete_texture(TextureHandle::null()));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_zero_size_buffer_is_valid() {
        let (_, mut rhi) = init_rhi();
        let handle = rhi
            .create_buffer(BufferTarget::Vertex, BufferUsage::Static, 0, None)
            .unwrap();
        assert!(rhi.delete_buffer(handle));
    }

    #[test]
    fn test_buffer_allocation_failure_is_surfaced() {
        let (api, mut rhi) = init_rhi();
        api.push_error(glow::OUT_OF_MEMORY);
        let result = rhi.create_buffer(BufferTarget::Vertex, BufferUsage::Static, 1 << 30, None);
        assert!(matches!(result, Err(RhiError::ResourceAllocation(_))));
    }

    #[test]
    fn test_upload_geometry_roundtrip_counts() {
        let (_, mut rhi) = init_rhi();
        let mut geo = Geometry::uv_sphere(1.0, 8, 6);
        let handle = rhi.upload_geometry(&mut geo).unwrap();

        assert_eq!(geo.vertex_array(), handle);
        let (vertices, indices) = rhi.vertex_array_counts(handle).unwrap();
        assert_eq!(vertices as usize, geo.vertices().len());
        assert_eq!(indices as usize, geo.indices().len());
    }

    #[test]
    fn test_draw_three_vertices_without_indices() {
        let (api, mut rhi) = init_rhi();
        let mut geo = triangle();
        let handle = rhi.upload_geometry(&mut geo).unwrap();
        api.clear_calls();

        assert!(rhi.draw_geometry(handle));

        let draws: Vec<Call> = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::DrawArrays { .. } | Call::DrawElements { .. }))
            .collect();
        assert_eq!(
            draws,
            vec![Call::DrawArrays {
                mode: glow::TRIANGLES,
                first: 0,
                count: 3
            }]
        );
        assert!(rhi.check_error("draw scenario").is_ok());
    }

    #[test]
    fn test_draw_uses_index_buffer_when_present() {
        let (api, mut rhi) = init_rhi();
        let mut geo = triangle();
        geo.set_indices(vec![0, 1, 2]);
        let handle = rhi.upload_geometry(&mut geo).unwrap();
        api.clear_calls();

        assert!(rhi.draw_geometry(handle));
        let draws: Vec<Call> = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::DrawArrays { .. } | Call::DrawElements { .. }))
            .collect();
        assert_eq!(
            draws,
            vec![Call::DrawElements {
                mode: glow::TRIANGLES,
                count: 3
            }]
        );
    }

    #[test]
    fn test_empty_geometry_draw_is_a_noop() {
        let (api, mut rhi) = init_rhi();
        let mut geo = Geometry::new();
        let handle = rhi.upload_geometry(&mut geo).unwrap();
        api.clear_calls();

        assert!(rhi.draw_geometry(handle));
        assert!(!api
            .calls()
            .iter()
            .any(|c| matches!(c, Call::DrawArrays { .. } | Call::DrawElements { .. })));
    }

    #[test]
    fn test_delete_vertex_array_is_idempotent_failure() {
        let (_, mut rhi) = init_rhi();
        let handle = rhi.create_vertex_array().unwrap();
        assert!(rhi.delete_vertex_array(handle));
        assert!(!rhi.delete_vertex_array(handle));
        assert!(!rhi.draw_geometry(handle));
    }

    #[test]
    fn test_deleting_vertex_array_keeps_buffers_alive() {
        let (_, mut rhi) = init_rhi();
        let mut geo = triangle();
        geo.set_indices(vec![0, 1, 2]);
        let vao = rhi.upload_geometry(&mut geo).unwrap();
        let buffer_count = rhi.buffers.len();

        assert!(rhi.delete_vertex_array(vao));
        assert_eq!(rhi.buffers.len(), buffer_count);
    }

    #[test]
    fn test_named_uniforms_resolve_against_current_program() {
        let (api, mut rhi) = init_rhi();
        let lighting = rhi.builtin_program(shader::builtin::LIGHTING).unwrap();
        let pbr = rhi.builtin_program(shader::builtin::PBR).unwrap();
        let lighting_native = rhi.programs[lighting].native;
        let pbr_native = rhi.programs[pbr].native;

        rhi.use_program(lighting);
        rhi.set_float("gamma", 2.2);
        rhi.use_program(pbr);
        rhi.set_float("gamma", 2.2);

        let queries: Vec<Call> = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::UniformLocationQuery { .. }))
            .collect();
        assert_eq!(
            queries,
            vec![
                Call::UniformLocationQuery {
                    program: lighting_native,
                    name: "gamma".to_string()
                },
                Call::UniformLocationQuery {
                    program: pbr_native,
                    name: "gamma".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_uniform_setters_are_noops_without_program() {
        let (api, mut rhi) = init_rhi();
        let no_program = rhi.no_program();
        rhi.use_program(no_program);
        api.clear_calls();

        rhi.set_float("gamma", 2.2);
        rhi.set_vector3("spec", &Vec3::zeros());
        assert!(!api
            .calls()
            .iter()
            .any(|c| matches!(c, Call::SetF32 { .. } | Call::SetVec3 { .. })));
    }

    #[test]
    fn test_compile_failure_logs_and_returns_error() {
        let (_, mut rhi) = init_rhi();
        let bad = ShaderSource::new(ShaderStage::Fragment, "broken.frag", "#error broken\n");
        match rhi.compile_shader(&bad) {
            Err(RhiError::ShaderCompile { name, log }) => {
                assert_eq!(name, "broken.frag");
                assert!(!log.is_empty());
            }
            other => panic!("expected compile failure, got {other:?}"),
        }
    }

    #[test]
    fn test_link_without_fragment_stage_fails() {
        // A fragment stage that fails to compile never joins the program;
        // linking the remainder must report an unusable program rather than
        // silently succeed.
        let (_, mut rhi) = init_rhi();
        let vert = rhi
            .compile_shader(&ShaderSource::new(
                ShaderStage::Vertex,
                "lighting.vert",
                shader::builtin::LIGHTING_VERT,
            ))
            .unwrap();
        let bad = ShaderSource::new(ShaderStage::Fragment, "broken.frag", "#error broken\n");
        assert!(rhi.compile_shader(&bad).is_err());

        let mut desc = Shader::new("half-program");
        desc.add_stage(vert);
        assert!(matches!(
            rhi.link_program(&desc),
            Err(RhiError::ProgramLink { .. })
        ));
    }

    #[test]
    fn test_check_error_drains_all_pending_codes() {
        let (api, rhi) = init_rhi();
        api.push_error(glow::INVALID_ENUM);
        api.push_error(glow::INVALID_OPERATION);

        match rhi.check_error("checkpoint") {
            Err(RhiError::Driver { context, count }) => {
                assert_eq!(context, "checkpoint");
                assert_eq!(count, 2);
            }
            other => panic!("expected driver error, got {other:?}"),
        }
        // Queue is drained
        assert!(rhi.check_error("checkpoint").is_ok());
    }

    #[test]
    fn test_texture_lifecycle() {
        let (_, mut rhi) = init_rhi();
        let desc = TextureDesc::solid([10, 20, 30, 255]);
        let handle = rhi.create_texture(&desc, &SamplerDesc::default()).unwrap();
        assert!(rhi.bind_texture(3, handle));
        assert!(rhi.delete_texture(handle));
        assert!(!rhi.delete_texture(handle));
        assert!(!rhi.bind_texture(3, handle));
    }

    #[test]
    fn test_inconsistent_texture_rejected() {
        let (_, mut rhi) = init_rhi();
        let desc = TextureDesc {
            width: 4,
            height: 4,
            format: TextureFormat::Rgba8,
            pixels: vec![0; 7],
        };
        assert!(matches!(
            rhi.create_texture(&desc, &SamplerDesc::default()),
            Err(RhiError::ResourceAllocation(_))
        ));
    }

    #[test]
    fn test_set_buffer_block_on_sentinel_is_rejected() {
        let (_, mut rhi) = init_rhi();
        let no_program = rhi.no_program();
        rhi.use_program(no_program);
        assert!(!rhi.set_buffer_block(CAMERA_BLOCK, 0));
    }
}
