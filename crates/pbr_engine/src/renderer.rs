//! Frame renderer
//!
//! [`Renderer`] owns the camera and lights uniform buffers and the global
//! tone-mapping state, and sequences each frame against the render hardware
//! interface in a fixed order: clear, camera block, lights block, then one
//! pass over the scene's shapes in insertion order. It allocates GPU
//! resources only in [`prepare`](Renderer::prepare) — the per-frame path
//! reuses existing handles exclusively.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use slotmap::Key;

use crate::config::RendererConfig;
use crate::foundation::math::{Mat4, Vec3};
use crate::rhi::{
    BufferHandle, BufferTarget, BufferUsage, ClearMask, ProgramHandle, RenderInterface, RhiError,
    RhiResult, CAMERA_BLOCK_BINDING, LIGHTS_BLOCK_BINDING, MODEL_MATRIX_UNIFORM,
    NORMAL_MATRIX_UNIFORM,
};
use crate::scene::{Camera, Light, LightType, Scene};

/// Maximum number of lights the lights uniform block holds
pub const MAX_LIGHTS: usize = 4;

/// Tone mapping operator applied in the fragment stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneOperator {
    /// Exposure scale and gamma only
    Simple,
    /// Reinhard luminance compression
    Reinhard,
    /// Filmic curve with adjustable shoulder/toe coefficients
    Uncharted,
}

impl ToneOperator {
    /// Index the fragment shader switches on
    #[must_use]
    pub fn shader_index(self) -> f32 {
        match self {
            ToneOperator::Simple => 0.0,
            ToneOperator::Reinhard => 1.0,
            ToneOperator::Uncharted => 2.0,
        }
    }
}

/// Coefficients of the filmic tone curve
///
/// The defaults are the widely used Uncharted 2 values; they only matter
/// when [`ToneOperator::Uncharted`] is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCurve {
    /// Shoulder strength
    pub a: f32,
    /// Linear strength
    pub b: f32,
    /// Linear angle
    pub c: f32,
    /// Toe strength
    pub d: f32,
    /// Toe numerator
    pub e: f32,
    /// Toe denominator
    pub f: f32,
    /// Linear white point
    pub white: f32,
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self {
            a: 0.15,
            b: 0.50,
            c: 0.10,
            d: 0.20,
            e: 0.02,
            f: 0.30,
            white: 11.2,
        }
    }
}

/// Camera uniform block, std140 layout
///
/// Matches `CameraBlock` in the built-in shaders; matrices are column-major.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraData {
    /// World-to-camera matrix
    pub view_matrix: [f32; 16],
    /// Camera-to-clip matrix
    pub proj_matrix: [f32; 16],
    /// Combined view-projection matrix
    pub view_proj_matrix: [f32; 16],
    /// Camera position in world space
    pub position: [f32; 3],
    /// std140 padding
    pub _pad: f32,
}

impl CameraData {
    /// Snapshot a camera's matrices for upload
    #[must_use]
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_matrix: mat4_array(camera.view_matrix()),
            proj_matrix: mat4_array(camera.projection_matrix()),
            view_proj_matrix: mat4_array(&camera.view_projection_matrix()),
            position: camera.position().into(),
            _pad: 0.0,
        }
    }
}

/// One light in the lights uniform block, std140 layout
///
/// Each `vec3` is padded to 16 bytes by the scalar that follows it, so the
/// Rust layout and the std140 layout coincide exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightData {
    /// World position (point lights)
    pub position: [f32; 3],
    /// 0 = directional, 1 = point
    pub kind: f32,
    /// Direction (directional lights)
    pub direction: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
    /// Linear-space color
    pub color: [f32; 3],
    /// Attenuation range (point lights)
    pub range: f32,
}

impl From<&Light> for LightData {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.into(),
            kind: match light.light_type {
                LightType::Directional => 0.0,
                LightType::Point => 1.0,
            },
            direction: light.direction.into(),
            intensity: light.intensity,
            color: light.color.into(),
            range: light.range,
        }
    }
}

/// Lights uniform block, std140 layout
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightsData {
    /// Fixed-capacity light array; entries past `count` are zeroed
    pub lights: [LightData; MAX_LIGHTS],
    /// Number of live entries
    pub count: u32,
    /// std140 padding
    pub _pad: [u32; 3],
}

impl LightsData {
    /// Pack up to [`MAX_LIGHTS`] lights; extra lights are ignored
    #[must_use]
    pub fn gather(lights: &[Light]) -> Self {
        if lights.len() > MAX_LIGHTS {
            log::debug!(
                "scene has {} lights, uploading the first {MAX_LIGHTS}",
                lights.len()
            );
        }

        let mut data = Self::zeroed();
        for (slot, light) in data.lights.iter_mut().zip(lights) {
            *slot = LightData::from(light);
        }
        data.count = lights.len().min(MAX_LIGHTS) as u32;
        data
    }
}

fn mat4_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    out.copy_from_slice(m.as_slice());
    out
}

/// Sequences per-frame GPU state updates and draw calls
///
/// Create once, [`prepare`](Self::prepare) once after the render interface
/// is initialized, then call [`render`](Self::render) every frame.
pub struct Renderer {
    gamma: f32,
    exposure: f32,
    tone: ToneOperator,
    curve: ToneCurve,
    clear_color: [f32; 4],

    camera_buffer: BufferHandle,
    lights_buffer: BufferHandle,

    /// Programs that already received this frame's tone uniforms
    toned_programs: Vec<ProgramHandle>,
}

impl Renderer {
    /// Create a renderer with the given tone settings
    #[must_use]
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            gamma: config.gamma,
            exposure: config.exposure,
            tone: config.tone_operator,
            curve: ToneCurve::default(),
            clear_color: [0.05, 0.05, 0.08, 1.0],
            camera_buffer: BufferHandle::null(),
            lights_buffer: BufferHandle::null(),
            toned_programs: Vec::new(),
        }
    }

    /// One-time GPU setup: allocate the camera and lights uniform buffers
    /// and attach them to their fixed binding points
    ///
    /// The render loop itself never allocates; everything it touches is
    /// created here.
    pub fn prepare(&mut self, rhi: &mut RenderInterface) -> RhiResult<()> {
        if !self.camera_buffer.is_null() {
            log::warn!("renderer is already prepared");
            return Ok(());
        }

        self.camera_buffer = rhi.create_buffer(
            BufferTarget::Uniform,
            BufferUsage::Dynamic,
            std::mem::size_of::<CameraData>(),
            None,
        )?;
        self.lights_buffer = rhi.create_buffer(
            BufferTarget::Uniform,
            BufferUsage::Dynamic,
            std::mem::size_of::<LightsData>(),
            None,
        )?;

        rhi.bind_buffer_base(self.camera_buffer, CAMERA_BLOCK_BINDING);
        rhi.bind_buffer_base(self.lights_buffer, LIGHTS_BLOCK_BINDING);

        log::info!("renderer prepared (camera + lights uniform buffers)");
        Ok(())
    }

    /// Render one frame
    ///
    /// Fixed protocol: clear, upload the camera block, upload the lights
    /// block, then draw every shape in scene-insertion order. Driver errors
    /// accumulated during the frame are drained at the end and returned;
    /// the caller decides whether a failed frame is fatal.
    pub fn render(
        &mut self,
        rhi: &mut RenderInterface,
        scene: &Scene,
        camera: &Camera,
    ) -> RhiResult<()> {
        if self.camera_buffer.is_null() {
            return Err(RhiError::NotInitialized);
        }

        let [r, g, b, a] = self.clear_color;
        rhi.set_clear_color(r, g, b, a);
        rhi.clear(ClearMask::COLOR | ClearMask::DEPTH);

        self.upload_camera_buffer(rhi, camera);
        self.upload_lights_buffer(rhi, scene);
        self.draw_shapes(rhi, scene);

        rhi.check_error("frame")
    }

    fn upload_camera_buffer(&self, rhi: &mut RenderInterface, camera: &Camera) {
        let data = CameraData::from_camera(camera);
        rhi.update_buffer(self.camera_buffer, bytemuck::bytes_of(&data));
    }

    fn upload_lights_buffer(&self, rhi: &mut RenderInterface, scene: &Scene) {
        let data = LightsData::gather(scene.lights());
        rhi.update_buffer(self.lights_buffer, bytemuck::bytes_of(&data));
    }

    fn draw_shapes(&mut self, rhi: &mut RenderInterface, scene: &Scene) {
        self.toned_programs.clear();

        for shape in scene.shapes() {
            let program = shape.material().program();
            if !rhi.use_program(program) {
                log::trace!("skipping shape: its material's program handle is dead");
                continue;
            }

            // Tone state is global; push it the first time each program is
            // bound this frame.
            if !self.toned_programs.contains(&program) {
                self.upload_tone_uniforms(rhi);
                self.toned_programs.push(program);
            }

            match rhi.cached_uniform(program, MODEL_MATRIX_UNIFORM) {
                Some(loc) => rhi.set_matrix4_at(loc, shape.object_to_world()),
                None => rhi.set_matrix4(MODEL_MATRIX_UNIFORM, shape.object_to_world()),
            }
            match rhi.cached_uniform(program, NORMAL_MATRIX_UNIFORM) {
                Some(loc) => rhi.set_matrix3_at(loc, shape.normal_matrix()),
                None => rhi.set_matrix3(NORMAL_MATRIX_UNIFORM, shape.normal_matrix()),
            }

            shape.material().upload_data(rhi);

            if !rhi.draw_geometry(shape.geometry().vertex_array()) {
                log::trace!("skipping shape: geometry has no GPU upload");
            }
        }
    }

    fn upload_tone_uniforms(&self, rhi: &RenderInterface) {
        rhi.set_float("gamma", self.gamma);
        rhi.set_float("exposure", self.exposure);
        rhi.set_float("toneOperator", self.tone.shader_index());
        rhi.set_vector3(
            "toneParamsA",
            &Vec3::new(self.curve.a, self.curve.b, self.curve.c),
        );
        rhi.set_vector3(
            "toneParamsB",
            &Vec3::new(self.curve.d, self.curve.e, self.curve.f),
        );
        rhi.set_float("toneWhite", self.curve.white);
    }

    /// Display gamma
    #[must_use]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Set the display gamma
    pub fn set_gamma(&mut self, gamma: f32) {
        self.gamma = gamma;
    }

    /// Exposure multiplier applied before tone mapping
    #[must_use]
    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    /// Set the exposure multiplier
    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    /// Active tone operator
    #[must_use]
    pub fn tone_operator(&self) -> ToneOperator {
        self.tone
    }

    /// Select the tone operator
    pub fn set_tone_operator(&mut self, tone: ToneOperator) {
        self.tone = tone;
    }

    /// Filmic curve coefficients
    #[must_use]
    pub fn tone_curve(&self) -> ToneCurve {
        self.curve
    }

    /// Replace the filmic curve coefficients
    pub fn set_tone_curve(&mut self, curve: ToneCurve) {
        self.curve = curve;
    }

    /// Set the background color
    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }
}
