//! Materials: the seam between shapes and the render interface
//!
//! A material names the program it shades with and uploads its uniforms and
//! texture bindings when the renderer asks. Texture units follow a fixed
//! assignment shared with the built-in shaders: diffuse 1, normal 2,
//! metallic 3, roughness 4, irradiance 6, prefiltered environment 7,
//! BRDF lookup 8.

use crate::foundation::math::Vec3;
use crate::rhi::{ProgramHandle, RenderInterface, TextureHandle};

use slotmap::Key;

/// Per-shape GPU state supplier
///
/// Implementations must not create or delete resources here — the renderer
/// calls [`upload_data`](Self::upload_data) once per shape per frame, after
/// binding [`program`](Self::program).
pub trait Material {
    /// Program this material shades with
    fn program(&self) -> ProgramHandle;

    /// Set uniforms and bind textures for the next draw
    fn upload_data(&self, rhi: &mut RenderInterface);
}

/// GLSL has no bool uniforms in our setter family; 0/1 floats stand in
fn flag(on: bool) -> f32 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Bind `handle` to `unit`, falling back to the 1x1 white default
fn bind_or_default(rhi: &mut RenderInterface, unit: u32, handle: TextureHandle) {
    if !rhi.bind_texture(unit, handle) {
        let default = rhi.default_texture();
        rhi.bind_texture(unit, default);
    }
}

/// Metallic/roughness PBR material with optional texture maps
///
/// Scalar metallic/roughness values are used wherever the corresponding map
/// is absent; `has*` uniforms tell the shader which inputs are live.
pub struct PbrMaterial {
    program: ProgramHandle,

    metallic: f32,
    roughness: f32,
    /// Fresnel reflectance at normal incidence
    f0: Vec3,

    diffuse_tex: TextureHandle,
    normal_tex: TextureHandle,
    metallic_tex: TextureHandle,
    roughness_tex: TextureHandle,

    // Environment maps, shared by every material lit by the same sky
    irradiance_tex: TextureHandle,
    ggx_tex: TextureHandle,
    brdf_tex: TextureHandle,
}

impl PbrMaterial {
    /// Dielectric F0 used when no specular color is set
    pub const DEFAULT_F0: f32 = 0.04;

    /// Create a material shading with `program` (usually the built-in
    /// [`crate::rhi::shader::builtin::PBR`] program)
    #[must_use]
    pub fn new(program: ProgramHandle) -> Self {
        Self {
            program,
            metallic: 1.0,
            roughness: 0.0,
            f0: Vec3::from_element(Self::DEFAULT_F0),
            diffuse_tex: TextureHandle::null(),
            normal_tex: TextureHandle::null(),
            metallic_tex: TextureHandle::null(),
            roughness_tex: TextureHandle::null(),
            irradiance_tex: TextureHandle::null(),
            ggx_tex: TextureHandle::null(),
            brdf_tex: TextureHandle::null(),
        }
    }

    /// Scalar metallic factor
    pub fn set_metallic(&mut self, metallic: f32) {
        self.metallic = metallic;
    }

    /// Scalar roughness factor
    pub fn set_roughness(&mut self, roughness: f32) {
        self.roughness = roughness;
    }

    /// Fresnel reflectance at normal incidence
    pub fn set_specular(&mut self, f0: Vec3) {
        self.f0 = f0;
    }

    /// Diffuse (albedo) texture
    pub fn set_diffuse_texture(&mut self, handle: TextureHandle) {
        self.diffuse_tex = handle;
    }

    /// Tangent-space normal map
    pub fn set_normal_texture(&mut self, handle: TextureHandle) {
        self.normal_tex = handle;
    }

    /// Metallic map; overrides the scalar factor when set
    pub fn set_metallic_texture(&mut self, handle: TextureHandle) {
        self.metallic_tex = handle;
    }

    /// Roughness map; overrides the scalar factor when set
    pub fn set_roughness_texture(&mut self, handle: TextureHandle) {
        self.roughness_tex = handle;
    }

    /// Diffuse irradiance environment map
    pub fn set_irradiance_texture(&mut self, handle: TextureHandle) {
        self.irradiance_tex = handle;
    }

    /// Prefiltered specular environment map
    pub fn set_ggx_texture(&mut self, handle: TextureHandle) {
        self.ggx_tex = handle;
    }

    /// BRDF integration lookup table
    pub fn set_brdf_texture(&mut self, handle: TextureHandle) {
        self.brdf_tex = handle;
    }
}

impl Material for PbrMaterial {
    fn program(&self) -> ProgramHandle {
        self.program
    }

    fn upload_data(&self, rhi: &mut RenderInterface) {
        rhi.set_float("metallic", self.metallic);
        rhi.set_float("roughness", self.roughness);
        rhi.set_vector3("spec", &self.f0);

        bind_or_default(rhi, 1, self.diffuse_tex);
        rhi.set_sampler("diffuseTex", 1);

        rhi.set_float("hasNormalTex", flag(!self.normal_tex.is_null()));
        if rhi.bind_texture(2, self.normal_tex) {
            rhi.set_sampler("normalTex", 2);
        }

        rhi.set_float("hasMetallicTex", flag(!self.metallic_tex.is_null()));
        if rhi.bind_texture(3, self.metallic_tex) {
            rhi.set_sampler("metallicTex", 3);
        }

        rhi.set_float("hasRoughTex", flag(!self.roughness_tex.is_null()));
        if rhi.bind_texture(4, self.roughness_tex) {
            rhi.set_sampler("roughTex", 4);
        }

        let has_env = !self.irradiance_tex.is_null()
            && !self.ggx_tex.is_null()
            && !self.brdf_tex.is_null();
        rhi.set_float("hasEnvMaps", flag(has_env));
        if has_env {
            rhi.bind_texture(6, self.irradiance_tex);
            rhi.set_sampler("irradianceTex", 6);
            rhi.bind_texture(7, self.ggx_tex);
            rhi.set_sampler("ggxTex", 7);
            rhi.bind_texture(8, self.brdf_tex);
            rhi.set_sampler("brdfTex", 8);
        }
    }
}

/// Blinn-Phong material for the built-in `lighting` and `lighting_tex`
/// programs
pub struct LightingMaterial {
    program: ProgramHandle,
    diffuse: Vec3,
    specular: Vec3,
    shininess: f32,
    diffuse_tex: TextureHandle,
}

impl LightingMaterial {
    /// Create an untextured lit material
    #[must_use]
    pub fn new(program: ProgramHandle) -> Self {
        Self {
            program,
            diffuse: Vec3::from_element(0.8),
            specular: Vec3::from_element(0.2),
            shininess: 32.0,
            diffuse_tex: TextureHandle::null(),
        }
    }

    /// Create a textured lit material
    #[must_use]
    pub fn with_texture(program: ProgramHandle, diffuse_tex: TextureHandle) -> Self {
        Self {
            diffuse_tex,
            ..Self::new(program)
        }
    }

    /// Diffuse surface color
    pub fn set_diffuse(&mut self, diffuse: Vec3) {
        self.diffuse = diffuse;
    }

    /// Specular highlight color
    pub fn set_specular(&mut self, specular: Vec3) {
        self.specular = specular;
    }

    /// Specular exponent
    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }
}

impl Material for LightingMaterial {
    fn program(&self) -> ProgramHandle {
        self.program
    }

    fn upload_data(&self, rhi: &mut RenderInterface) {
        rhi.set_vector3("diffuse", &self.diffuse);
        rhi.set_vector3("specular", &self.specular);
        rhi.set_float("shininess", self.shininess);

        if !self.diffuse_tex.is_null() {
            bind_or_default(rhi, 1, self.diffuse_tex);
            rhi.set_sampler("diffuseTex", 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::rhi::test_api::{Call, FakeApi};
    use crate::rhi::{shader, SamplerDesc, TextureDesc};

    fn init_rhi() -> (Rc<FakeApi>, RenderInterface) {
        let api = Rc::new(FakeApi::new());
        let mut rhi = RenderInterface::new(Box::new(Rc::clone(&api)));
        rhi.initialize().expect("initialize");
        (api, rhi)
    }

    fn active_units(api: &FakeApi) -> Vec<u32> {
        api.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ActiveTexture(unit) => Some(unit - glow::TEXTURE0),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_pbr_material_binds_fixed_units() {
        let (api, mut rhi) = init_rhi();
        let program = rhi.builtin_program(shader::builtin::PBR).unwrap();
        let tex = rhi
            .create_texture(&TextureDesc::solid([128, 128, 128, 255]), &SamplerDesc::default())
            .unwrap();

        let mut material = PbrMaterial::new(program);
        material.set_diffuse_texture(tex);
        material.set_normal_texture(tex);
        material.set_metallic_texture(tex);

        rhi.use_program(program);
        api.clear_calls();
        material.upload_data(&mut rhi);

        // Roughness map is absent; unit 4 stays untouched. No env maps.
        assert_eq!(active_units(&api), vec![1, 2, 3]);
    }

    #[test]
    fn test_pbr_material_falls_back_to_default_diffuse() {
        let (api, mut rhi) = init_rhi();
        let program = rhi.builtin_program(shader::builtin::PBR).unwrap();
        let material = PbrMaterial::new(program);

        rhi.use_program(program);
        api.clear_calls();
        material.upload_data(&mut rhi);

        // The white default texture lands on the diffuse unit
        assert_eq!(active_units(&api), vec![1]);
    }

    #[test]
    fn test_pbr_material_env_maps_require_all_three() {
        let (api, mut rhi) = init_rhi();
        let program = rhi.builtin_program(shader::builtin::PBR).unwrap();
        let tex = rhi
            .create_texture(&TextureDesc::solid([0, 0, 0, 255]), &SamplerDesc::default())
            .unwrap();

        let mut material = PbrMaterial::new(program);
        material.set_irradiance_texture(tex);
        // ggx and brdf missing: environment lighting must stay off
        rhi.use_program(program);
        api.clear_calls();
        material.upload_data(&mut rhi);
        assert!(!active_units(&api).contains(&6));

        material.set_ggx_texture(tex);
        material.set_brdf_texture(tex);
        api.clear_calls();
        material.upload_data(&mut rhi);
        let units = active_units(&api);
        assert!(units.contains(&6) && units.contains(&7) && units.contains(&8));
    }

    #[test]
    fn test_lighting_material_skips_texture_when_absent() {
        let (api, mut rhi) = init_rhi();
        let program = rhi.builtin_program(shader::builtin::LIGHTING).unwrap();
        let material = LightingMaterial::new(program);

        rhi.use_program(program);
        api.clear_calls();
        material.upload_data(&mut rhi);
        assert!(active_units(&api).is_empty());
    }
}
