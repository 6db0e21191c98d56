//! Texture and sampler descriptors
//!
//! CPU-side descriptions consumed by
//! [`crate::rhi::RenderInterface::create_texture`]. Pixel data is tightly
//! packed rows, bottom row first (OpenGL convention); the asset loaders
//! take care of the flip.

/// Pixel format of a texture upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Single 8-bit channel
    R8,
    /// Three 8-bit channels
    Rgb8,
    /// Four 8-bit channels
    Rgba8,
}

impl TextureFormat {
    /// GL sized internal format
    #[must_use]
    pub fn gl_internal_format(self) -> i32 {
        match self {
            TextureFormat::R8 => glow::R8 as i32,
            TextureFormat::Rgb8 => glow::RGB8 as i32,
            TextureFormat::Rgba8 => glow::RGBA8 as i32,
        }
    }

    /// GL pixel transfer format
    #[must_use]
    pub fn gl_pixel_format(self) -> u32 {
        match self {
            TextureFormat::R8 => glow::RED,
            TextureFormat::Rgb8 => glow::RGB,
            TextureFormat::Rgba8 => glow::RGBA,
        }
    }

    /// Bytes per pixel
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 => 4,
        }
    }
}

/// A 2D image ready for GPU upload
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Tightly packed pixel rows
    pub pixels: Vec<u8>,
}

impl TextureDesc {
    /// A 1x1 solid-color RGBA texture
    #[must_use]
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8,
            pixels: rgba.to_vec(),
        }
    }

    /// True when `pixels` matches `width * height * bpp`
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.pixels.len()
            == self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    /// Nearest-texel sampling
    Nearest,
    /// Bilinear sampling
    Linear,
    /// Trilinear sampling across mip levels
    LinearMipmapLinear,
}

impl TextureFilter {
    fn gl_enum(self) -> i32 {
        match self {
            TextureFilter::Nearest => glow::NEAREST as i32,
            TextureFilter::Linear => glow::LINEAR as i32,
            TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR as i32,
        }
    }
}

/// Texture coordinate wrapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    /// Tile the texture
    Repeat,
    /// Mirror on every repeat
    MirroredRepeat,
    /// Clamp to the edge texel
    ClampToEdge,
}

impl TextureWrap {
    fn gl_enum(self) -> i32 {
        match self {
            TextureWrap::Repeat => glow::REPEAT as i32,
            TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT as i32,
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE as i32,
        }
    }
}

/// Sampling state applied at texture creation
#[derive(Debug, Clone, Copy)]
pub struct SamplerDesc {
    /// Minification filter
    pub min_filter: TextureFilter,
    /// Magnification filter
    pub mag_filter: TextureFilter,
    /// Wrapping along S
    pub wrap_s: TextureWrap,
    /// Wrapping along T
    pub wrap_t: TextureWrap,
    /// Generate a mip chain after upload
    pub generate_mipmaps: bool,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            min_filter: TextureFilter::LinearMipmapLinear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
            generate_mipmaps: true,
        }
    }
}

impl SamplerDesc {
    /// GL parameter values as (parameter, value) pairs
    #[must_use]
    pub fn gl_parameters(&self) -> [(u32, i32); 4] {
        [
            (glow::TEXTURE_MIN_FILTER, self.min_filter.gl_enum()),
            (glow::TEXTURE_MAG_FILTER, self.mag_filter.gl_enum()),
            (glow::TEXTURE_WRAP_S, self.wrap_s.gl_enum()),
            (glow::TEXTURE_WRAP_T, self.wrap_t.gl_enum()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_texture_is_consistent() {
        let tex = TextureDesc::solid([255, 255, 255, 255]);
        assert!(tex.is_consistent());
        assert_eq!(tex.pixels.len(), 4);
    }

    #[test]
    fn test_inconsistent_texture_detected() {
        let tex = TextureDesc {
            width: 2,
            height: 2,
            format: TextureFormat::Rgba8,
            pixels: vec![0; 3],
        };
        assert!(!tex.is_consistent());
    }
}
