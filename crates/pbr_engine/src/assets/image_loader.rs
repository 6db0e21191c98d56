//! Image decoding into texture descriptors

use std::path::Path;

use thiserror::Error;

use crate::rhi::{TextureDesc, TextureFormat};

/// Image loading errors
#[derive(Error, Debug)]
pub enum ImageError {
    /// The file could not be read or decoded
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode an image file into an RGBA8 texture descriptor
///
/// Rows are flipped so the first row is the bottom one, matching the upload
/// convention of [`crate::rhi::RenderInterface::create_texture`].
pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<TextureDesc, ImageError> {
    let path = path.as_ref();
    let image = image::open(path)?.flipv().to_rgba8();
    let (width, height) = image.dimensions();

    log::debug!("decoded '{}' ({width}x{height})", path.display());
    Ok(TextureDesc {
        width,
        height,
        format: TextureFormat::Rgba8,
        pixels: image.into_raw(),
    })
}

/// Generate a two-color checkerboard texture
///
/// `cells` squares per side, each `cell_size` pixels. The demo uses this for
/// its floor when no image assets are on disk.
#[must_use]
pub fn checker_texture(cells: u32, cell_size: u32, light: [u8; 4], dark: [u8; 4]) -> TextureDesc {
    let size = cells * cell_size;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);

    for y in 0..size {
        for x in 0..size {
            let even = ((x / cell_size) + (y / cell_size)) % 2 == 0;
            pixels.extend_from_slice(if even { &light } else { &dark });
        }
    }

    TextureDesc {
        width: size,
        height: size,
        format: TextureFormat::Rgba8,
        pixels,
    }
}
