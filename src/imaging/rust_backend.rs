//! Pure Rust rendering backend, no system libraries.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` (pure Rust decoders) |
//! | Stretch | `image::DynamicImage::resize_exact` with the configured filter |
//! | Encode → PNG | `image::codecs::png::PngEncoder` via `write_to` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::RenderParams;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Raster formats accepted as input, by file extension.
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Returns true when `name` ends in one of [`RASTER_EXTENSIONS`], ignoring case.
pub fn has_raster_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        RASTER_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an in-memory image, sniffing the format from its magic bytes.
fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(source).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Encode as PNG into a fresh buffer.
fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| BackendError::Encode(format!("PNG encode failed: {}", e)))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn render(&self, params: &RenderParams) -> Result<Vec<u8>, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::InvalidDimensions {
                width: params.width,
                height: params.height,
            });
        }
        let img = load_image(params.source)?;
        let stretched = img.resize_exact(
            params.width,
            params.height,
            params.filter.as_filter_type(),
        );
        encode_png(&stretched)
    }
}
