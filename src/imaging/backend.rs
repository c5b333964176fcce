//! Image rendering backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and render.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate with no system libraries. Tests use the recording `MockBackend`.

use super::params::RenderParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Not a decodable image: {0}")]
    Decode(String),
    #[error("Invalid target size {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image rendering backends.
///
/// Implementations must be pure: a render depends only on its parameters and
/// allocates its own raster, so calls can run concurrently on the rayon pool.
pub trait ImageBackend: Sync {
    /// Get the intrinsic dimensions of an encoded image.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, stretch to exactly `width × height`, and encode as PNG.
    fn render(&self, params: &RenderParams) -> Result<Vec<u8>, BackendError>;
}
