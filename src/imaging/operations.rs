//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a resolved layout (or none), compute the target size, and call
//! the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_target_size;
use super::params::{RenderParams, ResampleFilter};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, source: &[u8]) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok((dims.width, dims.height))
}

/// An encoded render and the size it was rasterized at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Render `source` at an explicit size.
pub fn render_to_size(
    backend: &impl ImageBackend,
    source: &[u8],
    (width, height): (u32, u32),
    filter: ResampleFilter,
) -> Result<RenderedImage> {
    let pixels = backend.render(&RenderParams {
        source,
        width,
        height,
        filter,
    })?;
    Ok(RenderedImage {
        pixels,
        width,
        height,
    })
}

/// Render `source` at its layout size, or at its intrinsic size when no
/// layout matched.
///
/// The intrinsic size is only read (header decode) when needed.
pub fn render_for_layout(
    backend: &impl ImageBackend,
    source: &[u8],
    layout_size: Option<(u32, u32)>,
    filter: ResampleFilter,
) -> Result<RenderedImage> {
    let target = match layout_size {
        Some(size) => size,
        None => calculate_target_size(None, get_dimensions(backend, source)?),
    };
    render_to_size(backend, source, target, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, b"img").unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn render_for_layout_skips_identify_when_matched() {
        let backend = MockBackend::new();

        let out = render_for_layout(
            &backend,
            b"img",
            Some((1080, 1720)),
            ResampleFilter::Triangle,
        )
        .unwrap();

        assert_eq!((out.width, out.height), (1080, 1720));
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Render {
                width: 1080,
                height: 1720,
                ..
            }
        ));
    }

    #[test]
    fn render_for_layout_uses_intrinsic_when_unmatched() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1200,
            height: 400,
        }]);

        let out = render_for_layout(&backend, b"img", None, ResampleFilter::Nearest).unwrap();

        assert_eq!((out.width, out.height), (1200, 400));
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Identify(_)));
        assert!(matches!(
            &ops[1],
            RecordedOp::Render {
                width: 1200,
                height: 400,
                filter: ResampleFilter::Nearest,
                ..
            }
        ));
    }

    #[test]
    fn render_for_layout_propagates_identify_failure() {
        let backend = MockBackend::new();
        let result = render_for_layout(&backend, b"img", None, ResampleFilter::Triangle);
        assert!(matches!(result, Err(BackendError::Decode(_))));
        // Nothing was rendered
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn render_to_size_reports_requested_size() {
        let backend = MockBackend::new();
        let out = render_to_size(&backend, b"img", (5, 7), ResampleFilter::Gaussian).unwrap();
        assert_eq!(out.pixels, b"png:5x7");
        assert_eq!((out.width, out.height), (5, 7));
    }
}
