//! Render requests handed from [`operations`](super::operations) to a
//! [`backend`](super::backend).
//!
//! [`RenderParams`] carries the source bytes, the exact output size and the
//! [`ResampleFilter`]. Backends never choose sizes themselves.

use serde::{Deserialize, Serialize};

/// Resampling filter used when stretching a source raster to its target size.
///
/// Defaults to `Triangle` (bilinear).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResampleFilter {
    pub fn as_filter_type(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Parameters for a single stretch-to-size render.
///
/// The output is always exactly `width × height`, regardless of the
/// source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams<'a> {
    pub source: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub filter: ResampleFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_triangle() {
        assert_eq!(ResampleFilter::default(), ResampleFilter::Triangle);
    }

    #[test]
    fn filter_parses_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            filter: ResampleFilter,
        }
        let w: Wrapper = toml::from_str(r#"filter = "catmull_rom""#).unwrap();
        assert_eq!(w.filter, ResampleFilter::CatmullRom);
    }

    #[test]
    fn filter_maps_to_image_filter_type() {
        use image::imageops::FilterType;
        assert_eq!(ResampleFilter::Nearest.as_filter_type(), FilterType::Nearest);
        assert_eq!(ResampleFilter::Lanczos3.as_filter_type(), FilterType::Lanczos3);
    }
}
