//! Image rendering in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Render** | decode + `resize_exact` (stretch) + PNG encode |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for size math (unit testable)
//! - **Parameters**: Data structures describing a render
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_effective_size, calculate_target_size, parse_size};
pub use operations::{RenderedImage, get_dimensions, render_for_layout, render_to_size};
pub use params::{RenderParams, ResampleFilter};
pub use rust_backend::{RASTER_EXTENSIONS, RustBackend, has_raster_extension};
