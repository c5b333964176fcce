//! Shared test utilities for the theme-resizer test suite.
//!
//! Provides synthetic image and zip fixtures, record builders, and lookup
//! helpers that panic with a readable message on miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let zip = zip_bytes(&[
//!     ZipEntry::dir("pack/"),
//!     ZipEntry::file("pack/158A.png", png_bytes(8, 8)),
//! ]);
//! pipeline.process(vec![InputFile::new("pack.zip", zip)], None);
//!
//! let r = find_record(&pipeline, "158A.png");
//! assert_eq!(decoded_size(&r.pixels), (1080, 1720));
//! ```

use image::{ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Read, Write};
use std::sync::Arc;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::imaging::ImageBackend;
use crate::pipeline::BatchPipeline;
use crate::types::RenderRecord;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A valid PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// A valid JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// A valid (lossless) WebP of the given size.
pub fn webp_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::WebP)
}

/// Decode encoded bytes and return their pixel size.
pub fn decoded_size(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

// =========================================================================
// Zip fixtures
// =========================================================================

/// One entry for [`zip_bytes`].
pub enum ZipEntry {
    File(String, Vec<u8>),
    Dir(String),
}

impl ZipEntry {
    pub fn file(name: &str, bytes: Vec<u8>) -> Self {
        Self::File(name.to_string(), bytes)
    }

    pub fn dir(name: &str) -> Self {
        Self::Dir(name.to_string())
    }
}

/// Build an in-memory zip with the given entries, in order.
pub fn zip_bytes(entries: &[ZipEntry]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for entry in entries {
        match entry {
            ZipEntry::File(name, bytes) => {
                zip.start_file(name.as_str(), options).unwrap();
                zip.write_all(bytes).unwrap();
            }
            ZipEntry::Dir(name) => {
                zip.add_directory(name.as_str(), options).unwrap();
            }
        }
    }
    zip.finish().unwrap().into_inner()
}

/// Read every file entry of a zip as `(name, bytes)`, in archive order.
pub fn read_zip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        if file.is_dir() {
            continue;
        }
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        out.push((file.name().to_string(), buf));
    }
    out
}

// =========================================================================
// Records
// =========================================================================

/// A record as the pipeline would produce it, with placeholder pixels.
///
/// Matched records (`code` is `Some`) start with custom size off; unmatched
/// ones start with custom size on. Custom size equals the rendered size.
pub fn record(name: &str, code: Option<&str>, width: u32, height: u32) -> RenderRecord {
    let source: Arc<[u8]> = Arc::from(png_bytes(2, 2));
    RenderRecord {
        name: name.to_string(),
        pixels: format!("png:{width}x{height}").into_bytes(),
        width,
        height,
        is_custom_size: code.is_none(),
        custom_width: width,
        custom_height: height,
        matched_code: code.map(str::to_string),
        layout_id: None,
        source_name: name.to_string(),
        source,
    }
}

// =========================================================================
// Pipeline lookups; panic on miss
// =========================================================================

/// All record names in batch order.
pub fn record_names<B: ImageBackend>(pipeline: &BatchPipeline<B>) -> Vec<&str> {
    pipeline.records().iter().map(|r| r.name.as_str()).collect()
}

/// Find a record by output name. Panics if not found.
pub fn find_record<'a, B: ImageBackend>(
    pipeline: &'a BatchPipeline<B>,
    name: &str,
) -> &'a RenderRecord {
    pipeline
        .records()
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| {
            let names = record_names(pipeline);
            panic!("record '{name}' not found. Available: {names:?}")
        })
}
