//! Export of rendered images: one zip bundle or individual files.
//!
//! Entries are written in the order given. Entry names are user-editable
//! record names, so two guards apply:
//!
//! - zip-slip: names containing a path separator, and the names `.` and
//!   `..`, are rejected with [`ExportError::InvalidName`]. A plain name such
//!   as `photo..png` is fine;
//! - duplicates: a repeated name gets a `-2`, `-3`, ... suffix before the
//!   extension (`158A.png`, `158A-2.png`), so no entry is silently lost.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Default bundle filename.
pub const DEFAULT_ARCHIVE_NAME: &str = "exported-images.zip";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Invalid output filename: {0:?}")]
    InvalidName(String),
}

/// Reject names that could escape the output location.
fn validate_name(name: &str) -> Result<(), ExportError> {
    let bad = name.trim().is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name == "..";
    if bad {
        return Err(ExportError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Make every name unique by suffixing repeats (`a.png`, `a-2.png`, `a-3.png`).
pub fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let mut candidate = name.to_string();
        let mut n = 2;
        while !seen.insert(candidate.clone()) {
            candidate = match name.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
                _ => format!("{name}-{n}"),
            };
            n += 1;
        }
        out.push(candidate);
    }
    out
}

/// Pack `(name, bytes)` entries into an in-memory zip, in order.
pub fn write_archive<'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a [u8])>,
) -> Result<Vec<u8>, ExportError> {
    let entries: Vec<(&str, &[u8])> = entries.into_iter().collect();
    for (name, _) in &entries {
        validate_name(name)?;
    }
    let names = unique_names(entries.iter().map(|(name, _)| *name));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (name, (_, bytes)) in names.iter().zip(&entries) {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Write each entry as its own file under `dir`, returning the written paths.
pub fn write_files<'a>(
    dir: &Path,
    entries: impl IntoIterator<Item = (&'a str, &'a [u8])>,
) -> Result<Vec<PathBuf>, ExportError> {
    let entries: Vec<(&str, &[u8])> = entries.into_iter().collect();
    for (name, _) in &entries {
        validate_name(name)?;
    }
    std::fs::create_dir_all(dir)?;

    let names = unique_names(entries.iter().map(|(name, _)| *name));
    let mut written = Vec::with_capacity(entries.len());
    for (name, (_, bytes)) in names.iter().zip(&entries) {
        let path = dir.join(name);
        std::fs::write(&path, bytes)?;
        written.push(path);
    }
    Ok(written)
}
