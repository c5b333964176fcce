//! Batch rendering pipeline.
//!
//! Takes a heterogeneous batch of inputs (image files, zip archives, stray
//! files), resolves every image's target size from its filename, renders
//! each one to exactly that size, and keeps the results as an ordered list of
//! [`RenderRecord`]s that export and upload read from.
//!
//! ## Stages
//!
//! ```text
//! inputs ──classify──┬─ image ───────────────────────┐
//!                    ├─ zip ──expand──► members ──────┤
//!                    ├─ rar/7z/... ──► Unsupported    │
//!                    └─ other ──────► Ignored         ▼
//!                                       match filename → render jobs
//!                                                     │ (rayon)
//!                                                     ▼
//!                                             records, in job order
//! ```
//!
//! Classification, expansion and matching run sequentially, so the job list
//! is in submission order (archive members in archive order, at the
//! archive's position). Rendering runs on the rayon pool; each render
//! allocates its own raster and results are collected by job index, so the
//! record order never depends on which render finishes first.
//!
//! ## Failure isolation
//!
//! Nothing in a batch aborts the batch. Corrupt archives, undecodable
//! images and unsupported containers become [`PipelineEvent`]s and the rest
//! of the batch carries on.
//!
//! ## Re-rendering
//!
//! Records keep their original source bytes. [`BatchPipeline::export_all`]
//! and [`BatchPipeline::render_effective`] always render again from the
//! source at the record's *effective* size, which differs from the stored
//! `pixels` once the user has edited a custom size.

use crate::archive::{self, ArchiveError};
use crate::catalog::LayoutCatalog;
use crate::export::{self, ExportError};
use crate::imaging::{
    BackendError, ImageBackend, RASTER_EXTENSIONS, RenderedImage, ResampleFilter,
    render_for_layout, render_to_size,
};
use crate::matcher::{file_stem, match_filename, matching_codes};
use crate::types::{RecordUpdate, RenderRecord};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No record at index {index} (batch has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Failed to render {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: BackendError,
    },
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// Container formats recognised by extension but not supported.
pub const UNSUPPORTED_ARCHIVE_EXTENSIONS: &[&str] = &["rar", "7z", "tar", "gz", "tgz", "bz2", "xz"];

/// Declared MIME types that mark an input as an image.
const IMAGE_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg", "image/webp"];

/// Fallback output name when a filename has no usable stem.
const FALLBACK_NAME: &str = "image.png";

/// One dropped/submitted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Declared MIME type, when the caller knows one.
    pub mime: Option<String>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk; the input name is the file name.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self::new(name, bytes))
    }
}

/// Collect inputs from files and directories.
///
/// Directories are walked recursively, entries sorted by file name, and
/// every regular file becomes an input (classification happens later).
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>, PipelineError> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.file_type().is_file() {
                    inputs.push(InputFile::read(entry.path())?);
                }
            }
        } else {
            inputs.push(InputFile::read(path)?);
        }
    }
    Ok(inputs)
}

/// How an input will be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Archive,
    /// A known container format that cannot be expanded; carries the extension.
    UnsupportedArchive(String),
    Unknown,
}

fn extension_of(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Classify by extension first, then by declared MIME type.
pub fn classify(name: &str, mime: Option<&str>) -> InputKind {
    let ext = extension_of(name);
    match ext.as_deref() {
        Some("zip") => return InputKind::Archive,
        Some(e) if RASTER_EXTENSIONS.contains(&e) => return InputKind::Image,
        Some(e) if UNSUPPORTED_ARCHIVE_EXTENSIONS.contains(&e) => {
            return InputKind::UnsupportedArchive(e.to_string());
        }
        _ => {}
    }
    match mime.map(|m| m.to_ascii_lowercase()) {
        Some(m) if IMAGE_MIME_TYPES.contains(&m.as_str()) => InputKind::Image,
        Some(m) if m == "application/zip" || m == "application/x-zip-compressed" => {
            InputKind::Archive
        }
        _ => InputKind::Unknown,
    }
}

/// Progress and notices emitted while processing a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Rendered {
        index: usize,
        name: String,
        source: String,
        width: u32,
        height: u32,
        code: Option<String>,
    },
    /// More than one layout code occurs in the filename; `chosen` won.
    Ambiguous {
        source: String,
        codes: Vec<String>,
        chosen: String,
    },
    Unsupported {
        source: String,
        extension: String,
    },
    Failed {
        source: String,
        reason: String,
    },
    Ignored {
        source: String,
    },
}

/// Counts for one `process` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessSummary {
    pub rendered: usize,
    pub failed: usize,
    pub unsupported: usize,
    pub ignored: usize,
}

impl fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rendered", self.rendered)?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.unsupported > 0 {
            write!(f, ", {} unsupported", self.unsupported)?;
        }
        if self.ignored > 0 {
            write!(f, ", {} ignored", self.ignored)?;
        }
        Ok(())
    }
}

/// Rendering options shared by every job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub filter: ResampleFilter,
}

/// A resolved image waiting to be rendered.
struct RenderJob {
    source_name: String,
    source: Arc<[u8]>,
    code: Option<String>,
    layout_size: Option<(u32, u32)>,
    layout_id: Option<i64>,
}

fn emit(events: Option<&Sender<PipelineEvent>>, event: PipelineEvent) {
    if let Some(tx) = events {
        // Receiver gone means nobody is listening; processing goes on.
        let _ = tx.send(event);
    }
}

/// Output name for a record: `{code}.png`, else `{stem}.png`.
pub fn output_name(source_name: &str, code: Option<&str>) -> String {
    match code {
        Some(code) => format!("{code}.png"),
        None => {
            let stem = file_stem(source_name);
            if stem.is_empty() {
                FALLBACK_NAME.to_string()
            } else {
                format!("{stem}.png")
            }
        }
    }
}

/// The batch state: catalog, options, and the ordered record list.
pub struct BatchPipeline<B: ImageBackend> {
    backend: B,
    catalog: LayoutCatalog,
    options: PipelineOptions,
    records: Vec<RenderRecord>,
}

impl<B: ImageBackend> BatchPipeline<B> {
    pub fn new(backend: B, catalog: LayoutCatalog, options: PipelineOptions) -> Self {
        Self {
            backend,
            catalog,
            options,
            records: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &LayoutCatalog {
        &self.catalog
    }

    /// Swap in a refreshed catalog. Existing records are not re-matched.
    pub fn replace_catalog(&mut self, catalog: LayoutCatalog) {
        self.catalog = catalog;
    }

    pub fn records(&self) -> &[RenderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Process a batch and append one record per rendered image.
    pub fn process(
        &mut self,
        inputs: Vec<InputFile>,
        events: Option<&Sender<PipelineEvent>>,
    ) -> ProcessSummary {
        let mut summary = ProcessSummary::default();
        let mut jobs = Vec::new();

        for input in inputs {
            match classify(&input.name, input.mime.as_deref()) {
                InputKind::Image => {
                    jobs.push(self.plan_job(input.name, input.bytes.into(), events));
                }
                InputKind::Archive => {
                    self.plan_archive(input, &mut jobs, &mut summary, events);
                }
                InputKind::UnsupportedArchive(extension) => {
                    warn!(input = %input.name, %extension, "unsupported archive format");
                    summary.unsupported += 1;
                    emit(
                        events,
                        PipelineEvent::Unsupported {
                            source: input.name,
                            extension,
                        },
                    );
                }
                InputKind::Unknown => {
                    debug!(input = %input.name, "ignoring input that is neither image nor archive");
                    summary.ignored += 1;
                    emit(events, PipelineEvent::Ignored { source: input.name });
                }
            }
        }

        let backend = &self.backend;
        let filter = self.options.filter;
        let results: Vec<Result<RenderedImage, BackendError>> = jobs
            .par_iter()
            .map(|job| render_for_layout(backend, &job.source, job.layout_size, filter))
            .collect();

        for (job, result) in jobs.into_iter().zip(results) {
            match result {
                Ok(rendered) => {
                    let record = RenderRecord {
                        name: output_name(&job.source_name, job.code.as_deref()),
                        pixels: rendered.pixels,
                        width: rendered.width,
                        height: rendered.height,
                        is_custom_size: job.code.is_none(),
                        custom_width: rendered.width,
                        custom_height: rendered.height,
                        matched_code: job.code,
                        layout_id: job.layout_id,
                        source_name: job.source_name,
                        source: job.source,
                    };
                    summary.rendered += 1;
                    emit(
                        events,
                        PipelineEvent::Rendered {
                            index: self.records.len(),
                            name: record.name.clone(),
                            source: record.source_name.clone(),
                            width: record.width,
                            height: record.height,
                            code: record.matched_code.clone(),
                        },
                    );
                    self.records.push(record);
                }
                Err(e) => {
                    warn!(input = %job.source_name, error = %e, "image failed to render");
                    summary.failed += 1;
                    emit(
                        events,
                        PipelineEvent::Failed {
                            source: job.source_name,
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }

        summary
    }

    /// Resolve the layout for one image.
    fn plan_job(
        &self,
        source_name: String,
        source: Arc<[u8]>,
        events: Option<&Sender<PipelineEvent>>,
    ) -> RenderJob {
        let codes = matching_codes(&source_name, &self.catalog);
        let matched = match_filename(&source_name, &self.catalog);
        if let (true, Some(m)) = (codes.len() > 1, &matched) {
            emit(
                events,
                PipelineEvent::Ambiguous {
                    source: source_name.clone(),
                    codes: codes.iter().map(|c| c.to_string()).collect(),
                    chosen: m.code.to_string(),
                },
            );
        }
        RenderJob {
            code: matched.as_ref().map(|m| m.code.to_string()),
            layout_size: matched.as_ref().map(|m| m.entry.size()),
            layout_id: matched.as_ref().and_then(|m| m.entry.id),
            source_name,
            source,
        }
    }

    /// Expand an archive into jobs; failures become notices.
    fn plan_archive(
        &self,
        input: InputFile,
        jobs: &mut Vec<RenderJob>,
        summary: &mut ProcessSummary,
        events: Option<&Sender<PipelineEvent>>,
    ) {
        let members = match archive::expand(input.bytes) {
            Ok(members) => members,
            Err(e) => {
                warn!(input = %input.name, error = %e, "archive could not be opened");
                summary.failed += 1;
                emit(
                    events,
                    PipelineEvent::Failed {
                        source: input.name,
                        reason: e.to_string(),
                    },
                );
                return;
            }
        };
        for member in members {
            match member {
                Ok(member) => jobs.push(self.plan_job(member.name, member.bytes.into(), events)),
                Err(e) => {
                    let source = match &e {
                        ArchiveError::Member { name, .. } => format!("{}/{}", input.name, name),
                        ArchiveError::Decode(_) => input.name.clone(),
                    };
                    summary.failed += 1;
                    emit(
                        events,
                        PipelineEvent::Failed {
                            source,
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }
    }

    fn check_index(&self, index: usize) -> Result<(), PipelineError> {
        if index >= self.records.len() {
            return Err(PipelineError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(())
    }

    /// Rewrite the given fields of one record in place. Does not re-render.
    pub fn update_record(&mut self, index: usize, update: &RecordUpdate) -> Result<(), PipelineError> {
        self.check_index(index)?;
        self.records[index].apply(update);
        Ok(())
    }

    /// Remove one record; the rest keep their relative order.
    pub fn remove_record(&mut self, index: usize) -> Result<RenderRecord, PipelineError> {
        self.check_index(index)?;
        Ok(self.records.remove(index))
    }

    pub fn clear_all(&mut self) {
        self.records.clear();
    }

    fn render_record(&self, record: &RenderRecord) -> Result<RenderedImage, PipelineError> {
        render_to_size(
            &self.backend,
            &record.source,
            record.effective_size(),
            self.options.filter,
        )
        .map_err(|source| PipelineError::Render {
            name: record.name.clone(),
            source,
        })
    }

    /// Fresh render of one record at its effective size.
    pub fn render_effective(&self, index: usize) -> Result<RenderedImage, PipelineError> {
        self.check_index(index)?;
        self.render_record(&self.records[index])
    }

    /// Fresh renders of every record at its effective size, in record order.
    pub fn render_all_effective(&self) -> Result<Vec<RenderedImage>, PipelineError> {
        self.records
            .par_iter()
            .map(|record| self.render_record(record))
            .collect()
    }

    /// Zip bundle with one entry per record, named `record.name`.
    pub fn export_all(&self) -> Result<Vec<u8>, PipelineError> {
        let rendered = self.render_all_effective()?;
        let zip = export::write_archive(
            self.records
                .iter()
                .zip(&rendered)
                .map(|(record, image)| (record.name.as_str(), image.pixels.as_slice())),
        )?;
        Ok(zip)
    }

    /// Write every record as its own file under `dir`.
    pub fn export_individual(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let rendered = self.render_all_effective()?;
        let paths = export::write_files(
            dir,
            self.records
                .iter()
                .zip(&rendered)
                .map(|(record, image)| (record.name.as_str(), image.pixels.as_slice())),
        )?;
        Ok(paths)
    }
}
