//! # Theme Resizer
//!
//! Batch-resizes theme artwork to the exact pixel sizes of a fixed set of
//! layouts. The layout is named by a short code embedded in each filename
//! (`cover_158A_final.jpg` → layout `158A` → 1080×1720); files without a code
//! keep their own size. Results are bundled into a zip, written as separate
//! files, or uploaded to a theme API as one theme.
//!
//! # Architecture: One Batch, Three Exits
//!
//! ```text
//! inputs (images, zips) ──► BatchPipeline ──► records ──┬─► export (zip / files)
//!          ▲                    │                       └─► upload (multipart POST)
//!   LayoutCatalog ◄─ builtin table / config / remote API
//! ```
//!
//! The pipeline owns the catalog and an ordered list of [`types::RenderRecord`]s.
//! Records remember their source bytes, so edits to name or custom size take
//! effect on the next export or upload without reprocessing the batch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Layout code → size table; built-in codes and remote entries with ids |
//! | [`matcher`] | Filename → layout resolution (case-insensitive substring, first match) |
//! | [`archive`] | Lazy expansion of zip inputs into raster members |
//! | [`imaging`] | Pure-Rust decode, exact-size resample, PNG encode behind a backend trait |
//! | [`pipeline`] | Classification, matching, parallel rendering, record edits, export |
//! | [`export`] | Zip bundle and individual-file writers with name checks |
//! | [`types`] | `RenderRecord` and record edits |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`api`] | Blocking client for the remote layout/theme API |
//! | [`upload`] | Upload form, validation and multipart assembly |
//! | [`profiles`] | Saved upload presets behind a `ProfileStore` trait |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stretch, Never Crop
//!
//! A layout defines the exact output size. Images are resampled to that size
//! without preserving aspect ratio; artwork is expected to be prepared for
//! the target shape already.
//!
//! ## Submission Order Is Output Order
//!
//! Rendering is parallel (rayon), but the job list is built sequentially and
//! results are collected by position, so records always appear in the order
//! inputs were given, archive members in archive order at the archive's slot.
//!
//! ## Failures Are Notices
//!
//! A bad file never aborts a batch. Undecodable images, corrupt archives and
//! unsupported containers are reported as [`pipeline::PipelineEvent`]s while
//! the rest of the batch completes.

pub mod api;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod export;
pub mod imaging;
pub mod matcher;
pub mod output;
pub mod pipeline;
pub mod profiles;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
