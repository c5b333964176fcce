//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every rendered image leads with its position in the batch and its output
//! name; where it came from is shown as an indented `Source:` context line.
//! Notices (skipped, failed, ambiguous) are single lines with a leading tag
//! so they stand out in a long batch.
//!
//! # Output Format
//!
//! ## Resize
//!
//! ```text
//! 001 158A.png 1080×1720 [158A]
//!     Source: cover_158A_final.jpg
//! 002 banner.png 1200×400 (intrinsic)
//!     Source: banner.png
//! Skipped: pack.rar (rar archives are not supported, use zip)
//! Failed: broken.png: Decode error: ...
//!
//! 2 rendered, 1 failed, 1 unsupported
//! Exported 2 images → exported-images.zip
//! ```
//!
//! ## Match
//!
//! ```text
//! cover_158A_final.jpg → 158A (1080×1720)
//! banner.png → no layout (intrinsic size)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::api::ThemeOption;
use crate::catalog::LayoutCatalog;
use crate::matcher::{match_filename, matching_codes};
use crate::pipeline::{PipelineEvent, ProcessSummary};
use crate::profiles::Profile;
use crate::types::RenderRecord;
use crate::upload::{FieldValue, UploadSubmission};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 0-based batch index as a 1-based, 3-digit zero-padded position.
fn format_index(index: usize) -> String {
    format!("{:0>3}", index + 1)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_size((width, height): (u32, u32)) -> String {
    format!("{width}×{height}")
}

// ============================================================================
// Resize output
// ============================================================================

/// Format a single pipeline event as display lines.
pub fn format_pipeline_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::Rendered {
            index,
            name,
            source,
            width,
            height,
            code,
        } => {
            let tag = match code {
                Some(code) => format!("[{code}]"),
                None => "(intrinsic)".to_string(),
            };
            vec![
                format!(
                    "{} {} {} {}",
                    format_index(*index),
                    name,
                    format_size((*width, *height)),
                    tag
                ),
                format!("{}Source: {}", indent(1), source),
            ]
        }
        PipelineEvent::Ambiguous {
            source,
            codes,
            chosen,
        } => vec![format!(
            "Note: {} contains {}; using {}",
            source,
            codes.join(", "),
            chosen
        )],
        PipelineEvent::Unsupported { source, extension } => vec![format!(
            "Skipped: {source} ({extension} archives are not supported, use zip)"
        )],
        PipelineEvent::Failed { source, reason } => vec![format!("Failed: {source}: {reason}")],
        PipelineEvent::Ignored { source } => {
            vec![format!("Ignored: {source} (not an image or zip archive)")]
        }
    }
}

/// Current batch, one entry per record, with the size export will use.
pub fn format_records(records: &[RenderRecord]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let mut line = format!(
            "{} {} {}",
            format_index(i),
            record.name,
            format_size(record.effective_size())
        );
        if record.is_custom_size && record.effective_size() != (record.width, record.height) {
            line.push_str(&format!(
                " (custom, rendered at {})",
                format_size((record.width, record.height))
            ));
        }
        lines.push(line);
    }
    lines
}

pub fn format_summary(summary: &ProcessSummary) -> Vec<String> {
    vec![String::new(), summary.to_string()]
}

/// Where an export went.
pub fn format_export(count: usize, target: &Path) -> Vec<String> {
    let noun = if count == 1 { "image" } else { "images" };
    vec![format!("Exported {} {} → {}", count, noun, target.display())]
}

pub fn print_pipeline_event(event: &PipelineEvent) {
    for line in format_pipeline_event(event) {
        println!("{}", line);
    }
}

pub fn print_summary(summary: &ProcessSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

pub fn print_export(count: usize, target: &Path) {
    for line in format_export(count, target) {
        println!("{}", line);
    }
}

// ============================================================================
// Catalog and match output
// ============================================================================

/// One line per layout, in matching order.
pub fn format_catalog(catalog: &LayoutCatalog) -> Vec<String> {
    if catalog.is_empty() {
        return vec!["No layouts loaded".to_string()];
    }
    let mut lines = Vec::with_capacity(catalog.len() + 1);
    for entry in catalog.iter() {
        let mut line = format!("{:<6} {}", entry.code, format_size(entry.size()));
        if let Some(id) = entry.id {
            line.push_str(&format!("  id {id}"));
        }
        lines.push(line);
    }
    lines.push(format!("{} layouts", catalog.len()));
    lines
}

/// How a filename resolves against the catalog.
pub fn format_match(filename: &str, catalog: &LayoutCatalog) -> Vec<String> {
    let Some(m) = match_filename(filename, catalog) else {
        return vec![format!("{filename} → no layout (intrinsic size)")];
    };
    let mut lines = vec![format!(
        "{} → {} ({})",
        filename,
        m.code,
        format_size(m.entry.size())
    )];
    let codes = matching_codes(filename, catalog);
    if codes.len() > 1 {
        lines.push(format!("{}Also contains: {}", indent(1), codes[1..].join(", ")));
    }
    lines
}

pub fn print_catalog(catalog: &LayoutCatalog) {
    for line in format_catalog(catalog) {
        println!("{}", line);
    }
}

pub fn print_match(filename: &str, catalog: &LayoutCatalog) {
    for line in format_match(filename, catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Profiles and upload output
// ============================================================================

pub fn format_profile(name: &str, profile: &Profile) -> Vec<String> {
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    let lists = profile
        .selected_theme_lists
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        name.to_string(),
        format!("{}Category: {}", indent(1), or_dash(&profile.category_id)),
        format!("{}Theme lists: {}", indent(1), or_dash(&lists)),
        format!("{}Layout list: {}", indent(1), or_dash(&profile.layout_list_id)),
        format!("{}Color: {}", indent(1), or_dash(&profile.color)),
    ]
}

/// A titled list of theme categories or theme lists.
pub fn format_theme_options(title: &str, options: &[ThemeOption]) -> Vec<String> {
    let mut lines = vec![title.to_string()];
    if options.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for option in options {
        lines.push(format!("{}{:>5}  {}", indent(1), option.id, option.name));
    }
    lines
}

pub fn format_profile_names(names: &[String]) -> Vec<String> {
    if names.is_empty() {
        return vec!["No saved profiles".to_string()];
    }
    names.to_vec()
}

/// Field-by-field view of an upload, file contents shown as sizes.
pub fn format_upload(submission: &UploadSubmission) -> Vec<String> {
    let mut lines = Vec::with_capacity(submission.fields.len() + 1);
    for field in &submission.fields {
        let value = match &field.value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::File {
                filename, bytes, ..
            } => format!("{} ({} bytes)", filename, bytes.len()),
        };
        lines.push(format!("{}{}: {}", indent(1), field.name, value));
    }
    lines.push(format!("Uploaded {} layout images", submission.image_count()));
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
