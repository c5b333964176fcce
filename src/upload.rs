//! Theme upload: form state, validation and multipart assembly.
//!
//! An upload turns the current batch into one theme on the server:
//!
//! - every **matched** record becomes an `images[i]` pair (PNG rendered at
//!   its effective size + the layout id of its code), `i` counting matched
//!   records only;
//! - the **thumbnail** is the explicit file when given, otherwise the first
//!   unmatched record rendered at its effective size.
//!
//! [`validate`] runs before anything is rendered or sent. Assembly produces
//! plain [`FormField`] data; [`crate::api::ApiClient::upload_theme`] turns
//! it into a real multipart body.

use crate::api::{ApiClient, ApiError};
use crate::config::{UploadConfig, is_hex_color};
use crate::imaging::{ImageBackend, RenderedImage};
use crate::pipeline::{BatchPipeline, PipelineError};
use crate::profiles::Profile;
use crate::types::RenderRecord;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("{0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] PipelineError),
    #[error("Upload failed: {0}")]
    Api(#[from] ApiError),
}

/// A user-supplied file (the explicit thumbnail).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "thumbnail".to_string());
        Ok(Self { filename, bytes })
    }

    fn mime(&self) -> &'static str {
        let ext = self
            .filename
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

/// Upload form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeUploadForm {
    pub name: String,
    pub color: String,
    pub category_id: String,
    pub theme_list_ids: Vec<i64>,
    pub layout_list_id: String,
    pub thumbnail: Option<UploadFile>,
    pub display_on_liveview: bool,
}

impl ThemeUploadForm {
    /// Blank form pre-filled from the `[upload]` config defaults.
    pub fn from_config(defaults: &UploadConfig) -> Self {
        Self {
            name: String::new(),
            color: defaults.color.clone(),
            category_id: String::new(),
            theme_list_ids: Vec::new(),
            layout_list_id: defaults.layout_list_id.clone(),
            thumbnail: None,
            display_on_liveview: defaults.display_on_liveview,
        }
    }

    /// Add a theme list id unless already selected.
    pub fn add_theme_list(&mut self, id: i64) {
        if !self.theme_list_ids.contains(&id) {
            self.theme_list_ids.push(id);
        }
    }

    pub fn remove_theme_list(&mut self, id: i64) {
        self.theme_list_ids.retain(|&x| x != id);
    }

    /// Overwrite the fields that are non-empty in `profile`.
    pub fn apply_profile(&mut self, profile: &Profile) {
        if !profile.category_id.is_empty() {
            self.category_id = profile.category_id.clone();
        }
        if !profile.selected_theme_lists.is_empty() {
            self.theme_list_ids.clear();
            for &id in &profile.selected_theme_lists {
                self.add_theme_list(id);
            }
        }
        if !profile.layout_list_id.is_empty() {
            self.layout_list_id = profile.layout_list_id.clone();
        }
        if !profile.color.is_empty() {
            self.color = profile.color.clone();
        }
    }

    /// The profile-able part of the form.
    pub fn to_profile(&self) -> Profile {
        Profile {
            category_id: self.category_id.clone(),
            selected_theme_lists: self.theme_list_ids.clone(),
            layout_list_id: self.layout_list_id.clone(),
            color: self.color.clone(),
        }
    }
}

/// Check the form against the batch before any rendering or network call.
pub fn validate(form: &ThemeUploadForm, records: &[RenderRecord]) -> Result<(), UploadError> {
    if form.name.trim().is_empty() {
        return Err(UploadError::Validation("Theme name is required".into()));
    }
    if form.thumbnail.is_none() && !records.iter().any(RenderRecord::is_unmapped) {
        return Err(UploadError::Validation(
            "A thumbnail is required: pass one explicitly or include an unmatched image".into(),
        ));
    }
    if form.category_id.trim().is_empty() {
        return Err(UploadError::Validation("Theme category is required".into()));
    }
    if !is_hex_color(&form.color) {
        return Err(UploadError::Validation(format!(
            "Color must be #rgb or #rrggbb, got {:?}",
            form.color
        )));
    }
    if let Some(r) = records
        .iter()
        .find(|r| r.matched_code.is_some() && r.layout_id.is_none())
    {
        return Err(UploadError::Validation(format!(
            "{} matched layout {} which has no layout id; load the catalog from the API",
            r.name,
            r.matched_code.as_deref().unwrap_or_default()
        )));
    }
    Ok(())
}

/// One multipart field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File {
        filename: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: FieldValue,
}

impl FormField {
    fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Text(value.into()),
        }
    }

    fn png(name: impl Into<String>, filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::File {
                filename: filename.to_string(),
                mime: "image/png".to_string(),
                bytes,
            },
        }
    }
}

/// An assembled upload, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSubmission {
    pub fields: Vec<FormField>,
}

impl UploadSubmission {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|f| match &f.value {
            FieldValue::Text(t) if f.name == name => Some(t.as_str()),
            _ => None,
        })
    }

    /// Number of `images[i]` pairs.
    pub fn image_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.name.starts_with("images[") && f.name.ends_with("].file"))
            .count()
    }
}

/// Record indices that need a fresh render: every matched record, plus the
/// first unmatched one when it supplies the thumbnail.
fn indices_to_render(form: &ThemeUploadForm, records: &[RenderRecord]) -> Vec<usize> {
    let mut indices: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.is_unmapped())
        .map(|(i, _)| i)
        .collect();
    if form.thumbnail.is_none() {
        indices.extend(records.iter().position(RenderRecord::is_unmapped));
    }
    indices.sort_unstable();
    indices
}

/// Assemble the multipart fields from a validated form and fresh renders
/// keyed by record index.
pub fn build_submission(
    form: &ThemeUploadForm,
    records: &[RenderRecord],
    rendered: &HashMap<usize, RenderedImage>,
) -> Result<UploadSubmission, UploadError> {
    let missing = |index: usize| {
        UploadError::Validation(format!("record {index} was not rendered for upload"))
    };

    let mut fields = vec![
        FormField::text("name", form.name.trim()),
        FormField::text("color", form.color.clone()),
        FormField::text("themeCategoryId", form.category_id.clone()),
        FormField::text(
            "themeListIds",
            form.theme_list_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(","),
        ),
        FormField::text("layoutListId", form.layout_list_id.clone()),
        FormField::text(
            "isDisplayOnLiveview",
            if form.display_on_liveview { "true" } else { "false" },
        ),
    ];

    match &form.thumbnail {
        Some(file) => fields.push(FormField {
            name: "thumbnail".into(),
            value: FieldValue::File {
                filename: file.filename.clone(),
                mime: file.mime().to_string(),
                bytes: file.bytes.clone(),
            },
        }),
        None => {
            let index = records
                .iter()
                .position(RenderRecord::is_unmapped)
                .ok_or_else(|| UploadError::Validation("No thumbnail available".into()))?;
            let image = rendered.get(&index).ok_or_else(|| missing(index))?;
            fields.push(FormField::png(
                "thumbnail",
                &records[index].name,
                image.pixels.clone(),
            ));
        }
    }

    let matched = records.iter().enumerate().filter(|(_, r)| !r.is_unmapped());
    for (i, (index, record)) in matched.enumerate() {
        let image = rendered.get(&index).ok_or_else(|| missing(index))?;
        let layout_id = record.layout_id.ok_or_else(|| {
            UploadError::Validation(format!("{} has no layout id", record.name))
        })?;
        fields.push(FormField::png(
            format!("images[{i}].file"),
            &record.name,
            image.pixels.clone(),
        ));
        fields.push(FormField::text(
            format!("images[{i}].layoutId"),
            layout_id.to_string(),
        ));
    }

    Ok(UploadSubmission { fields })
}

/// Validate, render what the upload needs at effective size, and assemble.
pub fn prepare_upload<B: ImageBackend>(
    form: &ThemeUploadForm,
    pipeline: &BatchPipeline<B>,
) -> Result<UploadSubmission, UploadError> {
    let records = pipeline.records();
    validate(form, records)?;

    let rendered: HashMap<usize, RenderedImage> = indices_to_render(form, records)
        .into_par_iter()
        .map(|index| pipeline.render_effective(index).map(|image| (index, image)))
        .collect::<Result<_, PipelineError>>()?;

    build_submission(form, records, &rendered)
}

/// Full upload: prepare, then POST.
pub fn upload_theme<B: ImageBackend>(
    client: &ApiClient,
    form: &ThemeUploadForm,
    pipeline: &BatchPipeline<B>,
) -> Result<UploadSubmission, UploadError> {
    let submission = prepare_upload(form, pipeline)?;
    client.upload_theme(&submission)?;
    info!(
        name = %form.name,
        images = submission.image_count(),
        "theme uploaded"
    );
    Ok(submission)
}
