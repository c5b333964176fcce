//! `config.toml` handling.
//!
//! The stock [`ResizerConfig`] is serialized to a TOML table and the user's
//! file is layered over it, so a user file lists only what it changes.
//!
//! ## Where It Lives
//!
//! `config.toml` lives in the config directory (`--config-dir`, default `.`):
//!
//! ```text
//! project/
//! ├── config.toml                   # optional, overrides stock defaults
//! └── .theme-resizer/
//!     └── profiles.json             # saved upload profiles
//! ```
//!
//! ## Keys
//!
//! ```toml
//! # every key is optional; stock values shown
//!
//! [catalog]
//! source = "builtin"        # builtin | remote
//!
//! [[catalog.layouts]]       # extra codes, appended after the built-in table
//! code = "700A"
//! width = 1200
//! height = 1600
//!
//! [render]
//! filter = "triangle"       # nearest | triangle | catmull_rom | gaussian | lanczos3
//!
//! [export]
//! archive_name = "exported-images.zip"
//!
//! [api]
//! base_url = ""             # required for remote catalogs and uploads
//! timeout_secs = 30
//! token = "..."             # optional bearer token
//!
//! [upload]
//! color = "#f16d94"
//! layout_list_id = "61"
//! display_on_liveview = true
//!
//! [profiles]
//! path = ".theme-resizer/profiles.json"
//!
//! [processing]
//! max_processes = 4         # render workers; omitted = one per core
//! ```
//!
//! A misspelled key is an error, not a silent default.

use crate::catalog::{LayoutCatalog, LayoutEntry};
use crate::imaging::ResampleFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything `config.toml` can set. Every section falls back to stock values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizerConfig {
    /// Where layout codes come from.
    pub catalog: CatalogConfig,
    /// Resampling settings.
    pub render: RenderConfig,
    /// Bundle naming.
    pub export: ExportConfig,
    /// Remote API connection.
    pub api: ApiConfig,
    /// Defaults for the theme upload form.
    pub upload: UploadConfig,
    /// Profile store location.
    pub profiles: ProfilesConfig,
    /// Worker pool sizing.
    pub processing: ProcessingConfig,
}

impl ResizerConfig {
    /// Reject values the rest of the crate cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entry in &self.catalog.layouts {
            if entry.code.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "catalog.layouts entries need a non-empty code".into(),
                ));
            }
            if entry.width == 0 || entry.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "catalog.layouts entry {} must have non-zero width and height",
                    entry.code
                )));
            }
        }
        if self.catalog.source == CatalogSource::Remote && self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api.base_url is required when catalog.source = \"remote\"".into(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_secs must be non-zero".into(),
            ));
        }
        if self.export.archive_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "export.archive_name must not be empty".into(),
            ));
        }
        if !is_hex_color(&self.upload.color) {
            return Err(ConfigError::Validation(format!(
                "upload.color must be a #rgb or #rrggbb hex color, got {:?}",
                self.upload.color
            )));
        }
        Ok(())
    }

    /// The built-in table plus any extra `[[catalog.layouts]]` entries, with
    /// their codes trimmed and uppercased.
    pub fn builtin_catalog(&self) -> LayoutCatalog {
        let mut catalog = LayoutCatalog::builtin();
        catalog.extend(self.catalog.layouts.iter().cloned().map(LayoutEntry::normalized));
        catalog
    }

    /// Profile store path, relative paths resolved against `config_dir`.
    pub fn profiles_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.profiles.path)
    }
}

/// `#rgb` or `#rrggbb`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Catalog source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    /// Compiled-in table (plus config extras).
    #[default]
    Builtin,
    /// `GET {api.base_url}/layouts`.
    Remote,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub source: CatalogSource,
    /// Extra codes appended after the built-in table. A code already in the
    /// table replaces its size in place.
    pub layouts: Vec<LayoutEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub filter: ResampleFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Filename of the zip bundle.
    pub archive_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            archive_name: crate::export::DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// API root, e.g. `https://admin.example.com/api`. Empty = not configured.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Bearer token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 30,
            token: None,
        }
    }
}

/// Defaults pre-filled into every upload form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub color: String,
    pub layout_list_id: String,
    pub display_on_liveview: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            color: "#f16d94".to_string(),
            layout_list_id: "61".to_string(),
            display_on_liveview: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilesConfig {
    pub path: PathBuf,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".theme-resizer/profiles.json"),
        }
    }
}

/// Render worker pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Upper bound on render workers. Unset means one per core; larger
    /// values are capped at the core count.
    pub max_processes: Option<usize>,
}

/// Worker count for the rayon pool: `min(max_processes, cores)`, or `cores`.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Layering: stock table + user file → validated config
// =============================================================================

/// `ResizerConfig::default()` as a TOML table, the bottom layer of every load.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ResizerConfig::default())?)
}

/// Layer `overlay` over `base`. Tables merge per key and recurse; any other
/// overlay value wins outright, so `catalog.layouts` arrays are replaced
/// rather than appended. Base-only keys survive.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse `dir/config.toml` without interpreting it. A missing file is
/// `Ok(None)`; a malformed one is an error.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Layer, deserialize, then [`ResizerConfig::validate`].
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ResizerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ResizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// The effective config for `dir`: stock values overridden by `dir/config.toml`.
pub fn load_config(dir: &Path) -> Result<ResizerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Annotated stock `config.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Theme Resizer Configuration
# ===========================
# Every key is optional; the values below are what you get without this file.
# Misspelled keys are rejected.

# --------------------------------------------------------------------
# Layout catalog
# --------------------------------------------------------------------
[catalog]
# "builtin" uses the compiled-in layout table.
# "remote" loads layouts (with their ids) from api.base_url; required for upload.
source = "builtin"

# Extra layout codes, appended after the built-in table.
# A code that already exists replaces its size.
# [[catalog.layouts]]
# code = "700A"
# width = 1200
# height = 1600

# --------------------------------------------------------------------
# Rendering
# --------------------------------------------------------------------
[render]
# Resampling filter used to stretch every image to its target size.
# nearest | triangle | catmull_rom | gaussian | lanczos3
filter = "triangle"

# --------------------------------------------------------------------
# Export
# --------------------------------------------------------------------
[export]
# Filename of the zip bundle written by `resize`.
archive_name = "exported-images.zip"

# --------------------------------------------------------------------
# Remote API
# --------------------------------------------------------------------
[api]
# API root. Needed for catalog.source = "remote" and for `upload`.
base_url = ""

# Per-request timeout in seconds.
timeout_secs = 30

# Bearer token sent with every request.
# token = "..."

# --------------------------------------------------------------------
# Theme upload defaults
# --------------------------------------------------------------------
[upload]
# Theme color (#rgb or #rrggbb).
color = "#f16d94"

# Layout list the theme is attached to.
layout_list_id = "61"

# Show the theme on the live view.
display_on_liveview = true

# --------------------------------------------------------------------
# Upload profiles
# --------------------------------------------------------------------
[profiles]
# JSON file holding saved profiles, relative to the config directory.
path = ".theme-resizer/profiles.json"

# --------------------------------------------------------------------
# Processing
# --------------------------------------------------------------------
[processing]
# Maximum parallel render workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
