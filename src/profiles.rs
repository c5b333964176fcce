//! Saved upload profiles.
//!
//! A profile is a named preset for the repetitive parts of the theme upload
//! form (category, theme lists, layout list, color). Profiles live behind
//! the [`ProfileStore`] trait so the upload flow can be tested without disk:
//!
//! - [`JsonFileProfileStore`]: one JSON object file, `name → profile`,
//!   created on first save;
//! - [`MemoryProfileStore`]: a map, for tests and one-off runs.
//!
//! The JSON shape is the same object a browser session would keep:
//!
//! ```json
//! {
//!   "spring": {
//!     "categoryId": "3",
//!     "selectedThemeLists": [4, 9],
//!     "layoutListId": "61",
//!     "color": "#f16d94"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Profile file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Profile name must not be empty")]
    EmptyName,
    #[error("No profile named {0:?}")]
    NotFound(String),
}

/// Preset values for the upload form. Empty fields are not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub category_id: String,
    pub selected_theme_lists: Vec<i64>,
    pub layout_list_id: String,
    pub color: String,
}

/// Keyed profile persistence.
pub trait ProfileStore {
    fn get(&self, name: &str) -> Result<Option<Profile>, ProfileError>;

    /// Insert or overwrite. Blank names are rejected.
    fn put(&self, name: &str, profile: &Profile) -> Result<(), ProfileError>;

    /// Remove a profile; returns whether it existed.
    fn delete(&self, name: &str) -> Result<bool, ProfileError>;

    /// Profile names, sorted.
    fn keys(&self) -> Result<Vec<String>, ProfileError>;
}

fn check_name(name: &str) -> Result<(), ProfileError> {
    if name.trim().is_empty() {
        return Err(ProfileError::EmptyName);
    }
    Ok(())
}

/// Load a profile or fail with [`ProfileError::NotFound`].
pub fn require(store: &dyn ProfileStore, name: &str) -> Result<Profile, ProfileError> {
    store
        .get(name)?
        .ok_or_else(|| ProfileError::NotFound(name.to_string()))
}

// =============================================================================
// JSON file store
// =============================================================================

/// Profiles kept in a single JSON object file.
///
/// Every operation re-reads the file, so two processes sharing it see each
/// other's writes (last writer wins).
#[derive(Debug, Clone)]
pub struct JsonFileProfileStore {
    path: PathBuf,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Profile>, ProfileError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, profiles: &BTreeMap<String, Profile>) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(profiles)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), count = profiles.len(), "saved profiles");
        Ok(())
    }
}

impl ProfileStore for JsonFileProfileStore {
    fn get(&self, name: &str) -> Result<Option<Profile>, ProfileError> {
        Ok(self.read_all()?.remove(name))
    }

    fn put(&self, name: &str, profile: &Profile) -> Result<(), ProfileError> {
        check_name(name)?;
        let mut all = self.read_all()?;
        all.insert(name.to_string(), profile.clone());
        self.write_all(&all)
    }

    fn delete(&self, name: &str) -> Result<bool, ProfileError> {
        let mut all = self.read_all()?;
        if all.remove(name).is_none() {
            return Ok(false);
        }
        self.write_all(&all)?;
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<String>, ProfileError> {
        Ok(self.read_all()?.into_keys().collect())
    }
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<BTreeMap<String, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Profile>> {
        // A poisoned map is still a valid map
        self.profiles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get(&self, name: &str) -> Result<Option<Profile>, ProfileError> {
        Ok(self.lock().get(name).cloned())
    }

    fn put(&self, name: &str, profile: &Profile) -> Result<(), ProfileError> {
        check_name(name)?;
        self.lock().insert(name.to_string(), profile.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool, ProfileError> {
        Ok(self.lock().remove(name).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, ProfileError> {
        Ok(self.lock().keys().cloned().collect())
    }
}
