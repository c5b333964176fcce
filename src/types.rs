//! Shared types used across the pipeline, export and upload stages.

use crate::imaging::calculate_effective_size;
use std::sync::Arc;

/// One rendered image tracked by the pipeline.
///
/// `width`/`height` are the size `pixels` was rendered at. The custom size
/// fields are edited by the user and only take effect on a later re-render
/// (export or upload); `pixels` is never refreshed automatically.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    /// Output filename (`158A.png`, `banner.png`); user editable.
    pub name: String,
    /// PNG bytes rendered at `width × height`.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// When true, export uses `custom_width × custom_height`.
    pub is_custom_size: bool,
    pub custom_width: u32,
    pub custom_height: u32,
    /// Layout code found in the source filename, if any.
    pub matched_code: Option<String>,
    /// External id of the matched layout (remote catalogs only).
    pub layout_id: Option<i64>,
    /// Name of the input (or archive member) the record came from.
    pub source_name: String,
    /// Original encoded bytes, kept for re-rendering at another size.
    pub source: Arc<[u8]>,
}

impl RenderRecord {
    /// The size export renders at.
    pub fn effective_size(&self) -> (u32, u32) {
        calculate_effective_size(
            self.is_custom_size,
            (self.custom_width, self.custom_height),
            (self.width, self.height),
        )
    }

    /// Unmatched records are the fallback thumbnail source on upload.
    pub fn is_unmapped(&self) -> bool {
        self.matched_code.is_none()
    }

    /// Apply a partial edit. Does not re-render.
    pub fn apply(&mut self, update: &RecordUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(w) = update.custom_width {
            self.custom_width = w;
        }
        if let Some(h) = update.custom_height {
            self.custom_height = h;
        }
        if let Some(flag) = update.is_custom_size {
            self.is_custom_size = flag;
        }
    }
}

/// Fields a user may rewrite on a record; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub name: Option<String>,
    pub custom_width: Option<u32>,
    pub custom_height: Option<u32>,
    pub is_custom_size: Option<bool>,
}

impl RecordUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set and enable a custom size.
    pub fn custom_size(width: u32, height: u32) -> Self {
        Self {
            custom_width: Some(width),
            custom_height: Some(height),
            is_custom_size: Some(true),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::record;

    #[test]
    fn effective_size_of_matched_record_is_rendered_size() {
        let r = record("158A.png", Some("158A"), 1080, 1720);
        assert_eq!(r.effective_size(), (1080, 1720));
    }

    #[test]
    fn effective_size_follows_custom_fields() {
        let mut r = record("banner.png", None, 1200, 400);
        assert!(r.is_custom_size);
        assert_eq!(r.effective_size(), (1200, 400));
        r.apply(&RecordUpdate::custom_size(600, 200));
        assert_eq!(r.effective_size(), (600, 200));
        // Rendered size is untouched until a re-render
        assert_eq!((r.width, r.height), (1200, 400));
    }

    #[test]
    fn apply_only_touches_given_fields() {
        let mut r = record("banner.png", None, 1200, 400);
        let before = r.clone();
        r.apply(&RecordUpdate::rename("hero.png"));
        assert_eq!(r.name, "hero.png");
        assert_eq!(r.custom_width, before.custom_width);
        assert_eq!(r.pixels, before.pixels);
        assert_eq!(r.is_custom_size, before.is_custom_size);
    }

    #[test]
    fn disabling_custom_size_restores_rendered_size() {
        let mut r = record("158A.png", Some("158A"), 1080, 1720);
        r.apply(&RecordUpdate::custom_size(10, 10));
        assert_eq!(r.effective_size(), (10, 10));
        r.apply(&RecordUpdate {
            is_custom_size: Some(false),
            ..RecordUpdate::default()
        });
        assert_eq!(r.effective_size(), (1080, 1720));
    }

    #[test]
    fn unmapped_iff_no_code() {
        assert!(record("a.png", None, 1, 1).is_unmapped());
        assert!(!record("158A.png", Some("158A"), 1, 1).is_unmapped());
    }
}
