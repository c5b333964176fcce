//! Layout catalog: layout code → target pixel size.
//!
//! A layout code is a short alphanumeric identifier (`158A`, `620C`, ...)
//! naming a fixed output size. The catalog keeps entries in insertion order
//! because filename matching is first-match in catalog order (see
//! [`matcher`](crate::matcher)).
//!
//! Two sources exist:
//! - the compiled-in [`BUILTIN_LAYOUTS`] table, optionally extended by
//!   `[[catalog.layouts]]` entries in `config.toml`;
//! - the remote API ([`api::ApiClient::fetch_layouts`](crate::api::ApiClient::fetch_layouts)),
//!   whose entries also carry the external layout id needed for uploads.

use serde::{Deserialize, Serialize};

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutEntry {
    pub code: String,
    pub width: u32,
    pub height: u32,
    /// External identifier, only known for catalogs loaded from the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl LayoutEntry {
    pub fn new(code: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            code: code.into(),
            width,
            height,
            id: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Same entry with its code trimmed and uppercased.
    pub fn normalized(mut self) -> Self {
        self.code = normalize_code(&self.code);
        self
    }
}

/// Canonical form of a layout code. Filename matching compares against the
/// uppercased name, so only uppercase codes can ever match.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Compiled-in layout table, in matching order.
pub const BUILTIN_LAYOUTS: &[(&str, u32, u32)] = &[
    ("158A", 1080, 1720),
    ("158B", 1080, 1720),
    ("158C", 1080, 1720),
    ("158D", 1720, 1080),
    ("158E", 1720, 1080),
    ("264A", 1020, 3040),
    ("264B", 1020, 3040),
    ("264C", 3040, 1020),
    ("264D", 3040, 1020),
    ("264E", 2040, 3040),
    ("461A", 2040, 3040),
    ("461B", 3040, 2040),
    ("463A", 2040, 3040),
    ("463B", 3040, 2040),
    ("464A", 2040, 3040),
    ("464B", 3040, 2040),
    ("466A", 2040, 3040),
    ("466B", 3040, 2040),
    ("468A", 2040, 3040),
    ("468B", 3040, 2040),
    ("620A", 3060, 10200),
    ("620B", 10200, 3060),
    ("620C", 10200, 3060),
];

/// Ordered code → size mapping, one entry per code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutCatalog {
    entries: Vec<LayoutEntry>,
}

impl LayoutCatalog {
    /// An empty catalog: every filename falls back to its intrinsic size.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The compiled-in table.
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_LAYOUTS
                .iter()
                .map(|&(code, w, h)| LayoutEntry::new(code, w, h)),
        )
    }

    /// Build from entries; a repeated code replaces the earlier entry in place.
    pub fn from_entries(entries: impl IntoIterator<Item = LayoutEntry>) -> Self {
        let mut catalog = Self::empty();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    fn insert(&mut self, entry: LayoutEntry) {
        match self.entries.iter_mut().find(|e| e.code == entry.code) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Append entries after the current ones (same replace-in-place rule).
    pub fn extend(&mut self, entries: impl IntoIterator<Item = LayoutEntry>) {
        for entry in entries {
            self.insert(entry);
        }
    }

    /// Full-catalog refresh.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = LayoutEntry>) {
        *self = Self::from_entries(entries);
    }

    /// Case-sensitive lookup by code.
    pub fn lookup(&self, code: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_every_code_in_order() {
        let catalog = LayoutCatalog::builtin();
        assert_eq!(catalog.len(), BUILTIN_LAYOUTS.len());
        let codes: Vec<&str> = catalog.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes.first(), Some(&"158A"));
        assert_eq!(codes.last(), Some(&"620C"));
    }

    #[test]
    fn builtin_sizes() {
        let catalog = LayoutCatalog::builtin();
        assert_eq!(catalog.lookup("158A").unwrap().size(), (1080, 1720));
        assert_eq!(catalog.lookup("158D").unwrap().size(), (1720, 1080));
        assert_eq!(catalog.lookup("620A").unwrap().size(), (3060, 10200));
        assert!(catalog.lookup("158A").unwrap().id.is_none());
    }

    #[test]
    fn builtin_sizes_are_positive() {
        for entry in LayoutCatalog::builtin().iter() {
            assert!(entry.width > 0 && entry.height > 0, "{}", entry.code);
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let catalog = LayoutCatalog::builtin();
        assert!(catalog.lookup("158a").is_none());
        assert!(catalog.lookup("999Z").is_none());
    }

    #[test]
    fn duplicate_code_replaces_in_place() {
        let catalog = LayoutCatalog::from_entries([
            LayoutEntry::new("A1", 10, 10),
            LayoutEntry::new("B2", 20, 20),
            LayoutEntry::new("A1", 30, 30).with_id(7),
        ]);
        assert_eq!(catalog.len(), 2);
        let first = catalog.iter().next().unwrap();
        assert_eq!(first.code, "A1");
        assert_eq!(first.size(), (30, 30));
        assert_eq!(first.id, Some(7));
    }

    #[test]
    fn extend_appends_after_builtin() {
        let mut catalog = LayoutCatalog::builtin();
        catalog.extend([LayoutEntry::new("700A", 1200, 1600)]);
        assert_eq!(catalog.iter().last().unwrap().code, "700A");
        assert_eq!(catalog.len(), BUILTIN_LAYOUTS.len() + 1);
    }

    #[test]
    fn replace_all_discards_previous_entries() {
        let mut catalog = LayoutCatalog::builtin();
        catalog.replace_all([LayoutEntry::new("X1", 1, 2).with_id(3)]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.lookup("158A").is_none());
        assert_eq!(catalog.lookup("X1").unwrap().id, Some(3));
    }

    #[test]
    fn normalize_code_trims_and_uppercases() {
        assert_eq!(normalize_code(" 700a "), "700A");
        assert_eq!(LayoutEntry::new("158b", 1, 2).normalized().code, "158B");
    }

    #[test]
    fn empty_catalog() {
        let catalog = LayoutCatalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.lookup("158A").is_none());
    }
}
