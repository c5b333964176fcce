//! Filename → layout resolution.
//!
//! Theme images carry their layout code somewhere in the filename:
//! `cover_158A_final.jpg`, `158a.png`, `Pack/620C-night.webp`. Matching is a
//! plain substring test on the uppercased name:
//!
//! - only the last extension is dropped; archive member directories stay
//!   part of the key (`158A/background.png` → `158A/background`);
//! - the key is uppercased, so codes match case-insensitively;
//! - codes are tried in catalog order and the **first** contained code wins.
//!
//! First-match is order dependent when a stem contains two codes
//! (`158A_vs_264B.png` matches whichever comes first in the catalog).
//! [`matching_codes`] lists every contained code so callers can flag those
//! filenames; the tie-break itself stays first-match.

use crate::catalog::{LayoutCatalog, LayoutEntry};

/// A successful filename match.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutMatch<'a> {
    pub code: &'a str,
    pub entry: &'a LayoutEntry,
}

/// Filename with the directory part and last extension removed.
///
/// - `"cover_158A_final.jpg"` → `"cover_158A_final"`
/// - `"dir/sub/banner.png"` → `"banner"`
/// - `"archive.tar.gz"` → `"archive.tar"`
/// - `".png"` → `""`
/// - `"noext"` → `"noext"`
pub fn file_stem(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    strip_extension(base)
}

/// Matching key: the whole name minus its last extension.
///
/// - `"158A/background.png"` → `"158A/background"`
/// - `"pack.v2/night"` → `"pack.v2/night"`
/// - `".png"` → `""`
pub fn match_key(filename: &str) -> &str {
    strip_extension(filename)
}

fn strip_extension(name: &str) -> &str {
    let base_start = name.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match name[base_start..].rfind('.') {
        Some(dot) => &name[..base_start + dot],
        None => name,
    }
}

/// Resolve the layout of `filename`: the first catalog code contained in
/// the uppercased [`match_key`], or `None`.
pub fn match_filename<'a>(filename: &str, catalog: &'a LayoutCatalog) -> Option<LayoutMatch<'a>> {
    let stem = match_key(filename).to_uppercase();
    if stem.is_empty() {
        return None;
    }
    catalog
        .iter()
        .find(|entry| stem.contains(entry.code.as_str()))
        .map(|entry| LayoutMatch {
            code: entry.code.as_str(),
            entry,
        })
}

/// Every catalog code contained in the uppercased [`match_key`], in catalog
/// order. More than one element means the filename is ambiguous.
pub fn matching_codes<'a>(filename: &str, catalog: &'a LayoutCatalog) -> Vec<&'a str> {
    let stem = match_key(filename).to_uppercase();
    if stem.is_empty() {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|entry| stem.contains(entry.code.as_str()))
        .map(|entry| entry.code.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LayoutCatalog {
        LayoutCatalog::from_entries([
            LayoutEntry::new("158A", 1080, 1720),
            LayoutEntry::new("264B", 1020, 3040),
            LayoutEntry::new("58A", 1, 1),
        ])
    }

    // =========================================================================
    // file_stem tests
    // =========================================================================

    #[test]
    fn stem_strips_last_extension() {
        assert_eq!(file_stem("cover_158A_final.jpg"), "cover_158A_final");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
    }

    #[test]
    fn stem_strips_directories() {
        assert_eq!(file_stem("pack/sub/banner.png"), "banner");
        assert_eq!(file_stem("pack\\banner.png"), "banner");
    }

    #[test]
    fn stem_without_extension() {
        assert_eq!(file_stem("noext"), "noext");
    }

    #[test]
    fn stem_of_dotfile_is_empty() {
        assert_eq!(file_stem(".png"), "");
    }

    #[test]
    fn match_key_keeps_directories() {
        assert_eq!(match_key("158A/background.png"), "158A/background");
        assert_eq!(match_key("pack\\cover.jpg"), "pack\\cover");
        assert_eq!(match_key("pack.v2/night"), "pack.v2/night");
        assert_eq!(match_key("cover_158A_final.jpg"), "cover_158A_final");
        assert_eq!(match_key(".png"), "");
    }

    // =========================================================================
    // match_filename tests
    // =========================================================================

    #[test]
    fn matches_code_inside_stem() {
        let catalog = catalog();
        let m = match_filename("cover_158A_final.jpg", &catalog).unwrap();
        assert_eq!(m.code, "158A");
        assert_eq!(m.entry.size(), (1080, 1720));
    }

    #[test]
    fn matches_case_insensitively() {
        let catalog = catalog();
        assert_eq!(match_filename("theme-264b.PNG", &catalog).unwrap().code, "264B");
    }

    #[test]
    fn ignores_code_in_extension() {
        let catalog = LayoutCatalog::from_entries([LayoutEntry::new("PNG", 1, 1)]);
        assert!(match_filename("banner.png", &catalog).is_none());
    }

    #[test]
    fn matches_code_in_member_directory() {
        let catalog = LayoutCatalog::from_entries([LayoutEntry::new("158A", 10, 20)]);
        let m = match_filename("158A/background.png", &catalog).unwrap();
        assert_eq!(m.code, "158A");
        assert_eq!(m.entry.size(), (10, 20));
        assert_eq!(matching_codes("pack/158a/bg.webp", &catalog), vec!["158A"]);
    }

    #[test]
    fn no_match_returns_none() {
        assert!(match_filename("banner.png", &catalog()).is_none());
    }

    #[test]
    fn empty_stem_never_matches() {
        assert!(match_filename(".png", &catalog()).is_none());
        assert!(match_filename("", &catalog()).is_none());
    }

    #[test]
    fn first_catalog_code_wins() {
        // "158A" and "58A" both occur; "158A" is earlier in the catalog
        let catalog = catalog();
        assert_eq!(match_filename("x158Ay.png", &catalog).unwrap().code, "158A");

        // Reversing catalog order flips the winner
        let reversed = LayoutCatalog::from_entries([
            LayoutEntry::new("58A", 1, 1),
            LayoutEntry::new("158A", 1080, 1720),
        ]);
        assert_eq!(match_filename("x158Ay.png", &reversed).unwrap().code, "58A");
    }

    #[test]
    fn first_match_is_stable_across_calls() {
        let catalog = catalog();
        let first = match_filename("264B_158A.png", &catalog).unwrap().code;
        for _ in 0..10 {
            assert_eq!(match_filename("264B_158A.png", &catalog).unwrap().code, first);
        }
        // Catalog order, not position in the filename
        assert_eq!(first, "158A");
    }

    #[test]
    fn empty_catalog_never_matches() {
        assert!(match_filename("158A.png", &LayoutCatalog::empty()).is_none());
    }

    // =========================================================================
    // matching_codes tests
    // =========================================================================

    #[test]
    fn matching_codes_lists_all_in_catalog_order() {
        let catalog = catalog();
        assert_eq!(
            matching_codes("264b-158a.png", &catalog),
            vec!["158A", "264B", "58A"]
        );
    }

    #[test]
    fn matching_codes_single_and_none() {
        let catalog = catalog();
        assert_eq!(matching_codes("264B.png", &catalog), vec!["264B"]);
        assert!(matching_codes("banner.png", &catalog).is_empty());
    }
}
