//! Zip archive expansion.
//!
//! [`expand`] opens an in-memory zip and returns [`ArchiveMembers`], a lazy,
//! single-pass iterator over the raster images inside it, in archive order.
//! Members are inflated one at a time as the iterator advances; expanding the
//! same archive again needs a fresh call with the original bytes.
//!
//! Filtering rules:
//! - directory entries are skipped;
//! - only names ending in png/jpg/jpeg/webp (any case) are yielded;
//! - everything else (text files, nested archives, unsupported formats) is
//!   skipped silently.
//!
//! A corrupt archive fails up front with [`ArchiveError::Decode`]. A single
//! member that fails to inflate is yielded as an `Err` item and iteration
//! continues with the next member.

use crate::imaging::has_raster_extension;
use std::io::{Cursor, Read};
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Unreadable archive: {0}")]
    Decode(String),
    #[error("Unreadable archive member {name}: {reason}")]
    Member { name: String, reason: String },
}

/// Upper bound on the buffer reserved from a member's declared size.
/// Larger members still read fully; the buffer just grows as data arrives.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Initial buffer capacity for a member whose header claims `declared` bytes.
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}

/// One raster image extracted from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Full member path inside the archive (e.g. `pack/158A.png`).
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Lazy iterator over the raster members of a zip archive.
pub struct ArchiveMembers {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    next_index: usize,
}

/// Open `bytes` as a zip archive.
pub fn expand(bytes: Vec<u8>) -> Result<ArchiveMembers, ArchiveError> {
    let archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ArchiveError::Decode(e.to_string()))?;
    Ok(ArchiveMembers {
        archive,
        next_index: 0,
    })
}

impl ArchiveMembers {
    /// Total number of entries in the archive, including skipped ones.
    pub fn entry_count(&self) -> usize {
        self.archive.len()
    }
}

impl Iterator for ArchiveMembers {
    type Item = Result<ArchiveMember, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.archive.len() {
            let index = self.next_index;
            self.next_index += 1;

            let mut file = match self.archive.by_index(index) {
                Ok(file) => file,
                Err(e) => {
                    return Some(Err(ArchiveError::Member {
                        name: format!("#{index}"),
                        reason: e.to_string(),
                    }));
                }
            };

            if file.is_dir() || !has_raster_extension(file.name()) {
                debug!(member = file.name(), "skipping non-image archive member");
                continue;
            }

            let name = file.name().to_string();
            let mut bytes = Vec::with_capacity(initial_capacity(file.size()));
            if let Err(e) = file.read_to_end(&mut bytes) {
                return Some(Err(ArchiveError::Member {
                    name,
                    reason: e.to_string(),
                }));
            }
            return Some(Ok(ArchiveMember { name, bytes }));
        }
        None
    }
}
