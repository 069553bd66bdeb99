//! Recursive size and entry accounting for a directory tree.
//!
//! A scan walks every entry below the root once without following symlinks and
//! never fails as a whole: entries that cannot be read are counted in
//! [`ScanResult::errors`] and the walk continues.

use std::path::Path;
use std::time::{Duration, Instant};

use walkdir::WalkDir;

/// Totals of a single walk over a directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScanResult {
    /// Sum of the sizes of all non-directory entries, in bytes.
    pub size_bytes: u64,
    /// Number of non-directory entries (regular files, symlinks, sockets, ...).
    pub files: u64,
    /// Number of directories below the root.
    pub directories: u64,
    /// Number of entries that could not be read.
    pub errors: u64,
    /// Wall-clock duration of the walk.
    #[serde(rename = "elapsed_micros", serialize_with = "serialize_micros")]
    pub elapsed: Duration,
}

impl ScanResult {
    /// Elapsed time of the walk in microseconds, saturating at `u64::MAX`.
    pub fn elapsed_micros(&self) -> u64 {
        u64::try_from(self.elapsed.as_micros()).unwrap_or(u64::MAX)
    }
}

fn serialize_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}

/// Walks the tree below `root` and aggregates sizes and entry counts.
///
/// The root itself is not counted. A root that cannot be opened or is not a
/// directory results in a single error and zero entries. A directory whose
/// listing fails is still counted as a directory and adds one error for the
/// failed listing.
pub fn scan(root: impl AsRef<Path>) -> ScanResult {
    let root = root.as_ref();
    let started = Instant::now();
    let mut result = ScanResult::default();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::trace!("scan error below `{}`: {}", root.display(), err);
                result.errors += 1;
                continue;
            }
        };
        if entry.depth() == 0 {
            if !entry.file_type().is_dir() {
                log::warn!("Scan root `{}` is not a directory", root.display());
                result.errors += 1;
            }
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                log::trace!("failed to stat `{}`: {}", entry.path().display(), err);
                result.errors += 1;
                continue;
            }
        };

        if metadata.is_dir() {
            result.directories += 1;
        } else {
            result.files += 1;
            result.size_bytes = result.size_bytes.saturating_add(metadata.len());
        }
    }

    result.elapsed = started.elapsed();
    result
}
