use crate::fsutil;

use super::parser::parse_mount_info_line;
use super::{Error, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Mount table of the current process.
pub const DEFAULT_MOUNTINFO_PATH: &str = "/proc/self/mountinfo";

/// Label value used when the backing mount cannot be determined.
pub const UNKNOWN: &str = "unknown";

/// The mount backing a target path, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MountRecord {
    /// Root of the mount within its filesystem. For bind mounts this is the
    /// host-side directory that was mounted into the process.
    host_mount_path: String,
    /// Mount point as seen by the process.
    mount_point: String,
    /// Mount source, usually the backing block device.
    device: String,
    /// `major:minor` of the backing device.
    major_minor: String,
    /// Absolute form of the target path.
    target: PathBuf,
}

impl MountRecord {
    /// Record used when the mount table cannot be read or no mount matches.
    pub fn unknown(target: impl Into<PathBuf>) -> Self {
        Self {
            host_mount_path: UNKNOWN.to_owned(),
            mount_point: UNKNOWN.to_owned(),
            device: UNKNOWN.to_owned(),
            major_minor: UNKNOWN.to_owned(),
            target: target.into(),
        }
    }

    pub fn host_mount_path(&self) -> &str {
        &self.host_mount_path
    }

    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn major_minor(&self) -> &str {
        &self.major_minor
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Returns `true` if this is the [`MountRecord::unknown`] sentinel.
    pub fn is_unknown(&self) -> bool {
        self.device == UNKNOWN && self.host_mount_path == UNKNOWN
    }
}

/// Resolves the mount backing `target` using the mount table at `mountinfo`.
///
/// `target` is made absolute (and canonicalized when it exists) before matching.
/// This never fails: an unreadable mount table or a table without a matching
/// entry yields [`MountRecord::unknown`] and a warning in the log.
///
/// # Example
///
/// ```no_run
/// use volume_stat::mountinfo::{self, DEFAULT_MOUNTINFO_PATH};
///
/// let record = mountinfo::resolve("/data", DEFAULT_MOUNTINFO_PATH);
/// println!("{} is on {}", record.target().display(), record.device());
/// ```
pub fn resolve(target: impl AsRef<Path>, mountinfo: impl AsRef<Path>) -> MountRecord {
    let target = fsutil::absolutize(target);
    log::info!("Resolving mount info for {}", target.display());

    match find_mount(&target, mountinfo) {
        Ok(Some(record)) => record,
        Ok(None) => {
            log::warn!("No mount found containing {}", target.display());
            MountRecord::unknown(target)
        }
        Err(err) => {
            log::warn!("Failed to read mount table: {}", err);
            MountRecord::unknown(target)
        }
    }
}

/// Finds the mount with the longest mount point containing the absolute path `target`.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the mount table can't be opened.
/// - [`Error::ReadLine`] if reading from the mount table fails.
pub fn find_mount(target: &Path, mountinfo: impl AsRef<Path>) -> Result<Option<MountRecord>> {
    let mountinfo = mountinfo.as_ref();
    let buf = fsutil::open_file_reader(mountinfo)?;

    find_mount_from_reader(buf, mountinfo, target)
}

/// Reader-based implementation of [`find_mount`].
///
/// Lines are compared in table order; a later entry only replaces the current
/// best match if its mount point is strictly longer, so equal-length matches keep
/// the first one seen. Matching is by whole path components, so `/data` contains
/// `/data/app` but not `/database`. Lines that are not valid UTF-8 or fail to
/// parse are skipped.
///
/// # Arguments
///
/// * `reader` - Buffered reader over the mountinfo content.
/// * `origin` - Logical origin of the data, used in error messages.
/// * `target` - Absolute path to resolve.
///
/// # Errors
///
/// - [`Error::ReadLine`] if reading a line fails.
pub fn find_mount_from_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
    target: &Path,
) -> Result<Option<MountRecord>> {
    let mut buf = Vec::with_capacity(256);
    let mut best: Option<MountRecord> = None;
    let mut best_len = 0;

    while reader
        .read_until(b'\n', &mut buf)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(err) => {
                log::debug!(
                    "Skipping non UTF-8 mountinfo line in `{}`: {}",
                    origin.display(),
                    err
                );
                buf.clear();
                continue;
            }
        };

        match parse_mount_info_line(line) {
            Ok(mount_info) => {
                let mount_point = &*mount_info.mount_point;
                log::trace!(
                    "checking if `{}` is below mount point `{}`",
                    target.display(),
                    mount_point
                );
                if mount_point.len() > best_len && target.starts_with(mount_point) {
                    log::debug!(
                        "New best mount match for `{}`: {} ({} on {})",
                        target.display(),
                        mount_point,
                        mount_info.root,
                        mount_info.source
                    );
                    best_len = mount_point.len();
                    best = Some(MountRecord {
                        host_mount_path: mount_info.root.into_owned(),
                        mount_point: mount_info.mount_point.into_owned(),
                        device: mount_info.source.into_owned(),
                        major_minor: mount_info.major_minor.to_owned(),
                        target: target.to_path_buf(),
                    });
                }
            }
            Err(err) => log::debug!("Skipping mountinfo line in `{}`: {}", origin.display(), err),
        }

        buf.clear();
    }

    Ok(best)
}
