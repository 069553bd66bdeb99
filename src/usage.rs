//! Filesystem capacity accounting via `statvfs(3)`.

use std::path::{Path, PathBuf};

/// Errors that may occur while querying block statistics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to query block statistics for `{path}`: {source}")]
    Statvfs {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Capacity of the filesystem backing a path, in bytes.
///
/// `used_bytes` is derived as `total_bytes - free_bytes` and not measured on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BlockUsage {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
}

impl BlockUsage {
    /// Computes byte values from raw block counts.
    ///
    /// # Arguments
    ///
    /// * `block_size` - Size of one block in bytes.
    /// * `total` - Total number of blocks.
    /// * `free` - Free blocks, including those reserved for privileged users.
    /// * `available` - Blocks available to unprivileged users.
    pub fn from_blocks(block_size: u64, total: u64, free: u64, available: u64) -> Self {
        let total_bytes = total.saturating_mul(block_size);
        let free_bytes = free.saturating_mul(block_size);
        Self {
            total_bytes,
            free_bytes,
            available_bytes: available.saturating_mul(block_size),
            used_bytes: total_bytes.saturating_sub(free_bytes),
        }
    }
}

/// Reads block statistics of the filesystem containing `path`.
///
/// # Errors
///
/// Returns [`Error::Statvfs`] if the `statvfs` call fails, e.g. because the path
/// does not exist.
pub fn read_block_usage(path: impl AsRef<Path>) -> Result<BlockUsage> {
    let path = path.as_ref();
    let stat = nix::sys::statvfs::statvfs(path).map_err(|source| Error::Statvfs {
        path: path.to_path_buf(),
        source,
    })?;

    // Block counts are in units of the fragment size, not f_bsize.
    Ok(BlockUsage::from_blocks(
        stat.fragment_size() as u64,
        stat.blocks() as u64,
        stat.blocks_free() as u64,
        stat.blocks_available() as u64,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blocks() {
        let usage = BlockUsage::from_blocks(4096, 1000, 250, 200);
        assert_eq!(usage.total_bytes, 4_096_000);
        assert_eq!(usage.free_bytes, 1_024_000);
        assert_eq!(usage.available_bytes, 819_200);
        assert_eq!(usage.used_bytes, 3_072_000);
    }

    #[test]
    fn test_from_blocks_completely_free() {
        let usage = BlockUsage::from_blocks(512, 64, 64, 60);
        assert_eq!(usage.free_bytes, usage.total_bytes);
        assert_eq!(usage.used_bytes, 0);
    }

    #[test]
    fn test_used_is_total_minus_free() {
        for (bs, total, free) in [(1, 0, 0), (1024, 10, 3), (65536, 1 << 30, 12345)] {
            let usage = BlockUsage::from_blocks(bs, total, free, free);
            assert_eq!(usage.used_bytes, usage.total_bytes - usage.free_bytes);
        }
    }

    #[test]
    fn test_from_blocks_saturates() {
        let usage = BlockUsage::from_blocks(u64::MAX, 2, 1, 1);
        assert_eq!(usage.total_bytes, u64::MAX);
    }

    #[test]
    fn test_read_block_usage_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let usage = read_block_usage(dir.path()).unwrap();
        assert!(usage.free_bytes <= usage.total_bytes);
        assert!(usage.available_bytes <= usage.free_bytes);
        assert_eq!(usage.used_bytes, usage.total_bytes - usage.free_bytes);
    }

    #[test]
    fn test_read_block_usage_missing_path() {
        let err = read_block_usage("/definitely/does/not/exist").unwrap_err();
        match err {
            Error::Statvfs { path, source } => {
                assert_eq!(path, PathBuf::from("/definitely/does/not/exist"));
                assert_eq!(source, nix::Error::ENOENT);
            }
        }
    }
}
