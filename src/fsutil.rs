use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use volume_stat::fsutil;
/// let reader = fsutil::open_file_reader("/proc/self/mountinfo")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Turns `path` into an absolute path suitable for comparing against mount points.
///
/// Existing paths are canonicalized so symlinks and `..` components resolve to the
/// location the kernel reports in the mount table. Paths that cannot be canonicalized
/// (e.g. they do not exist yet) are made absolute lexically against the current
/// working directory instead. If even that fails, the path is returned unchanged.
pub fn absolutize(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    match std::fs::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(err) => {
            log::debug!(
                "could not canonicalize `{}`, falling back to lexical absolute path: {}",
                path.display(),
                err
            );
            std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
        }
    }
}
