//! Resolution of the mount backing a path.
//!
//! The resolver reads a Linux `mountinfo` table once and picks the mount whose
//! mount point is the longest path prefix of the target directory.
mod error;
mod parser;
mod resolve;

pub use error::{Error, Result};
pub use parser::{MountInfo, MountInfoField, ParseError, parse_mount_info_line};
pub use resolve::{
    DEFAULT_MOUNTINFO_PATH, MountRecord, UNKNOWN, find_mount, find_mount_from_reader, resolve,
};
