//! Mountinfo line parser for Linux systems.
//!
//! Parses lines in `/proc/[pid]/mountinfo` format. See
//! [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html)
//! for details on the structure.

use std::borrow::Cow;

/// Represents a parsed mountinfo line.
///
/// Path-like fields are unescaped, every other field borrows from the input line.
#[derive(Debug, PartialEq, Eq)]
pub struct MountInfo<'a> {
    /// Mount ID field.
    pub mount_id: &'a str,
    /// Parent mount ID field.
    pub parent_id: &'a str,
    /// Major:Minor device identifier.
    pub major_minor: &'a str,
    /// Root of the mount within the filesystem.
    pub root: Cow<'a, str>,
    /// Mount point relative to the process's root.
    pub mount_point: Cow<'a, str>,
    /// Per-mount options.
    pub mount_options: &'a str,
    /// Optional tagged fields, e.g. `shared:20` (can be empty).
    pub optional_fields: Vec<&'a str>,
    /// Filesystem type (e.g., `ext4`, `overlay`).
    pub fs_type: &'a str,
    /// Source of the mount (e.g., device).
    pub source: Cow<'a, str>,
}

/// Named fields in a mountinfo line.
#[derive(Debug)]
pub enum MountInfoField {
    MountId,
    ParentId,
    MajorMinor,
    Root,
    MountPoint,
    MountOptions,
    FsType,
    Source,
}

impl std::fmt::Display for MountInfoField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MountInfoField::MountId => "mount_id",
            MountInfoField::ParentId => "parent_id",
            MountInfoField::MajorMinor => "major:minor",
            MountInfoField::Root => "root",
            MountInfoField::MountPoint => "mount_point",
            MountInfoField::MountOptions => "mount_options",
            MountInfoField::FsType => "fs_type",
            MountInfoField::Source => "source",
        };
        write!(f, "{name}")
    }
}

/// Errors that may occur when parsing a mountinfo line.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum ParseError {
    #[error("missing separator ` - ` in line: `{0}`")]
    MissingSeparator(String),

    #[error("missing `{field}` in pre-separator section of line: `{line}`")]
    MissingPreSeparatorField { field: MountInfoField, line: String },

    #[error("missing `{field}` in post-separator section of line: `{line}`")]
    MissingPostSeparatorField { field: MountInfoField, line: String },

    #[error("malformed major:minor `{value}` in line: `{line}`")]
    InvalidMajorMinor { value: String, line: String },
}

/// Parses a single line of mountinfo data.
///
/// The line must follow the Linux kernel format described in [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html).
/// Octal escapes the kernel emits for whitespace and backslashes in `root`,
/// `mount_point` and `source` are decoded; those fields only allocate when an
/// escape is actually present.
///
/// # Errors
///
/// Returns [`ParseError`] variants for a missing separator, missing required fields
/// or a device field that is not of the form `major:minor`.
pub fn parse_mount_info_line(line: &str) -> Result<MountInfo<'_>, ParseError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let (pre, post) = line
        .split_once(" - ")
        .ok_or_else(|| ParseError::MissingSeparator(line.to_owned()))?;

    let mut pre_fields = pre.split_whitespace();
    let mut next_pre = |field: MountInfoField| {
        pre_fields
            .next()
            .ok_or_else(|| ParseError::MissingPreSeparatorField {
                field,
                line: line.to_owned(),
            })
    };
    let mount_id = next_pre(MountInfoField::MountId)?;
    let parent_id = next_pre(MountInfoField::ParentId)?;
    let major_minor = next_pre(MountInfoField::MajorMinor)?;
    let root = next_pre(MountInfoField::Root)?;
    let mount_point = next_pre(MountInfoField::MountPoint)?;
    let mount_options = next_pre(MountInfoField::MountOptions)?;
    let optional_fields: Vec<&str> = pre_fields.collect();

    if !is_major_minor(major_minor) {
        return Err(ParseError::InvalidMajorMinor {
            value: major_minor.to_owned(),
            line: line.to_owned(),
        });
    }

    let mut post_fields = post.split_whitespace();
    let fs_type = post_fields
        .next()
        .ok_or_else(|| ParseError::MissingPostSeparatorField {
            field: MountInfoField::FsType,
            line: line.to_owned(),
        })?;
    let source = post_fields
        .next()
        .ok_or_else(|| ParseError::MissingPostSeparatorField {
            field: MountInfoField::Source,
            line: line.to_owned(),
        })?;

    Ok(MountInfo {
        mount_id,
        parent_id,
        major_minor,
        root: unescape(root),
        mount_point: unescape(mount_point),
        mount_options,
        optional_fields,
        fs_type,
        source: unescape(source),
    })
}

fn is_major_minor(value: &str) -> bool {
    match value.split_once(':') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.bytes().all(|b| b.is_ascii_digit())
                && minor.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Decodes the `\ooo` octal escapes used by the kernel for mountinfo fields.
///
/// Sequences that are not a valid three-digit octal escape are kept verbatim.
fn unescape(field: &str) -> Cow<'_, str> {
    if !field.contains('\\') {
        return Cow::Borrowed(field);
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_mountinfo_line() {
        let line = "42 35 8:1 /var/lib/data /data rw,relatime - ext4 /dev/sda1 rw,data=ordered";
        let result = parse_mount_info_line(line).unwrap();

        assert_eq!(result.mount_id, "42");
        assert_eq!(result.parent_id, "35");
        assert_eq!(result.major_minor, "8:1");
        assert_eq!(result.root, "/var/lib/data");
        assert_eq!(result.mount_point, "/data");
        assert_eq!(result.mount_options, "rw,relatime");
        assert_eq!(result.fs_type, "ext4");
        assert_eq!(result.source, "/dev/sda1");
        assert!(result.optional_fields.is_empty());
    }

    #[test]
    fn parses_trailing_newline() {
        let line = "36 25 0:32 / /sys rw - sysfs sysfs rw\n";
        let result = parse_mount_info_line(line).unwrap();
        assert_eq!(result.source, "sysfs");
        assert_eq!(result.fs_type, "sysfs");
    }

    #[test]
    fn parses_valid_line_with_multiple_optional_fields() {
        let line = "70 56 0:45 / /var rw,nosuid,nodev,noexec,relatime shared:20 master:1 - ext4 /dev/sdb1 rw,errors=remount-ro";
        let result = parse_mount_info_line(line).unwrap();
        assert_eq!(result.mount_options, "rw,nosuid,nodev,noexec,relatime");
        assert_eq!(result.optional_fields, vec!["shared:20", "master:1"]);
    }

    #[test]
    fn decodes_octal_escapes() {
        let line = r"99 1 0:50 /with\040space /mnt/my\040disk rw - fuse.sshfs host:/a\134b rw";
        let result = parse_mount_info_line(line).unwrap();
        assert_eq!(result.root, "/with space");
        assert_eq!(result.mount_point, "/mnt/my disk");
        assert_eq!(result.source, r"host:/a\b");
        assert!(matches!(result.mount_point, Cow::Owned(_)));
    }

    #[test]
    fn keeps_invalid_escapes_verbatim() {
        assert_eq!(unescape(r"/a\9b"), r"/a\9b");
        assert_eq!(unescape(r"/trailing\04"), r"/trailing\04");
        assert_eq!(unescape(r"/end\"), r"/end\");
    }

    #[test]
    fn error_on_missing_separator() {
        let line = "42 35 0:22 / /mnt rw,nosuid ext4 /dev/sda1 rw";
        let err = parse_mount_info_line(line).unwrap_err();
        assert!(matches!(err, ParseError::MissingSeparator(_)));
    }

    #[test]
    fn error_on_missing_mount_point() {
        let line = "42 35 0:22 / - ext4 /dev/sda1 rw";
        let err = parse_mount_info_line(line).unwrap_err();
        match err {
            ParseError::MissingPreSeparatorField { field, .. } => {
                assert_eq!(field.to_string(), "mount_point");
            }
            _ => panic!("Expected MissingPreSeparatorField"),
        }
    }

    #[test]
    fn error_on_missing_post_separator_fields() {
        let line = "42 35 0:22 / /mnt rw - ext4";
        let err = parse_mount_info_line(line).unwrap_err();
        match err {
            ParseError::MissingPostSeparatorField { field, .. } => {
                assert_eq!(field.to_string(), "source");
            }
            _ => panic!("Expected MissingPostSeparatorField"),
        }
    }

    #[test]
    fn error_on_bad_major_minor() {
        let line = "42 35 sda / /mnt rw - ext4 /dev/sda1 rw";
        let err = parse_mount_info_line(line).unwrap_err();
        assert!(matches!(err, ParseError::InvalidMajorMinor { .. }));
    }

    #[test]
    fn error_on_empty_line() {
        let err = parse_mount_info_line("").unwrap_err();
        assert!(matches!(err, ParseError::MissingSeparator(_)));
    }
}
