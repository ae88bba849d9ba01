use crate::error::{Result, TmodError};
use std::path::{Path, PathBuf};

/// Extension marking entries stored in the raw RGBA dump format
pub const RAW_IMAGE_EXTENSION: &str = "rawimg";

/// Extension given to raw images after conversion
pub const IMAGE_EXTENSION: &str = "png";

/// Normalize an entry path to its canonical relative form
///
/// Both `/` and `\` separate segments. Empty and `.` segments are dropped and
/// `..` removes the previous segment. The result joins segments with `/`.
/// Absolute paths, drive prefixes, NUL bytes and `..` segments that would
/// climb above the package root are rejected.
pub fn normalize_entry_path(raw: &str) -> Result<String> {
    if raw.contains('\0') {
        return Err(TmodError::UnsafePath(format!("{:?} contains a NUL byte", raw)));
    }
    if raw.starts_with('/') || raw.starts_with('\\') {
        return Err(TmodError::UnsafePath(format!("{:?} is absolute", raw)));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(|c| c == '/' || c == '\\') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(TmodError::UnsafePath(format!(
                        "{:?} escapes the package root",
                        raw
                    )));
                }
            }
            s if s.contains(':') => {
                return Err(TmodError::UnsafePath(format!(
                    "{:?} has a drive or stream prefix",
                    raw
                )));
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(TmodError::UnsafePath(format!("{:?} names no file", raw)));
    }

    Ok(segments.join("/"))
}

/// Translate a normalized entry path into a native path below `root`
pub fn to_native_path(root: &Path, normalized: &str) -> PathBuf {
    normalized
        .split('/')
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Whether the entry holds a raw image dump
pub fn is_raw_image(normalized: &str) -> bool {
    Path::new(normalized)
        .extension()
        .is_some_and(|ext| ext == RAW_IMAGE_EXTENSION)
}

/// Entry path a converted raw image is saved under
pub fn image_output_path(normalized: &str) -> String {
    match normalized.strip_suffix(RAW_IMAGE_EXTENSION) {
        Some(stem) if stem.ends_with('.') => format!("{}{}", stem, IMAGE_EXTENSION),
        _ => format!("{}.{}", normalized, IMAGE_EXTENSION),
    }
}
