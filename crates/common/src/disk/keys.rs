//! Mapping between keys and paths under the disk root.

use std::path::{Component, Path, PathBuf};

use crate::error::{BlobError, Result};
use crate::metadata::KEY_DELIMITER;

/// Resolve `key` to a path under `root`.
///
/// Rejects keys that could escape the root: absolute keys, `.`/`..`
/// segments, empty segments and backslashes. A trailing `/` (folder
/// marker) is allowed.
pub(crate) fn key_to_path(root: &Path, key: &str) -> Result<PathBuf> {
    if key.is_empty() {
        return Err(BlobError::invalid("key must not be empty"));
    }
    if key.starts_with(KEY_DELIMITER) {
        return Err(BlobError::invalid(format!("key must be relative: {}", key)));
    }
    if key.contains('\\') {
        return Err(BlobError::invalid(format!("key must not contain '\\': {}", key)));
    }

    let trimmed = key.strip_suffix(KEY_DELIMITER).unwrap_or(key);
    let mut path = root.to_path_buf();
    for segment in trimmed.split(KEY_DELIMITER) {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(BlobError::invalid(format!("invalid key segment in {}", key)));
        }
        path.push(segment);
    }
    Ok(path)
}

/// Key of a path under `root`, with separators normalised to `/`.
///
/// `None` for paths outside the root or with non UTF-8 names.
pub(crate) fn path_to_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_str()?),
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Pure key to path join used by `generate_url`; performs no validation.
pub(crate) fn locate(root: &Path, key: &str) -> PathBuf {
    key.split(KEY_DELIMITER)
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
