//! Key <-> object path mapping.
//!
//! Object paths cannot end in a delimiter, so a folder key `a/b/` is
//! stored as the zero-length placeholder object `a/b/.folder`.

use common::error::{BlobError, Result};
use common::metadata::{is_folder_key, KEY_DELIMITER};
use object_store::path::Path as ObjectPath;

/// Final path segment of a folder placeholder object.
pub const FOLDER_MARKER: &str = ".folder";

/// Object path holding the content (or placeholder) for `key`.
pub(crate) fn object_path(key: &str) -> Result<ObjectPath> {
    if key.is_empty() || key.starts_with(KEY_DELIMITER) {
        return Err(BlobError::invalid(format!("invalid key: {:?}", key)));
    }
    let raw = if is_folder_key(key) {
        format!("{}{}", key, FOLDER_MARKER)
    } else {
        key.to_string()
    };
    ObjectPath::parse(&raw).map_err(|e| BlobError::invalid(format!("invalid key {}: {}", key, e)))
}

/// Path whose children are the objects inside folder `key`.
pub(crate) fn folder_path(key: &str) -> Result<ObjectPath> {
    let trimmed = key.trim_end_matches(KEY_DELIMITER);
    ObjectPath::parse(trimmed).map_err(|e| BlobError::invalid(format!("invalid key {}: {}", key, e)))
}

/// Key for a listed object path, and whether it is a folder placeholder.
pub(crate) fn key_for(location: &ObjectPath) -> (String, bool) {
    let raw = location.as_ref();
    match raw.strip_suffix(FOLDER_MARKER) {
        Some(folder) if folder.ends_with(KEY_DELIMITER) => (folder.to_string(), true),
        _ => (raw.to_string(), false),
    }
}

/// Listing scope for a string prefix: the directory part of the prefix,
///  since object store listings match whole path segments only.
pub(crate) fn listing_prefix(prefix: Option<&str>) -> Result<Option<ObjectPath>> {
    let Some(prefix) = prefix else {
        return Ok(None);
    };
    match prefix.rfind(KEY_DELIMITER) {
        Some(0) | None => Ok(None),
        Some(index) => folder_path(&prefix[..index]).map(Some),
    }
}
