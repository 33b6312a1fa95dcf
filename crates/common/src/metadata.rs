use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BlobError, Result};

/// Path separator used by hierarchical keys.
pub const KEY_DELIMITER: char = '/';

/// Whether a key names a folder marker rather than a content object.
pub fn is_folder_key(key: &str) -> bool {
    key.ends_with(KEY_DELIMITER)
}

/// Identity and descriptive record for one stored object.
///
/// Produced by metadata, read and enumeration operations and never
/// mutated afterwards. Timestamps are only present when the backend
/// can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub key: String,
    pub content_type: Option<String>,
    pub content_length: u64,
    /// Backend assigned content fingerprint
    pub etag: Option<String>,
    pub created_utc: Option<DateTime<Utc>>,
    pub last_update_utc: Option<DateTime<Utc>>,
    pub last_access_utc: Option<DateTime<Utc>>,
    pub is_folder: bool,
}

impl BlobMetadata {
    /// Create a record for a content object. Fails for an empty key.
    pub fn new(key: impl Into<String>, content_length: u64) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(BlobError::invalid("key must not be empty"));
        }
        Ok(Self {
            key,
            content_type: None,
            content_length,
            etag: None,
            created_utc: None,
            last_update_utc: None,
            last_access_utc: None,
            is_folder: false,
        })
    }

    /// Create a zero-length folder marker record. The key gets a
    ///  trailing separator if it lacks one.
    pub fn folder(key: impl Into<String>) -> Result<Self> {
        let mut key = key.into();
        if !is_folder_key(&key) {
            key.push(KEY_DELIMITER);
        }
        if key.len() == 1 {
            return Err(BlobError::invalid("folder key must name a folder"));
        }
        let mut metadata = Self::new(key, 0)?;
        metadata.is_folder = true;
        Ok(metadata)
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_etag(mut self, etag: Option<String>) -> Self {
        self.etag = etag;
        self
    }

    pub fn with_timestamps(
        mut self,
        created: Option<DateTime<Utc>>,
        last_update: Option<DateTime<Utc>>,
        last_access: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_utc = created;
        self.last_update_utc = last_update;
        self.last_access_utc = last_access;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        let err = BlobMetadata::new("", 3).unwrap_err();
        assert!(matches!(err, BlobError::InvalidArgument(_)));
    }

    #[test]
    fn test_folder_record() {
        let folder = BlobMetadata::folder("photos").unwrap();
        assert_eq!(folder.key, "photos/");
        assert!(folder.is_folder);
        assert_eq!(folder.content_length, 0);

        assert!(BlobMetadata::folder("/").is_err());
    }

    #[test]
    fn test_serializes_to_json() {
        let metadata = BlobMetadata::new("a/b.txt", 5)
            .unwrap()
            .with_content_type(Some("text/plain".to_string()));
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["key"], "a/b.txt");
        assert_eq!(json["content_length"], 5);
        assert_eq!(json["is_folder"], false);
    }
}
