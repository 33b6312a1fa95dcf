use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{BlobError, Result};
use crate::io::DEFAULT_BUFFER_SIZE;

/// Default number of items per enumeration page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Settings for the disk backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSettings {
    /// Root directory, created if missing
    pub root: PathBuf,
    /// Chunk size for streamed writes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Items per enumeration page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl DiskSettings {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            buffer_size: default_buffer_size(),
            page_size: default_page_size(),
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(BlobError::invalid("disk root must not be empty"));
        }
        if self.buffer_size == 0 {
            return Err(BlobError::invalid("buffer size must be positive"));
        }
        if self.page_size == 0 {
            return Err(BlobError::invalid("page size must be positive"));
        }
        Ok(())
    }
}
