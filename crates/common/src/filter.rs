//! Enumeration queries and the page type every backend yields.

use serde::{Deserialize, Serialize};

use crate::error::{BlobError, Result};
use crate::metadata::BlobMetadata;

/// Query parameters for listing a backend.
///
/// An empty filter matches every object. Size bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumerationFilter {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub minimum_size: u64,
    pub maximum_size: u64,
    /// Resume an enumeration after this key (exclusive)
    pub start_after: Option<String>,
}

impl Default for EnumerationFilter {
    fn default() -> Self {
        Self {
            prefix: None,
            suffix: None,
            minimum_size: 0,
            maximum_size: u64::MAX,
            start_after: None,
        }
    }
}

impl EnumerationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_start_after(mut self, key: impl Into<String>) -> Self {
        self.start_after = Some(key.into());
        self
    }

    /// Set both size bounds. Fails when `minimum > maximum`.
    pub fn with_size_range(mut self, minimum: u64, maximum: u64) -> Result<Self> {
        self.minimum_size = minimum;
        self.maximum_size = maximum;
        self.validate()?;
        Ok(self)
    }

    /// Check the filter invariants. Backends call this before listing,
    ///  so a filter built field by field is rejected the same way.
    pub fn validate(&self) -> Result<()> {
        if self.minimum_size > self.maximum_size {
            return Err(BlobError::invalid(format!(
                "minimum size {} exceeds maximum size {}",
                self.minimum_size, self.maximum_size
            )));
        }
        Ok(())
    }

    /// The listing prefix, treating an empty string as no prefix.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// Post-filter applied uniformly by every backend: size lower bound,
    ///  size upper bound, suffix, then the resume position.
    pub fn matches(&self, metadata: &BlobMetadata) -> bool {
        let above_min = metadata.content_length >= self.minimum_size;
        let below_max = metadata.content_length <= self.maximum_size;
        let suffix = match self.suffix.as_deref() {
            Some(suffix) => metadata.key.ends_with(suffix),
            None => true,
        };
        let resumed = match self.start_after.as_deref() {
            Some(after) => metadata.key.as_str() > after,
            None => true,
        };
        above_min && below_max && suffix && resumed
    }
}

/// One page of an enumeration, as fetched from the backend.
#[derive(Debug, Clone, Default)]
pub struct EnumerationPage {
    /// Items on this page that passed the filter
    pub items: Vec<BlobMetadata>,
    /// Token to present for the next page, `None` on the last page
    pub continuation_token: Option<String>,
}
