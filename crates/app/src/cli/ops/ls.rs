use clap::Args;
use common::cancel::cancellable;
use common::error::BlobError;
use common::prelude::{BlobMetadata, EnumerationFilter};
use futures::TryStreamExt;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Backend name from the configuration file
    pub backend: String,

    /// Only list keys starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Only list keys ending with this suffix
    #[arg(long)]
    pub suffix: Option<String>,

    /// Minimum size in bytes (inclusive)
    #[arg(long)]
    pub min_size: Option<u64>,

    /// Maximum size in bytes (inclusive)
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Resume after this key
    #[arg(long)]
    pub start_after: Option<String>,

    /// Print one JSON record per line
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Ls {
    pub fn filter(&self) -> Result<EnumerationFilter, BlobError> {
        let mut filter = EnumerationFilter::new().with_size_range(
            self.min_size.unwrap_or(0),
            self.max_size.unwrap_or(u64::MAX),
        )?;
        if let Some(prefix) = &self.prefix {
            filter = filter.with_prefix(prefix);
        }
        if let Some(suffix) = &self.suffix {
            filter = filter.with_suffix(suffix);
        }
        if let Some(key) = &self.start_after {
            filter = filter.with_start_after(key);
        }
        Ok(filter)
    }
}

fn format_line(metadata: &BlobMetadata) -> String {
    let kind = if metadata.is_folder { "  [dir]" } else { "" };
    format!("{:>12}  {}{}", metadata.content_length, metadata.key, kind)
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let filter = self.filter()?;
        let client = ctx.client(&self.backend).await?;

        let items: Vec<BlobMetadata> =
            cancellable(&ctx.cancel, client.enumerate(filter)?.try_collect()).await?;

        if items.is_empty() {
            return Ok("No blobs found".to_string());
        }
        let lines = if self.json {
            items
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            items.iter().map(format_line).collect()
        };
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ls() -> Ls {
        Ls {
            backend: "local".to_string(),
            prefix: None,
            suffix: None,
            min_size: None,
            max_size: None,
            start_after: None,
            json: false,
        }
    }

    #[test]
    fn test_filter_from_flags() {
        let filter = Ls {
            prefix: Some("a/".to_string()),
            min_size: Some(10),
            ..ls()
        }
        .filter()
        .unwrap();
        assert_eq!(filter.prefix(), Some("a/"));
        assert_eq!(filter.minimum_size, 10);
        assert_eq!(filter.maximum_size, u64::MAX);
    }

    #[test]
    fn test_inverted_sizes_rejected() {
        let err = Ls {
            min_size: Some(20),
            max_size: Some(10),
            ..ls()
        }
        .filter()
        .unwrap_err();
        assert!(matches!(err, BlobError::InvalidArgument(_)));
    }

    #[test]
    fn test_format_line() {
        let file = BlobMetadata::new("a/b.txt", 42).unwrap();
        assert_eq!(format_line(&file), "          42  a/b.txt");
        let folder = BlobMetadata::folder("a").unwrap();
        assert_eq!(format_line(&folder), "           0  a/  [dir]");
    }
}
