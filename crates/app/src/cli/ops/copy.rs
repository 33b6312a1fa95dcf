use clap::Args;
use common::copy::{BlobCopy, CopyStatistics};
use common::prelude::EnumerationFilter;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Copy {
    /// Source backend name
    pub from: String,

    /// Destination backend name
    pub to: String,

    /// Only copy keys starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Resume after this key (the last key of an earlier run)
    #[arg(long)]
    pub start_after: Option<String>,

    /// Print the statistics as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Failed(Box<CopyStatistics>),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Copy {
    fn filter(&self) -> EnumerationFilter {
        let mut filter = EnumerationFilter::new();
        if let Some(prefix) = &self.prefix {
            filter = filter.with_prefix(prefix);
        }
        if let Some(key) = &self.start_after {
            filter = filter.with_start_after(key);
        }
        filter
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Copy {
    type Error = CopyError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let source = ctx.client(&self.from).await?;
        let destination = ctx.client(&self.to).await?;

        let stats = BlobCopy::new(source, destination)
            .with_filter(self.filter())
            .with_cancellation(ctx.cancel.clone())
            .start()
            .await;

        if !stats.success {
            if let Some(last) = stats.keys.last() {
                tracing::warn!(last_key = %last, "resume with --start-after {}", last);
            }
            return Err(CopyError::Failed(Box::new(stats)));
        }
        if self.json {
            Ok(serde_json::to_string_pretty(&stats)?)
        } else {
            Ok(stats.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::Config;
    use crate::cli::op::{Op, OpContext};

    fn context(root: &std::path::Path) -> OpContext {
        let raw = format!(
            "[backends.src]\ntype = \"disk\"\nroot = {:?}\n\n[backends.dst]\ntype = \"disk\"\nroot = {:?}\n",
            root.join("src"),
            root.join("dst")
        );
        OpContext::new(Config::parse(&raw).unwrap())
    }

    fn copy(prefix: Option<&str>) -> Copy {
        Copy {
            from: "src".to_string(),
            to: "dst".to_string(),
            prefix: prefix.map(str::to_string),
            start_after: None,
            json: true,
        }
    }

    #[tokio::test]
    async fn test_copy_between_backends() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = context(temp.path());
        let source = ctx.client("src").await.unwrap();
        source.write_text("a/1", None, "one").await.unwrap();
        source.write_text("b/1", None, "two").await.unwrap();

        let output = copy(Some("a/")).execute(&ctx).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["keys"], serde_json::json!(["a/1"]));

        let destination = ctx.client("dst").await.unwrap();
        assert!(destination.exists("a/1").await.unwrap());
        assert!(!destination.exists("b/1").await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_copy_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = context(temp.path());
        ctx.client("src")
            .await
            .unwrap()
            .write_text("x", None, "x")
            .await
            .unwrap();
        ctx.cancel.cancel();

        let err = copy(None).execute(&ctx).await.unwrap_err();
        match err {
            CopyError::Failed(stats) => {
                assert!(!stats.success);
                assert!(matches!(stats.error, Some(common::error::BlobError::Cancelled)));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = context(temp.path());
        let op = Copy {
            to: "missing".to_string(),
            ..copy(None)
        };
        assert!(matches!(
            op.execute(&ctx).await,
            Err(CopyError::Config(ConfigError::UnknownBackend(_)))
        ));
    }
}
