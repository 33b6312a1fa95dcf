use clap::Args;
use common::cancel::cancellable;
use common::error::BlobError;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Empty {
    /// Backend name from the configuration file
    pub backend: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EmptyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blob(#[from] BlobError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Empty {
    type Error = EmptyError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client(&self.backend).await?;
        let deleted = cancellable(&ctx.cancel, client.empty()).await?;
        Ok(format!("Deleted {} blobs from {}", deleted.len(), self.backend))
    }
}
