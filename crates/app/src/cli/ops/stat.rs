use clap::Args;
use common::error::BlobError;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Stat {
    /// Backend name from the configuration file
    pub backend: String,

    /// Key to describe
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StatError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Stat {
    type Error = StatError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client(&self.backend).await?;
        let metadata = client.get_metadata(&self.key).await?;
        Ok(serde_json::to_string_pretty(&metadata)?)
    }
}
