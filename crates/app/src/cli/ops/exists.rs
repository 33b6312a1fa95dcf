use clap::Args;
use common::error::BlobError;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Exists {
    /// Backend name from the configuration file
    pub backend: String,

    /// Key (a trailing `/` checks for a folder)
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExistsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blob(#[from] BlobError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Exists {
    type Error = ExistsError;
    type Output = bool;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client(&self.backend).await?;
        Ok(client.exists(&self.key).await?)
    }
}
