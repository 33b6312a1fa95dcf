use clap::Args;
use common::error::BlobError;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// Backend name from the configuration file
    pub backend: String,

    /// Key to print
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blob(#[from] BlobError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cat {
    type Error = CatError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client(&self.backend).await?;
        let content = client.get(&self.key).await?;
        Ok(String::from_utf8_lossy(&content).into_owned())
    }
}
