use clap::Args;
use common::error::BlobError;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Backend name from the configuration file
    pub backend: String,

    /// Key to delete (a trailing `/` deletes a folder marker)
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blob(#[from] BlobError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client(&self.backend).await?;
        client.delete(&self.key).await?;
        Ok(format!("Deleted {}", self.key))
    }
}
