use clap::Args;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Url {
    /// Backend name from the configuration file
    pub backend: String,

    /// Key to locate
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Url {
    type Error = UrlError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client(&self.backend).await?;
        Ok(client.generate_url(&self.key))
    }
}
