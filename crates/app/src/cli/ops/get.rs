use std::path::PathBuf;

use clap::Args;
use common::cancel::cancellable;
use common::error::BlobError;
use common::io::{ExactChunks, DEFAULT_BUFFER_SIZE};
use tokio::io::AsyncWriteExt;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Backend name from the configuration file
    pub backend: String,

    /// Key to download
    pub key: String,

    /// Local file to write
    pub file: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blob(#[from] BlobError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client(&self.backend).await?;
        let mut data = client.get_stream(&self.key).await?;
        let content_length = data.content_length();

        let download = async {
            let mut file = tokio::fs::File::create(&self.file).await?;
            let mut chunks = ExactChunks::new(data.reader()?, content_length, DEFAULT_BUFFER_SIZE);
            while let Some(chunk) = chunks.next_chunk().await? {
                file.write_all(chunk).await?;
            }
            file.flush().await?;
            Ok::<_, BlobError>(())
        };
        let outcome = cancellable(&ctx.cancel, download).await;
        data.release();

        if let Err(e) = outcome {
            let _ = tokio::fs::remove_file(&self.file).await;
            return Err(e.into());
        }
        Ok(format!(
            "Wrote {} bytes to {}",
            content_length,
            self.file.display()
        ))
    }
}
