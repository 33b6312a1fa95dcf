use std::path::PathBuf;

use clap::Args;
use common::cancel::cancellable;
use common::error::BlobError;

use crate::cli::config::ConfigError;

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Backend name from the configuration file
    pub backend: String,

    /// Destination key (a trailing `/` with `--text ""` creates a folder)
    pub key: String,

    /// Upload the contents of a local file
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Upload a literal UTF-8 string
    #[arg(long)]
    pub text: Option<String>,

    /// Content type, guessed from the file name when omitted
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("either --file or --text must be provided")]
    NoSource,
}

impl Put {
    fn content_type(&self) -> Option<String> {
        self.content_type.clone().or_else(|| {
            self.file
                .as_ref()
                .and_then(|path| mime_guess::from_path(path).first())
                .map(|mime| mime.to_string())
        })
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Put {
    type Error = PutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = ctx.client(&self.backend).await?;
        let content_type = self.content_type();

        let written = match (&self.file, &self.text) {
            (Some(path), _) => {
                let upload = async {
                    let mut file = tokio::fs::File::open(path).await?;
                    let content_length = file.metadata().await?.len();
                    client
                        .write_stream(&self.key, content_type.as_deref(), content_length, &mut file)
                        .await?;
                    Ok::<_, BlobError>(content_length)
                };
                cancellable(&ctx.cancel, upload).await?
            }
            (None, Some(text)) => {
                client
                    .write_text(&self.key, content_type.as_deref(), text)
                    .await?;
                text.len() as u64
            }
            (None, None) => return Err(PutError::NoSource),
        };
        Ok(format!("Wrote {} bytes to {}", written, self.key))
    }
}
