use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

use common::error::BlobError;
use common::prelude::{BlobClient, DiskClient, DiskSettings};
use object_store::{ObjectStoreClient, ObjectStoreSettings};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "blobport.toml";

/// One named backend in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Local directory tree
    Disk(DiskSettings),

    /// Process-local in-memory store (useful for dry runs)
    Memory {
        #[serde(default)]
        page_size: Option<usize>,
    },

    /// S3-compatible object storage
    S3 {
        endpoint: String,
        access_key: String,
        secret_key: String,
        bucket: String,
        region: Option<String>,
        #[serde(default)]
        page_size: Option<usize>,
    },
}

impl BackendConfig {
    /// Build a client for this backend.
    pub async fn connect(&self) -> Result<Arc<dyn BlobClient>, BlobError> {
        match self {
            Self::Disk(settings) => Ok(Arc::new(DiskClient::new(settings.clone()).await?)),
            Self::Memory { page_size } => {
                let client = ObjectStoreClient::new(ObjectStoreSettings::Memory).await?;
                Ok(Arc::new(with_page_size(client, *page_size)))
            }
            Self::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
                page_size,
            } => {
                let settings = ObjectStoreSettings::S3 {
                    endpoint: endpoint.clone(),
                    access_key: access_key.clone(),
                    secret_key: secret_key.clone(),
                    bucket: bucket.clone(),
                    region: region.clone(),
                };
                let client = ObjectStoreClient::new(settings).await?;
                Ok(Arc::new(with_page_size(client, *page_size)))
            }
        }
    }
}

fn with_page_size(client: ObjectStoreClient, page_size: Option<usize>) -> ObjectStoreClient {
    match page_size {
        Some(page_size) => client.with_page_size(page_size),
        None => client,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backends: BTreeMap<String, BackendConfig>,
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        Ok(config)
    }

    pub fn backend(&self, name: &str) -> Result<&BackendConfig, ConfigError> {
        self.backends
            .get(name)
            .ok_or_else(|| ConfigError::UnknownBackend(name.to_string()))
    }

    /// Connect to the backend called `name`.
    pub async fn connect(&self, name: &str) -> Result<Arc<dyn BlobClient>, ConfigError> {
        let backend = self.backend(name)?;
        tracing::debug!(backend = %name, "connecting");
        backend
            .connect()
            .await
            .map_err(|source| ConfigError::Connect {
                name: name.to_string(),
                source,
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    #[error("backend {name}: {source}")]
    Connect { name: String, source: BlobError },
}
