//! Reference backend storing one file per key under a root directory.
//!
//! Keys map to relative paths (`a/b.txt` -> `<root>/a/b.txt`). Folder
//! markers (`a/`) are plain directories. Enumeration lists files only,
//! lazily and in byte order of their keys.

mod keys;
mod settings;
mod walk;

use std::fs::Metadata;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::client::{BlobClient, PageStream};
use crate::data::BlobData;
use crate::error::{BlobError, Result};
use crate::filter::{EnumerationFilter, EnumerationPage};
use crate::io::ExactChunks;
use crate::metadata::{is_folder_key, BlobMetadata, KEY_DELIMITER};

pub use settings::{DiskSettings, DEFAULT_PAGE_SIZE};

/// Blob client over a local directory tree.
#[derive(Debug, Clone)]
pub struct DiskClient {
    settings: DiskSettings,
}

impl DiskClient {
    /// Validate the settings and make sure the root directory exists.
    pub async fn new(settings: DiskSettings) -> Result<Self> {
        settings.validate()?;
        tokio::fs::create_dir_all(&settings.root).await?;
        debug!(root = ?settings.root, "disk client ready");
        Ok(Self { settings })
    }

    pub fn root(&self) -> &Path {
        &self.settings.root
    }

    pub fn settings(&self) -> &DiskSettings {
        &self.settings
    }

    /// Filesystem metadata for `key`, `None` if nothing is there. A folder
    ///  key only resolves to a directory.
    async fn stat(&self, key: &str) -> Result<Option<(PathBuf, Metadata)>> {
        let path = keys::key_to_path(self.root(), key)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if is_folder_key(key) && !metadata.is_dir() => Ok(None),
            Ok(metadata) => Ok(Some((path, metadata))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn require(&self, key: &str) -> Result<(PathBuf, Metadata)> {
        self.stat(key)
            .await?
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn write_folder(&self, key: &str, content_length: u64) -> Result<()> {
        if content_length != 0 {
            return Err(BlobError::invalid(format!(
                "folder key {} cannot carry {} bytes",
                key, content_length
            )));
        }
        let path = keys::key_to_path(self.root(), key)?;
        tokio::fs::create_dir_all(&path).await?;
        info!(key = %key, "folder created");
        Ok(())
    }

    async fn write_file(
        &self,
        path: &Path,
        content_length: u64,
        data: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        let partial = PartialFile::new(path);
        let mut chunks = ExactChunks::new(data, content_length, self.settings.buffer_size);
        while let Some(chunk) = chunks.next_chunk().await? {
            file.write_all(chunk).await?;
        }
        file.flush().await?;
        partial.commit();
        Ok(())
    }

    /// Where a listing has to start: the prefix itself when it names a
    ///  directory, otherwise the deepest directory the prefix lies in.
    ///  A prefix that is not a valid key (`docs/.`) is still a valid string
    ///  prefix; the walk just starts higher up.
    async fn listing_start(&self, prefix: Option<&str>) -> PathBuf {
        let mut candidate = prefix;
        while let Some(dir) = candidate {
            if let Ok(path) = keys::key_to_path(self.root(), dir) {
                if is_dir(&path).await {
                    return path;
                }
            }
            let parent = dir.strip_suffix(KEY_DELIMITER).unwrap_or(dir);
            candidate = parent.rfind(KEY_DELIMITER).map(|index| &dir[..=index]);
        }
        self.root().to_path_buf()
    }
}

/// Removes a file that is still being written when dropped, so neither a
///  failed nor an abandoned (cancelled) write leaves a truncated object.
struct PartialFile {
    path: Option<PathBuf>,
}

impl PartialFile {
    fn new(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
        }
    }

    fn commit(mut self) {
        self.path = None;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = ?path, "removed partial file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?path, error = %e, "failed to remove partial file"),
        }
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

fn to_utc(time: std::io::Result<std::time::SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

fn guess_content_type(key: &str) -> Option<String> {
    mime_guess::from_path(key).first().map(|m| m.to_string())
}

fn file_metadata(key: String, metadata: &Metadata) -> Result<BlobMetadata> {
    let content_type = guess_content_type(&key);
    Ok(BlobMetadata::new(key, metadata.len())?
        .with_content_type(content_type)
        .with_timestamps(
            to_utc(metadata.created()),
            to_utc(metadata.modified()),
            to_utc(metadata.accessed()),
        ))
}

fn folder_metadata(key: &str, metadata: &Metadata) -> Result<BlobMetadata> {
    Ok(BlobMetadata::folder(key)?.with_timestamps(
        to_utc(metadata.created()),
        to_utc(metadata.modified()),
        to_utc(metadata.accessed()),
    ))
}

#[async_trait]
impl BlobClient for DiskClient {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.stat(key).await?.is_some())
    }

    async fn get_metadata(&self, key: &str) -> Result<BlobMetadata> {
        let (_, metadata) = self.require(key).await?;
        if metadata.is_dir() {
            folder_metadata(key, &metadata)
        } else {
            file_metadata(key.to_string(), &metadata)
        }
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let (path, metadata) = self.require(key).await?;
        if metadata.is_dir() {
            return Ok(Bytes::new());
        }
        Ok(Bytes::from(tokio::fs::read(&path).await?))
    }

    async fn get_stream(&self, key: &str) -> Result<BlobData> {
        let (path, metadata) = self.require(key).await?;
        if metadata.is_dir() {
            return Ok(BlobData::empty());
        }
        let file = tokio::fs::File::open(&path).await?;
        Ok(BlobData::new(metadata.len(), file).with_content_type(guess_content_type(key)))
    }

    async fn write(&self, key: &str, content_type: Option<&str>, data: Bytes) -> Result<()> {
        let content_length = data.len() as u64;
        self.write_stream(key, content_type, content_length, &mut Cursor::new(data))
            .await
    }

    async fn write_stream(
        &self,
        key: &str,
        content_type: Option<&str>,
        content_length: u64,
        data: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()> {
        if is_folder_key(key) {
            return self.write_folder(key, content_length).await;
        }

        let path = keys::key_to_path(self.root(), key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.write_file(&path, content_length, data).await?;

        info!(key = %key, content_type = ?content_type, content_length, "blob written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let (path, metadata) = self.require(key).await?;
        if metadata.is_dir() {
            // Only empty folders; objects below must be deleted first.
            tokio::fs::remove_dir(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        info!(key = %key, "blob deleted");
        Ok(())
    }

    fn generate_url(&self, key: &str) -> String {
        keys::locate(self.root(), key).display().to_string()
    }

    fn enumerate_pages(&self, filter: EnumerationFilter) -> Result<PageStream<'_>> {
        filter.validate()?;
        let page_size = self.settings.page_size;

        let stream = try_stream! {
            let prefix = filter.prefix().map(str::to_string);
            let start = self.listing_start(prefix.as_deref()).await;
            debug!(start = ?start, prefix = ?prefix, "enumerating disk");

            let files = walk::files(start);
            futures::pin_mut!(files);

            let mut items = Vec::new();
            while let Some(entry) = files.next().await {
                let (path, metadata) = entry?;
                let Some(key) = keys::path_to_key(self.root(), &path) else {
                    continue;
                };
                if let Some(prefix) = prefix.as_deref() {
                    if !key.starts_with(prefix) {
                        continue;
                    }
                }
                let metadata = file_metadata(key, &metadata)?;
                if !filter.matches(&metadata) {
                    continue;
                }
                items.push(metadata);
                if items.len() == page_size {
                    let continuation_token = items.last().map(|m| m.key.clone());
                    yield EnumerationPage {
                        items: std::mem::take(&mut items),
                        continuation_token,
                    };
                }
            }
            yield EnumerationPage {
                items,
                continuation_token: None,
            };
        };
        Ok(Box::pin(stream))
    }
}
