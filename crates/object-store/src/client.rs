//! `BlobClient` over an `object_store::ObjectStore`.

use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use common::client::{BlobClient, PageStream};
use common::data::BlobData;
use common::disk::DEFAULT_PAGE_SIZE;
use common::error::{BlobError, Result};
use common::filter::{EnumerationFilter, EnumerationPage};
use common::io::{ExactChunks, DEFAULT_BUFFER_SIZE};
use common::metadata::{is_folder_key, BlobMetadata};
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectMeta, ObjectStore, PutMultipartOpts,
    PutOptions, PutPayload, WriteMultipart,
};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use crate::keys;
use crate::settings::ObjectStoreSettings;

/// Number of multipart chunks allowed in flight during a streamed upload.
const UPLOAD_CONCURRENCY: usize = 4;

/// Blob client backed by object storage.
#[derive(Debug, Clone)]
pub struct ObjectStoreClient {
    inner: Arc<dyn ObjectStore>,
    settings: ObjectStoreSettings,
    buffer_size: usize,
    page_size: usize,
}

/// Translate an object store error for `key`. Not-found and invalid paths
///  map onto the shared taxonomy; everything else is passed through.
fn map_err(key: &str, err: object_store::Error) -> BlobError {
    match err {
        object_store::Error::NotFound { .. } => BlobError::NotFound(key.to_string()),
        object_store::Error::InvalidPath { source } => {
            BlobError::invalid(format!("invalid key {}: {}", key, source))
        }
        other => BlobError::backend(other),
    }
}

fn content_type_attributes(content_type: Option<&str>) -> Attributes {
    let mut attributes = Attributes::new();
    if let Some(content_type) = content_type {
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
    }
    attributes
}

fn content_type_of(attributes: &Attributes) -> Option<String> {
    attributes
        .get(&Attribute::ContentType)
        .map(|value| <AttributeValue as AsRef<str>>::as_ref(value).to_string())
}

/// Metadata for a listed or fetched object.
fn to_metadata(meta: &ObjectMeta, content_type: Option<String>) -> Result<BlobMetadata> {
    let (key, is_folder) = keys::key_for(&meta.location);
    if is_folder {
        return Ok(BlobMetadata::folder(key)?.with_timestamps(None, Some(meta.last_modified), None));
    }
    Ok(BlobMetadata::new(key, meta.size as u64)?
        .with_content_type(content_type)
        .with_etag(meta.e_tag.clone())
        .with_timestamps(None, Some(meta.last_modified), None))
}

impl ObjectStoreClient {
    /// Connect using `settings`, failing on invalid settings or a missing bucket.
    pub async fn new(settings: ObjectStoreSettings) -> Result<Self> {
        let inner = settings.connect().await?;
        debug!(settings = ?settings, "object store client ready");
        Ok(Self {
            inner,
            settings,
            buffer_size: DEFAULT_BUFFER_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Fresh in-memory store.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(object_store::memory::InMemory::new()),
            settings: ObjectStoreSettings::Memory,
            buffer_size: DEFAULT_BUFFER_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Chunk size for streamed writes; larger payloads go through multipart upload.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Maximum items per listing request.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn settings(&self) -> &ObjectStoreSettings {
        &self.settings
    }

    async fn head(&self, key: &str, path: &ObjectPath) -> Result<Option<(ObjectMeta, Attributes)>> {
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        match self.inner.get_opts(path, options).await {
            Ok(result) => Ok(Some((result.meta, result.attributes))),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(map_err(key, e)),
        }
    }

    /// A folder exists if its placeholder does, or if any object lives below it.
    async fn folder_exists(&self, key: &str) -> Result<bool> {
        let marker = keys::object_path(key)?;
        if self.head(key, &marker).await?.is_some() {
            return Ok(true);
        }
        let scope = keys::folder_path(key)?;
        let mut listing = self.inner.list(Some(&scope));
        match listing.try_next().await {
            Ok(found) => Ok(found.is_some()),
            Err(e) => Err(map_err(key, e)),
        }
    }

    async fn put_marker(&self, key: &str, content_length: u64) -> Result<()> {
        if content_length != 0 {
            return Err(BlobError::invalid(format!(
                "folder key {} cannot carry {} bytes",
                key, content_length
            )));
        }
        let path = keys::object_path(key)?;
        self.inner
            .put(&path, PutPayload::new())
            .await
            .map_err(|e| map_err(key, e))?;
        info!(key = %key, "folder placeholder created");
        Ok(())
    }

    async fn put_multipart(
        &self,
        key: &str,
        path: &ObjectPath,
        content_type: Option<&str>,
        content_length: u64,
        data: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()> {
        let options = PutMultipartOpts {
            attributes: content_type_attributes(content_type),
            ..Default::default()
        };
        let upload = self
            .inner
            .put_multipart_opts(path, options)
            .await
            .map_err(|e| map_err(key, e))?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, self.buffer_size);

        let mut chunks = ExactChunks::new(data, content_length, self.buffer_size);
        loop {
            let chunk = match chunks.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    if let Err(abort) = writer.abort().await {
                        warn!(key = %key, error = %abort, "failed to abort multipart upload");
                    }
                    return Err(e);
                }
            };
            if let Err(e) = writer.wait_for_capacity(UPLOAD_CONCURRENCY).await {
                return Err(map_err(key, e));
            }
            writer.write(chunk);
        }
        writer.finish().await.map_err(|e| map_err(key, e))?;
        Ok(())
    }
}

#[async_trait]
impl BlobClient for ObjectStoreClient {
    async fn exists(&self, key: &str) -> Result<bool> {
        if is_folder_key(key) {
            return self.folder_exists(key).await;
        }
        let path = keys::object_path(key)?;
        Ok(self.head(key, &path).await?.is_some())
    }

    async fn get_metadata(&self, key: &str) -> Result<BlobMetadata> {
        let path = keys::object_path(key)?;
        if is_folder_key(key) {
            if let Some((meta, _)) = self.head(key, &path).await? {
                return to_metadata(&meta, None);
            }
            if self.folder_exists(key).await? {
                return BlobMetadata::folder(key);
            }
            return Err(BlobError::NotFound(key.to_string()));
        }
        match self.head(key, &path).await? {
            Some((meta, attributes)) => to_metadata(&meta, content_type_of(&attributes)),
            None => Err(BlobError::NotFound(key.to_string())),
        }
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        if is_folder_key(key) {
            return if self.folder_exists(key).await? {
                Ok(Bytes::new())
            } else {
                Err(BlobError::NotFound(key.to_string()))
            };
        }
        let path = keys::object_path(key)?;
        let result = self.inner.get(&path).await.map_err(|e| map_err(key, e))?;
        result.bytes().await.map_err(|e| map_err(key, e))
    }

    async fn get_stream(&self, key: &str) -> Result<BlobData> {
        if is_folder_key(key) {
            return if self.folder_exists(key).await? {
                Ok(BlobData::empty())
            } else {
                Err(BlobError::NotFound(key.to_string()))
            };
        }
        let path = keys::object_path(key)?;
        let result = self.inner.get(&path).await.map_err(|e| map_err(key, e))?;
        let content_length = result.meta.size as u64;
        let content_type = content_type_of(&result.attributes);
        let stream = result.into_stream().map_err(std::io::Error::other);
        Ok(BlobData::new(content_length, StreamReader::new(stream)).with_content_type(content_type))
    }

    async fn write(&self, key: &str, content_type: Option<&str>, data: Bytes) -> Result<()> {
        if is_folder_key(key) {
            return self.put_marker(key, data.len() as u64).await;
        }
        let path = keys::object_path(key)?;
        let content_length = data.len();
        let options = PutOptions {
            attributes: content_type_attributes(content_type),
            ..Default::default()
        };
        self.inner
            .put_opts(&path, PutPayload::from(data), options)
            .await
            .map_err(|e| map_err(key, e))?;
        info!(key = %key, content_type = ?content_type, content_length, "blob written");
        Ok(())
    }

    async fn write_stream(
        &self,
        key: &str,
        content_type: Option<&str>,
        content_length: u64,
        data: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()> {
        if is_folder_key(key) {
            return self.put_marker(key, content_length).await;
        }

        // Small payloads go up in a single request.
        if content_length <= self.buffer_size as u64 {
            let mut buffer = Vec::with_capacity(content_length as usize);
            let mut chunks = ExactChunks::new(data, content_length, self.buffer_size);
            while let Some(chunk) = chunks.next_chunk().await? {
                buffer.extend_from_slice(chunk);
            }
            return self.write(key, content_type, Bytes::from(buffer)).await;
        }

        let path = keys::object_path(key)?;
        self.put_multipart(key, &path, content_type, content_length, data)
            .await?;
        info!(key = %key, content_type = ?content_type, content_length, "blob uploaded");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = keys::object_path(key)?;
        if self.head(key, &path).await?.is_none() {
            // An implicit folder has no placeholder to remove.
            if is_folder_key(key) && self.folder_exists(key).await? {
                debug!(key = %key, "implicit folder, nothing to delete");
                return Ok(());
            }
            return Err(BlobError::NotFound(key.to_string()));
        }
        self.inner
            .delete(&path)
            .await
            .map_err(|e| map_err(key, e))?;
        info!(key = %key, "blob deleted");
        Ok(())
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.settings.url_base(), key)
    }

    fn enumerate_pages(&self, filter: EnumerationFilter) -> Result<PageStream<'_>> {
        filter.validate()?;
        let scope = keys::listing_prefix(filter.prefix())?;
        let page_size = self.page_size;
        let store = self.inner.clone();

        let stream = try_stream! {
            let prefix = filter.prefix().map(str::to_string);
            let mut offset = match filter.start_after.as_deref() {
                Some(after) => Some(ObjectPath::parse(after).map_err(|e| {
                    BlobError::invalid(format!("invalid start_after {}: {}", after, e))
                })?),
                None => None,
            };

            loop {
                let listing = match &offset {
                    Some(offset) => store.list_with_offset(scope.as_ref(), offset),
                    None => store.list(scope.as_ref()),
                };
                let mut listing = listing.take(page_size);

                let mut items = Vec::new();
                let mut fetched = 0usize;
                let mut last = None;
                while let Some(meta) = listing.next().await {
                    let meta = meta.map_err(|e| map_err(prefix.as_deref().unwrap_or(""), e))?;
                    fetched += 1;
                    let metadata = to_metadata(&meta, None)?;
                    last = Some(meta.location);
                    if let Some(prefix) = prefix.as_deref() {
                        if !metadata.key.starts_with(prefix) {
                            continue;
                        }
                    }
                    if filter.matches(&metadata) {
                        items.push(metadata);
                    }
                }
                drop(listing);

                let more = fetched == page_size;
                let continuation_token = if more {
                    last.as_ref().map(|path| path.to_string())
                } else {
                    None
                };
                debug!(items = items.len(), fetched, more, "object store page listed");
                yield EnumerationPage {
                    items,
                    continuation_token,
                };
                if !more {
                    break;
                }
                offset = last;
            }
        };
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    async fn keys(client: &ObjectStoreClient, filter: EnumerationFilter) -> Vec<String> {
        client
            .enumerate(filter)
            .unwrap()
            .map_ok(|m| m.key)
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_and_metadata() {
        let client = ObjectStoreClient::memory();
        client
            .write_text("docs/a.txt", Some("text/plain"), "hello")
            .await
            .unwrap();

        assert!(client.exists("docs/a.txt").await.unwrap());
        assert_eq!(client.get("docs/a.txt").await.unwrap(), Bytes::from_static(b"hello"));

        let metadata = client.get_metadata("docs/a.txt").await.unwrap();
        assert_eq!(metadata.content_length, 5);
        assert_eq!(metadata.content_type.as_deref(), Some("text/plain"));
        assert!(metadata.etag.is_some());
        assert!(metadata.last_update_utc.is_some());
    }

    #[tokio::test]
    async fn test_stream_carries_content_type() {
        let client = ObjectStoreClient::memory();
        client
            .write_text("page.html", Some("text/html"), "<p>hi</p>")
            .await
            .unwrap();
        client.write_text("plain", None, "x").await.unwrap();

        let data = client.get_stream("page.html").await.unwrap();
        assert_eq!(data.content_type(), Some("text/html"));
        let data = client.get_stream("plain").await.unwrap();
        assert_eq!(data.content_type(), None);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = ObjectStoreClient::memory();
        assert!(!client.exists("nope").await.unwrap());
        assert!(client.get("nope").await.unwrap_err().is_not_found());
        assert!(client.get_stream("nope").await.unwrap_err().is_not_found());
        assert!(client.delete("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_multipart_stream() {
        let client = ObjectStoreClient::memory().with_buffer_size(4);
        let content = b"larger than one chunk".to_vec();
        client
            .write_stream(
                "big.bin",
                None,
                content.len() as u64,
                &mut Cursor::new(content.clone()),
            )
            .await
            .unwrap();

        let data = client.get_stream("big.bin").await.unwrap();
        assert_eq!(data.content_length(), content.len() as u64);
        assert_eq!(data.into_bytes().await.unwrap(), Bytes::from(content));
    }

    #[tokio::test]
    async fn test_short_stream_rejected() {
        let client = ObjectStoreClient::memory().with_buffer_size(4);
        let err = client
            .write_stream("short.bin", None, 50, &mut Cursor::new(b"tiny".to_vec()))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(!client.exists("short.bin").await.unwrap());
    }

    #[tokio::test]
    async fn test_folder_markers() {
        let client = ObjectStoreClient::memory();
        client.write("empty/", None, Bytes::new()).await.unwrap();

        assert!(client.exists("empty/").await.unwrap());
        assert!(client.get("empty/").await.unwrap().is_empty());
        assert!(client.get_metadata("empty/").await.unwrap().is_folder);

        let listed = keys(&client, EnumerationFilter::default()).await;
        assert_eq!(listed, vec!["empty/"]);

        client.delete("empty/").await.unwrap();
        assert!(!client.exists("empty/").await.unwrap());
    }

    #[tokio::test]
    async fn test_implicit_folder() {
        let client = ObjectStoreClient::memory();
        client.write_text("dir/file", None, "x").await.unwrap();
        assert!(client.exists("dir/").await.unwrap());
        assert!(client.get_metadata("dir/").await.unwrap().is_folder);
        assert!(!client.exists("other/").await.unwrap());
    }

    #[tokio::test]
    async fn test_enumerate_filters() {
        let client = ObjectStoreClient::memory();
        for (key, size) in [("a/1", 9usize), ("a/2", 10), ("a/3", 20), ("a/4", 21), ("b/1", 15)] {
            client
                .write_text(key, None, &"x".repeat(size))
                .await
                .unwrap();
        }

        assert_eq!(
            keys(&client, EnumerationFilter::new().with_prefix("a/")).await,
            vec!["a/1", "a/2", "a/3", "a/4"]
        );
        let sized = EnumerationFilter::new().with_size_range(10, 20).unwrap();
        assert_eq!(keys(&client, sized).await, vec!["a/2", "a/3", "b/1"]);
        assert_eq!(
            keys(&client, EnumerationFilter::new().with_suffix("/1")).await,
            vec!["a/1", "b/1"]
        );
    }

    #[tokio::test]
    async fn test_string_prefix_within_segment() {
        let client = ObjectStoreClient::memory();
        for key in ["logs/2023-12", "logs/2024-01", "logs/2024-02", "logsx"] {
            client.write_text(key, None, "x").await.unwrap();
        }
        assert_eq!(
            keys(&client, EnumerationFilter::new().with_prefix("logs/2024-")).await,
            vec!["logs/2024-01", "logs/2024-02"]
        );
        assert_eq!(
            keys(&client, EnumerationFilter::new().with_prefix("logs")).await,
            vec!["logs/2023-12", "logs/2024-01", "logs/2024-02", "logsx"]
        );
    }

    #[tokio::test]
    async fn test_pages_resume_from_token() {
        let client = ObjectStoreClient::memory().with_page_size(2);
        for key in ["k1", "k2", "k3", "k4", "k5"] {
            client.write_text(key, None, key).await.unwrap();
        }

        let pages: Vec<EnumerationPage> = client
            .enumerate_pages(EnumerationFilter::default())
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let sizes: Vec<usize> = pages.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(pages[0].continuation_token.as_deref(), Some("k2"));
        assert_eq!(pages[2].continuation_token, None);

        let resumed = keys(&client, EnumerationFilter::new().with_start_after("k3")).await;
        assert_eq!(resumed, vec!["k4", "k5"]);
    }

    #[tokio::test]
    async fn test_generate_url() {
        let client = ObjectStoreClient::memory();
        assert_eq!(client.generate_url("a/b"), "memory:///a/b");
    }
}
