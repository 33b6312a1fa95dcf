//! The backend client contract.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use tokio::io::AsyncRead;
use tracing::{debug, info};

use crate::data::BlobData;
use crate::error::Result;
use crate::filter::{EnumerationFilter, EnumerationPage};
use crate::metadata::BlobMetadata;
use crate::request::{WritePayload, WriteRequest};

/// Lazy sequence of enumeration pages.
pub type PageStream<'a> = BoxStream<'a, Result<EnumerationPage>>;

/// Lazy sequence of metadata records.
pub type MetadataStream<'a> = BoxStream<'a, Result<BlobMetadata>>;

/// Uniform object storage operations, implemented once per backend.
///
/// Orchestration code (the copy engine, the CLI) only ever talks to a
/// `dyn BlobClient`. A key ending in `/` names a folder marker.
#[async_trait]
pub trait BlobClient: Send + Sync {
    /// True if an object or folder marker exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Metadata for `key`, `NotFound` if absent.
    async fn get_metadata(&self, key: &str) -> Result<BlobMetadata>;

    /// Full object contents. A folder marker reads as empty bytes.
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Same existence semantics as `get`, but lazily read.
    async fn get_stream(&self, key: &str) -> Result<BlobData>;

    /// Write (or overwrite) an object from memory.
    async fn write(&self, key: &str, content_type: Option<&str>, data: Bytes) -> Result<()>;

    /// Write (or overwrite) an object from `content_length` bytes of `data`.
    ///
    /// The reader is only borrowed; the caller still owns and releases it.
    async fn write_stream(
        &self,
        key: &str,
        content_type: Option<&str>,
        content_length: u64,
        data: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()>;

    /// Delete an object or folder marker, `NotFound` if neither exists.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Backend specific locator for `key`. Pure, performs no I/O.
    fn generate_url(&self, key: &str) -> String;

    /// Page by page listing. Pages are only fetched as the stream is
    ///  polled. The filter is validated before anything is listed.
    fn enumerate_pages(&self, filter: EnumerationFilter) -> Result<PageStream<'_>>;

    /// Item by item listing in the backend's natural order.
    fn enumerate(&self, filter: EnumerationFilter) -> Result<MetadataStream<'_>> {
        let pages = self.enumerate_pages(filter)?;
        Ok(pages
            .map_ok(|page| stream::iter(page.items.into_iter().map(Ok)))
            .try_flatten()
            .boxed())
    }

    /// Write a UTF-8 string.
    async fn write_text(&self, key: &str, content_type: Option<&str>, text: &str) -> Result<()> {
        self.write(key, content_type, Bytes::copy_from_slice(text.as_bytes()))
            .await
    }

    /// Execute each request in order. Stops at the first failure; writes
    ///  already made are kept.
    async fn write_many(&self, requests: Vec<WriteRequest>) -> Result<()> {
        let total = requests.len();
        for (index, request) in requests.into_iter().enumerate() {
            let WriteRequest {
                key,
                content_type,
                payload,
            } = request;
            debug!(key = %key, index, total, "write_many");
            match payload {
                WritePayload::Bytes(bytes) => {
                    self.write(&key, content_type.as_deref(), bytes).await?
                }
                WritePayload::Stream {
                    content_length,
                    mut data,
                } => {
                    self.write_stream(&key, content_type.as_deref(), content_length, &mut data)
                        .await?
                }
            }
        }
        Ok(())
    }

    /// Delete everything currently enumerable. The listing is snapshotted
    ///  before the first delete.
    async fn empty(&self) -> Result<Vec<BlobMetadata>> {
        let snapshot: Vec<BlobMetadata> = self
            .enumerate(EnumerationFilter::default())?
            .try_collect()
            .await?;
        for metadata in &snapshot {
            self.delete(&metadata.key).await?;
        }
        info!(deleted = snapshot.len(), "emptied backend");
        Ok(snapshot)
    }
}
