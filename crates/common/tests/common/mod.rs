//! Shared test utilities for blob client integration tests
#![allow(dead_code)]

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use common::prelude::*;
use futures::TryStreamExt;
use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};

/// Set up a disk client rooted in a fresh temporary directory
pub async fn setup_disk() -> (DiskClient, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let client = DiskClient::new(DiskSettings::new(temp_dir.path().join("blobs")))
        .await
        .unwrap();
    (client, temp_dir)
}

/// Write each `(key, content)` pair as text
pub async fn seed(client: &dyn BlobClient, objects: &[(&str, &str)]) {
    for (key, content) in objects {
        client.write_text(key, None, content).await.unwrap();
    }
}

/// Collect the keys an enumeration yields, in order
pub async fn keys(client: &dyn BlobClient, filter: EnumerationFilter) -> Vec<String> {
    client
        .enumerate(filter)
        .unwrap()
        .map_ok(|metadata| metadata.key)
        .try_collect()
        .await
        .unwrap()
}

/// Client wrapper whose n-th write (1-based) fails with a transport error.
pub struct FailingWrites {
    pub inner: Arc<dyn BlobClient>,
    pub fail_on: usize,
    writes: AtomicUsize,
}

impl FailingWrites {
    pub fn new(inner: Arc<dyn BlobClient>, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            writes: AtomicUsize::new(0),
        }
    }

    fn check(&self) -> Result<()> {
        let attempt = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on {
            return Err(BlobError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "injected write failure",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobClient for FailingWrites {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn get_metadata(&self, key: &str) -> Result<BlobMetadata> {
        self.inner.get_metadata(key).await
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        self.inner.get(key).await
    }

    async fn get_stream(&self, key: &str) -> Result<BlobData> {
        self.inner.get_stream(key).await
    }

    async fn write(&self, key: &str, content_type: Option<&str>, data: Bytes) -> Result<()> {
        self.check()?;
        self.inner.write(key, content_type, data).await
    }

    async fn write_stream(
        &self,
        key: &str,
        content_type: Option<&str>,
        content_length: u64,
        data: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()> {
        self.check()?;
        self.inner
            .write_stream(key, content_type, content_length, data)
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    fn generate_url(&self, key: &str) -> String {
        self.inner.generate_url(key)
    }

    fn enumerate_pages(&self, filter: EnumerationFilter) -> Result<PageStream<'_>> {
        self.inner.enumerate_pages(filter)
    }
}

/// Reader that never produces data nor completes, standing in for a
/// stalled network stream.
pub struct Stalled;

impl AsyncRead for Stalled {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Pending
    }
}
