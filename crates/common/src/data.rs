//! Streaming payload envelope returned by `get_stream`.

use std::io::Cursor;
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{BlobError, Result};

/// Owned, type-erased readable byte stream.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// A byte count paired with the stream that produces those bytes.
///
/// The envelope exclusively owns the stream. `release` drops it and is a
/// no-op when called again; dropping the envelope releases it as well.
/// Lending the reader to a write call does not transfer ownership.
pub struct BlobData {
    content_length: u64,
    content_type: Option<String>,
    data: Option<BlobReader>,
}

impl std::fmt::Debug for BlobData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobData")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .field("released", &self.data.is_none())
            .finish()
    }
}

impl BlobData {
    pub fn new(content_length: u64, data: impl AsyncRead + Send + 'static) -> Self {
        Self {
            content_length,
            content_type: None,
            data: Some(Box::pin(data)),
        }
    }

    /// Attach the content type the backend stored with the object.
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    /// Wrap an in-memory payload.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self::new(bytes.len() as u64, Cursor::new(bytes))
    }

    /// Zero-length payload, as returned for folder markers.
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.data.is_none()
    }

    /// Borrow the stream. Fails once the envelope has been released.
    pub fn reader(&mut self) -> Result<&mut BlobReader> {
        self.data
            .as_mut()
            .ok_or_else(|| BlobError::invalid("blob stream already released"))
    }

    /// Drop the underlying stream. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(stream) = self.data.take() {
            drop(stream);
            tracing::trace!(content_length = self.content_length, "blob stream released");
        }
    }

    /// Read exactly `content_length` bytes and release the stream.
    pub async fn into_bytes(mut self) -> Result<Bytes> {
        let expected = self.content_length;
        let len = usize::try_from(expected)
            .map_err(|_| BlobError::invalid(format!("{} bytes do not fit in memory", expected)))?;
        let mut buf = vec![0u8; len];
        self.reader()?.read_exact(&mut buf).await?;
        self.release();
        Ok(Bytes::from(buf))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    /// Reader that counts how many times it has been dropped.
    struct DropCounter {
        inner: Cursor<Vec<u8>>,
        drops: Arc<AtomicUsize>,
    }

    impl AsyncRead for DropCounter {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.inner).poll_read(cx, buf)
        }
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_is_idempotent() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut data = BlobData::new(
            3,
            DropCounter {
                inner: Cursor::new(b"abc".to_vec()),
                drops: drops.clone(),
            },
        );

        data.release();
        data.release();
        assert!(data.is_released());
        drop(data);

        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_stream() {
        let drops = Arc::new(AtomicUsize::new(0));
        let data = BlobData::new(
            0,
            DropCounter {
                inner: Cursor::new(Vec::new()),
                drops: drops.clone(),
            },
        );
        drop(data);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reader_after_release_fails() {
        let mut data = BlobData::from_bytes(Bytes::from_static(b"hello"));
        data.release();
        assert!(matches!(data.reader(), Err(BlobError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_into_bytes() {
        let data = BlobData::from_bytes(Bytes::from_static(b"hello"));
        assert_eq!(data.content_length(), 5);
        assert_eq!(data.into_bytes().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_short_stream_is_transport_failure() {
        let data = BlobData::new(10, Cursor::new(b"short".to_vec()));
        let err = data.into_bytes().await.unwrap_err();
        assert!(err.is_transport());
    }
}
