//! Pending writes for `BlobClient::write_many`.

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::data::BlobReader;

/// Payload of a write. The two forms are mutually exclusive.
pub enum WritePayload {
    /// In-memory bytes
    Bytes(Bytes),
    /// `content_length` bytes to be read from `data`
    Stream {
        content_length: u64,
        data: BlobReader,
    },
}

impl std::fmt::Debug for WritePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream { content_length, .. } => f
                .debug_struct("Stream")
                .field("content_length", content_length)
                .finish(),
        }
    }
}

impl WritePayload {
    pub fn content_length(&self) -> u64 {
        match self {
            Self::Bytes(bytes) => bytes.len() as u64,
            Self::Stream { content_length, .. } => *content_length,
        }
    }
}

/// A single pending write.
#[derive(Debug)]
pub struct WriteRequest {
    pub key: String,
    pub content_type: Option<String>,
    pub payload: WritePayload,
}

impl WriteRequest {
    pub fn bytes(key: impl Into<String>, content_type: Option<&str>, data: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            content_type: content_type.map(str::to_string),
            payload: WritePayload::Bytes(data.into()),
        }
    }

    /// UTF-8 text payload.
    pub fn text(key: impl Into<String>, content_type: Option<&str>, text: &str) -> Self {
        Self::bytes(key, content_type, Bytes::copy_from_slice(text.as_bytes()))
    }

    pub fn stream(
        key: impl Into<String>,
        content_type: Option<&str>,
        content_length: u64,
        data: impl AsyncRead + Send + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            content_type: content_type.map(str::to_string),
            payload: WritePayload::Stream {
                content_length,
                data: Box::pin(data),
            },
        }
    }
}
