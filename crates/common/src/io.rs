//! Chunked stream helpers shared by the backends and the copy engine.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::error::Result;

/// Default chunk size for streamed writes (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Reads exactly `content_length` bytes from a stream in chunks of at
/// most `buffer_size`, so callers can forward each chunk as it arrives
/// without buffering the whole payload.
///
/// A stream that ends before `content_length` bytes were produced is an
/// `UnexpectedEof` I/O error.
pub struct ExactChunks<'a, R: ?Sized> {
    reader: &'a mut R,
    content_length: u64,
    remaining: u64,
    buffer: Vec<u8>,
}

impl<'a, R> ExactChunks<'a, R>
where
    R: AsyncRead + Unpin + ?Sized,
{
    pub fn new(reader: &'a mut R, content_length: u64, buffer_size: usize) -> Self {
        let capacity = buffer_size.max(1).min(content_length.max(1) as usize);
        Self {
            reader,
            content_length,
            remaining: content_length,
            buffer: vec![0u8; capacity],
        }
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> u64 {
        self.content_length - self.remaining
    }

    /// Next chunk, or `None` once `content_length` bytes were read.
    pub async fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let want = (self.buffer.len() as u64).min(self.remaining) as usize;
        let read = self.reader.read(&mut self.buffer[..want]).await?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "stream ended after {} of {} bytes",
                    self.consumed(),
                    self.content_length
                ),
            )
            .into());
        }
        self.remaining -= read as u64;
        Ok(Some(&self.buffer[..read]))
    }
}

/// Counts the bytes pulled through a borrowed reader.
pub struct CountingReader<'a, R: ?Sized> {
    inner: &'a mut R,
    count: u64,
}

impl<'a, R: ?Sized> CountingReader<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        Self { inner, count: 0 }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl<R> AsyncRead for CountingReader<'_, R>
where
    R: AsyncRead + Unpin + ?Sized,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let this = &mut *self;
        let poll = Pin::new(&mut *this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            this.count += (buf.filled().len() - before) as u64;
        }
        poll
    }
}
