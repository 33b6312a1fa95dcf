//! Bulk copy between two arbitrary blob clients.
//!
//! The engine walks the source enumeration page by page and streams each
//! object into the destination as soon as it is listed. It is sequential
//! and best-effort: the first failure stops the run, objects already
//! written stay in place, and the failure is reported inside the returned
//! `CopyStatistics` rather than as an `Err`. Keys recorded in
//! `CopyStatistics::keys` are known to be complete, so a caller can resume
//! with `EnumerationFilter::start_after` set to the last of them.

mod stats;

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::cancel::{cancellable, CancellationToken};
use crate::client::BlobClient;
use crate::error::Result;
use crate::filter::EnumerationFilter;
use crate::io::CountingReader;
use crate::metadata::BlobMetadata;

pub use stats::CopyStatistics;

/// A configured copy from `source` to `destination`.
pub struct BlobCopy {
    source: Arc<dyn BlobClient>,
    destination: Arc<dyn BlobClient>,
    filter: EnumerationFilter,
    cancel: CancellationToken,
}

impl BlobCopy {
    pub fn new(source: Arc<dyn BlobClient>, destination: Arc<dyn BlobClient>) -> Self {
        Self {
            source,
            destination,
            filter: EnumerationFilter::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Only copy keys starting with `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filter.prefix = Some(prefix.into());
        self
    }

    /// Full control over which source objects are copied.
    pub fn with_filter(mut self, filter: EnumerationFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run the copy. Always returns statistics; check `success`/`error`.
    pub async fn start(&self) -> CopyStatistics {
        let mut stats = CopyStatistics::start();
        info!(filter = ?self.filter, "copy started");

        let outcome = self.run(&mut stats).await;
        if let Err(e) = &outcome {
            warn!(error = %e, copied = stats.keys.len(), "copy stopped");
        }

        let stats = stats.finish(outcome.err());
        info!(
            success = stats.success,
            blobs = stats.blobs_written,
            bytes = stats.bytes_written,
            elapsed_ms = stats.elapsed_ms(),
            "copy finished"
        );
        stats
    }

    async fn run(&self, stats: &mut CopyStatistics) -> Result<()> {
        let mut pages = self.source.enumerate_pages(self.filter.clone())?;

        while let Some(page) = cancellable(&self.cancel, async { pages.next().await.transpose() })
            .await?
        {
            stats.continuation_tokens += 1;
            debug!(
                items = page.items.len(),
                continuation_token = ?page.continuation_token,
                "source page fetched"
            );

            for metadata in page.items {
                stats.blobs_enumerated += 1;
                stats.bytes_enumerated += metadata.content_length;
                cancellable(&self.cancel, self.copy_one(&metadata, stats)).await?;
            }
        }
        Ok(())
    }

    async fn copy_one(&self, metadata: &BlobMetadata, stats: &mut CopyStatistics) -> Result<()> {
        let key = metadata.key.as_str();
        let mut data = self.source.get_stream(key).await?;
        let content_length = data.content_length();
        // Listings may omit the content type; the read carries the stored one.
        let content_type = data
            .content_type()
            .map(str::to_string)
            .or_else(|| metadata.content_type.clone());
        stats.blobs_read += 1;

        let mut reader = CountingReader::new(data.reader()?);
        let written = self
            .destination
            .write_stream(
                key,
                content_type.as_deref(),
                content_length,
                &mut reader,
            )
            .await;
        let transferred = reader.count();
        data.release();

        stats.bytes_read += transferred;
        written?;
        stats.blobs_written += 1;
        stats.bytes_written += content_length;
        stats.keys.push(key.to_string());
        debug!(key = %key, content_length, "blob copied");
        Ok(())
    }
}

impl std::fmt::Debug for BlobCopy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobCopy")
            .field("filter", &self.filter)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Convenience for a one-shot copy of everything under `prefix`.
pub async fn copy_prefix(
    source: Arc<dyn BlobClient>,
    destination: Arc<dyn BlobClient>,
    prefix: Option<&str>,
) -> CopyStatistics {
    let mut copy = BlobCopy::new(source, destination);
    if let Some(prefix) = prefix {
        copy = copy.with_prefix(prefix);
    }
    copy.start().await
}
