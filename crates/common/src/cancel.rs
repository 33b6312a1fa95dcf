//! Cancellation plumbing.
//!
//! Dropping any future returned by a client abandons the operation and
//! releases the handles it owns. `cancellable` maps an external
//! `CancellationToken` onto that, surfacing `BlobError::Cancelled`.

use std::future::Future;

pub use tokio_util::sync::CancellationToken;

use crate::error::{BlobError, Result};

/// Run `fut` until it completes or `token` is cancelled, whichever
/// comes first. On cancellation `fut` is dropped.
pub async fn cancellable<F, T>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(BlobError::Cancelled),
        result = fut => result,
    }
}
