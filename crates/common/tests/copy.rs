//! Integration tests for the copy engine between disk clients

mod common;

use std::sync::Arc;

use ::common::cancel::CancellationToken;
use ::common::copy::copy_prefix;
use ::common::prelude::*;
use bytes::Bytes;

async fn source_and_destination() -> (Arc<DiskClient>, Arc<DiskClient>, Vec<tempfile::TempDir>) {
    let (source, source_dir) = common::setup_disk().await;
    let (destination, destination_dir) = common::setup_disk().await;
    (
        Arc::new(source),
        Arc::new(destination),
        vec![source_dir, destination_dir],
    )
}

#[tokio::test]
async fn test_copy_everything() {
    let (source, destination, _temps) = source_and_destination().await;
    common::seed(&*source, &[("x", "hello"), ("y", "world")]).await;

    let stats = BlobCopy::new(source.clone(), destination.clone()).start().await;

    assert!(stats.success, "{}", stats);
    assert!(stats.error.is_none());
    assert_eq!(stats.blobs_enumerated, 2);
    assert_eq!(stats.bytes_enumerated, 10);
    assert_eq!(stats.blobs_read, 2);
    assert_eq!(stats.bytes_read, 10);
    assert_eq!(stats.blobs_written, 2);
    assert_eq!(stats.bytes_written, 10);
    assert_eq!(stats.keys, vec!["x", "y"]);
    assert_eq!(stats.continuation_tokens, 1);
    assert!(stats.finished_utc.is_some());

    assert_eq!(destination.get("x").await.unwrap(), Bytes::from_static(b"hello"));
    assert_eq!(destination.get("y").await.unwrap(), Bytes::from_static(b"world"));
}

#[tokio::test]
async fn test_copy_with_prefix() {
    let (source, destination, _temps) = source_and_destination().await;
    common::seed(
        &*source,
        &[("a/1", "one"), ("a/sub/2", "two"), ("b/1", "nope")],
    )
    .await;

    let stats = copy_prefix(source.clone(), destination.clone(), Some("a/")).await;

    assert!(stats.success);
    assert_eq!(stats.keys, vec!["a/1", "a/sub/2"]);
    assert!(!destination.exists("b/1").await.unwrap());
    assert_eq!(destination.get("a/sub/2").await.unwrap(), Bytes::from_static(b"two"));
}

#[tokio::test]
async fn test_copy_stops_at_first_failure() {
    let (source, destination, _temps) = source_and_destination().await;
    common::seed(&*source, &[("x", "hello"), ("y", "world")]).await;

    let failing = Arc::new(common::FailingWrites::new(destination.clone(), 2));
    let stats = BlobCopy::new(source.clone(), failing).start().await;

    assert!(!stats.success);
    let error = stats.error.as_ref().unwrap();
    assert!(error.is_transport(), "{error}");
    assert_eq!(stats.blobs_written, 1);
    assert_eq!(stats.keys, vec!["x"]);

    // No rollback: the first object stays, the second was never written.
    assert!(destination.exists("x").await.unwrap());
    assert!(!destination.exists("y").await.unwrap());
}

#[tokio::test]
async fn test_resume_from_recorded_keys() {
    let (source, destination, _temps) = source_and_destination().await;
    common::seed(&*source, &[("x", "hello"), ("y", "world"), ("z", "!")]).await;

    let failing = Arc::new(common::FailingWrites::new(destination.clone(), 2));
    let first = BlobCopy::new(source.clone(), failing).start().await;
    assert!(!first.success);

    let resume = EnumerationFilter::new().with_start_after(first.keys.last().unwrap().clone());
    let second = BlobCopy::new(source.clone(), destination.clone())
        .with_filter(resume)
        .start()
        .await;

    assert!(second.success);
    assert_eq!(second.keys, vec!["y", "z"]);
    assert_eq!(destination.get("z").await.unwrap(), Bytes::from_static(b"!"));
}

#[tokio::test]
async fn test_copy_counts_pages() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let source = DiskClient::new(DiskSettings::new(temp_dir.path().join("src")).with_page_size(2))
        .await
        .unwrap();
    let (destination, _dest_dir) = common::setup_disk().await;
    common::seed(&source, &[("1", "a"), ("2", "b"), ("3", "c"), ("4", "d"), ("5", "e")]).await;

    let stats = BlobCopy::new(Arc::new(source), Arc::new(destination))
        .start()
        .await;

    assert!(stats.success);
    assert_eq!(stats.continuation_tokens, 3);
    assert_eq!(stats.blobs_written, 5);
}

#[tokio::test]
async fn test_cancelled_copy() {
    let (source, destination, _temps) = source_and_destination().await;
    common::seed(&*source, &[("x", "hello")]).await;

    let token = CancellationToken::new();
    token.cancel();
    let stats = BlobCopy::new(source, destination.clone())
        .with_cancellation(token)
        .start()
        .await;

    assert!(!stats.success);
    assert!(matches!(stats.error, Some(BlobError::Cancelled)));
    assert!(stats.keys.is_empty());
    assert!(!destination.exists("x").await.unwrap());
}

#[tokio::test]
async fn test_invalid_filter_reported_in_statistics() {
    let (source, destination, _temps) = source_and_destination().await;

    let filter = EnumerationFilter {
        minimum_size: 2,
        maximum_size: 1,
        ..Default::default()
    };
    let stats = BlobCopy::new(source, destination)
        .with_filter(filter)
        .start()
        .await;

    assert!(!stats.success);
    assert!(matches!(stats.error, Some(BlobError::InvalidArgument(_))));
    assert_eq!(stats.blobs_enumerated, 0);
}
