//! Object storage backend
//!
//! This crate provides a `BlobClient` over any `object_store::ObjectStore`:
//! S3-compatible services (AWS S3, MinIO, ...) and an in-memory store for
//! tests. The wire protocol is entirely the `object_store` crate's concern.
//!
//! # Features
//!
//! - Native paginated listing: every page is one listing request that
//!   resumes after the previous page's last key
//! - Folder markers on a flat namespace, stored as placeholder objects
//! - Multipart upload for streamed writes larger than one chunk
//!
//! # Example
//!
//! ```rust,no_run
//! use blobport_object_store::{ObjectStoreClient, ObjectStoreSettings};
//! use common::prelude::*;
//!
//! # async fn example() -> common::error::Result<()> {
//! let client = ObjectStoreClient::new(ObjectStoreSettings::Memory).await?;
//! client.write_text("hello.txt", Some("text/plain"), "hello").await?;
//! assert!(client.exists("hello.txt").await?);
//! # Ok(())
//! # }
//! ```

mod client;
mod keys;
mod settings;

pub use client::ObjectStoreClient;
pub use keys::FOLDER_MARKER;
pub use settings::ObjectStoreSettings;
