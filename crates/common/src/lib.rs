/**
 * Error taxonomy shared by every backend
 *  and the copy engine.
 */
pub mod error;
/**
 * Passive records describing stored objects,
 *  enumeration queries and pending writes.
 */
pub mod metadata;
pub mod filter;
pub mod request;
/**
 * Streaming payload envelope. Owns the
 *  readable stream handed out by a read.
 */
pub mod data;
/**
 * The backend client contract. Every
 *  concrete backend implements `BlobClient`
 *  and nothing else is shared between them.
 */
pub mod client;
/**
 * Reference backend over a local directory tree.
 */
pub mod disk;
/**
 * Bulk copy between two arbitrary clients,
 *  with statistics.
 */
pub mod copy;
pub mod cancel;
pub mod io;

pub mod prelude {
    pub use crate::client::{BlobClient, MetadataStream, PageStream};
    pub use crate::copy::{BlobCopy, CopyStatistics};
    pub use crate::data::{BlobData, BlobReader};
    pub use crate::disk::{DiskClient, DiskSettings};
    pub use crate::error::{BlobError, Result};
    pub use crate::filter::{EnumerationFilter, EnumerationPage};
    pub use crate::metadata::BlobMetadata;
    pub use crate::request::{WritePayload, WriteRequest};
}
