use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::BlobError;

/// Outcome of one copy run.
///
/// Counters are updated as the run progresses; `finish` closes the
/// record exactly once. `keys` lists every key that was written to the
/// destination, in copy order.
#[derive(Debug, Serialize)]
pub struct CopyStatistics {
    pub success: bool,
    pub started_utc: DateTime<Utc>,
    pub finished_utc: Option<DateTime<Utc>>,
    #[serde(serialize_with = "error_message")]
    pub error: Option<BlobError>,
    /// Number of enumeration pages fetched from the source
    pub continuation_tokens: u64,
    pub blobs_enumerated: u64,
    pub bytes_enumerated: u64,
    pub blobs_read: u64,
    pub bytes_read: u64,
    pub blobs_written: u64,
    pub bytes_written: u64,
    pub keys: Vec<String>,
}

fn error_message<S: Serializer>(error: &Option<BlobError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => s.serialize_some(&error.to_string()),
        None => s.serialize_none(),
    }
}

impl CopyStatistics {
    pub(crate) fn start() -> Self {
        Self {
            success: false,
            started_utc: Utc::now(),
            finished_utc: None,
            error: None,
            continuation_tokens: 0,
            blobs_enumerated: 0,
            bytes_enumerated: 0,
            blobs_read: 0,
            bytes_read: 0,
            blobs_written: 0,
            bytes_written: 0,
            keys: Vec::new(),
        }
    }

    pub(crate) fn finish(mut self, error: Option<BlobError>) -> Self {
        debug_assert!(self.finished_utc.is_none(), "statistics finalised twice");
        self.success = error.is_none();
        self.error = error;
        self.finished_utc = Some(Utc::now());
        self
    }

    /// Milliseconds between start and finish (or now, while running).
    pub fn elapsed_ms(&self) -> i64 {
        let end = self.finished_utc.unwrap_or_else(Utc::now);
        (end - self.started_utc).num_milliseconds()
    }
}

impl std::fmt::Display for CopyStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} in {} ms",
            if self.success { "Copy succeeded" } else { "Copy failed" },
            self.elapsed_ms()
        )?;
        writeln!(f, "  pages:      {}", self.continuation_tokens)?;
        writeln!(
            f,
            "  enumerated: {} blobs, {} bytes",
            self.blobs_enumerated, self.bytes_enumerated
        )?;
        writeln!(f, "  read:       {} blobs, {} bytes", self.blobs_read, self.bytes_read)?;
        write!(
            f,
            "  written:    {} blobs, {} bytes",
            self.blobs_written, self.bytes_written
        )?;
        if let Some(error) = &self.error {
            write!(f, "\n  error:      {}", error)?;
        }
        Ok(())
    }
}
