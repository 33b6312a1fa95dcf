//! Lazy, lexicographically ordered directory walk.
//!
//! Directories are read one at a time, only when the walk reaches them.
//! Siblings are sorted with directories compared as `name/`, which makes
//! the depth-first order identical to byte order of the resulting keys.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use async_stream::try_stream;
use futures::Stream;
use tracing::{debug, warn};

use crate::error::{BlobError, Result};

enum Node {
    Dir(PathBuf),
    File(PathBuf, Metadata),
}

/// All regular files below `start`, in key order.
pub(crate) fn files(start: PathBuf) -> impl Stream<Item = Result<(PathBuf, Metadata)>> {
    try_stream! {
        let mut stack = vec![Node::Dir(start)];
        while let Some(node) = stack.pop() {
            match node {
                Node::File(path, metadata) => yield (path, metadata),
                Node::Dir(dir) => {
                    let children = read_sorted(dir).await?;
                    stack.extend(children.into_iter().rev());
                }
            }
        }
    }
}

async fn read_sorted(dir: PathBuf) -> Result<Vec<Node>> {
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        // Removed while walking; nothing left to list.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BlobError::Io(e)),
    };

    let mut children: Vec<(String, Node)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = ?path, "skipping non UTF-8 file name");
            continue;
        };
        let metadata = match entry_metadata(&path).await? {
            Some(metadata) => metadata,
            None => continue,
        };
        if metadata.is_dir() {
            children.push((format!("{}/", name), Node::Dir(path)));
        } else if metadata.is_file() {
            children.push((name, Node::File(path, metadata)));
        }
    }

    children.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(children.into_iter().map(|(_, node)| node).collect())
}

/// Metadata for a directory entry. Symlinks to files are followed so they
///  list like regular files; symlinked directories are skipped, which keeps
///  a link back to an ancestor from recursing forever. `None` for entries
///  that vanished or are not walked.
async fn entry_metadata(path: &Path) -> Result<Option<Metadata>> {
    let link = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BlobError::Io(e)),
    };
    if !link.file_type().is_symlink() {
        return Ok(Some(link));
    }
    match tokio::fs::metadata(path).await {
        Ok(target) if target.is_dir() => {
            debug!(path = ?path, "not following directory symlink");
            Ok(None)
        }
        Ok(target) => Ok(Some(target)),
        // Dangling link.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BlobError::Io(e)),
    }
}
