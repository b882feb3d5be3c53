//! Rebuilds the file → tags index from the tags directory tree.
//!
//! Each immediate subdirectory of the tags root is a tag. Its identity is the
//! directory's own `(dev, ino)`; every entry inside it is a hard link whose
//! identity matches the note it points at.

use crate::error::{HomeError, HomeResult};
use crate::identity::{identity_of, FileId};
use crate::models::{TagIndex, TagRecord};
use std::path::{Path, PathBuf};
use tokio::task::{self, JoinSet};
use tracing::debug;
use walkdir::WalkDir;

pub async fn build_tag_index(tags_root: &Path) -> HomeResult<TagIndex> {
    let mut index = TagIndex::default();
    if !tokio::fs::try_exists(tags_root)
        .await
        .map_err(|e| HomeError::io(tags_root, e))?
    {
        return Ok(index);
    }

    for (name, dir) in list_tag_dirs(tags_root).await? {
        let tag_id = identity_of(&dir).await?;
        for file_id in stat_entries(&dir).await? {
            index.insert(file_id, tag_id);
        }
        index.tags.push(TagRecord { id: tag_id, name });
    }

    debug!(
        tags = index.tags.len(),
        files = index.file_tags.len(),
        "tag index rebuilt"
    );
    Ok(index)
}

/// Immediate subdirectories of the tags root, in directory-listing order.
async fn list_tag_dirs(tags_root: &Path) -> HomeResult<Vec<(String, PathBuf)>> {
    let root = tags_root.to_path_buf();
    task::spawn_blocking(move || {
        let mut dirs = Vec::new();
        for entry in WalkDir::new(&root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&root).to_path_buf();
                HomeError::io(path, e.into())
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            dirs.push((name.to_string(), entry.into_path()));
        }
        Ok::<_, HomeError>(dirs)
    })
    .await
    .map_err(|e| HomeError::io(tags_root, std::io::Error::other(e)))?
}

/// Stats every entry of one tag directory concurrently and waits for all of them.
async fn stat_entries(dir: &Path) -> HomeResult<Vec<FileId>> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| HomeError::io(dir, e))?;
    let mut pending = JoinSet::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| HomeError::io(dir, e))?
    {
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        pending.spawn(async move { identity_of(&path).await });
    }

    let mut ids = Vec::with_capacity(pending.len());
    while let Some(joined) = pending.join_next().await {
        let id = joined.map_err(|e| HomeError::io(dir, std::io::Error::other(e)))??;
        ids.push(id);
    }
    Ok(ids)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
