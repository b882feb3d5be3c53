//! Tag mutations: a tag is a directory, membership is a hard link inside it.

use crate::error::{HomeError, HomeResult};
use crate::identity::{identity_of, FileId};
use crate::layout::HomeLayout;
use crate::models::{TagCreated, TagRecord, TagRemoved};
use std::io::ErrorKind;
use tracing::{debug, info, warn};

/// Ensures the tag directory exists and hard-links the note into it.
///
/// `created` is true only when this call made the directory. A failed link
/// leaves a freshly created directory in place.
pub async fn create_tag(
    layout: &HomeLayout,
    tag_name: &str,
    file_name: &str,
    expected: Option<FileId>,
) -> HomeResult<TagCreated> {
    let tag_dir = layout.tag_dir(tag_name)?;
    let file_name = layout.file_name_of(file_name)?;
    let note_path = layout.today_dir().join(&file_name);

    let created = match tokio::fs::create_dir(&tag_dir).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => false,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tokio::fs::create_dir_all(&tag_dir)
                .await
                .map_err(|e| HomeError::io(&tag_dir, e))?;
            true
        }
        Err(e) => return Err(HomeError::io(&tag_dir, e)),
    };
    if created {
        info!(tag = tag_name, "tag created");
    }
    let tag_id = identity_of(&tag_dir).await?;

    let source = tokio::fs::canonicalize(&note_path)
        .await
        .map_err(|e| HomeError::io(&note_path, e))?;
    let file_id = identity_of(&source).await?;
    if let Some(expected) = expected.filter(|id| *id != file_id) {
        warn!(
            file = %file_name,
            %expected,
            current = %file_id,
            "note identity changed since the UI last saw it"
        );
    }

    let link_path = tag_dir.join(&file_name);
    match tokio::fs::hard_link(&source, &link_path).await {
        Ok(()) => debug!(tag = tag_name, file = %file_name, "tag link created"),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if identity_of(&link_path).await? != file_id {
                return Err(HomeError::Conflict(link_path));
            }
            debug!(tag = tag_name, file = %file_name, "note already tagged");
        }
        Err(e) => return Err(HomeError::io(&link_path, e)),
    }

    Ok(TagCreated {
        tag: TagRecord {
            id: tag_id,
            name: tag_name.to_string(),
        },
        file_id,
        created,
    })
}

/// Deletes the note's link inside the tag directory. The note itself and the
/// tag directory are left alone.
pub async fn remove_file_tag(
    layout: &HomeLayout,
    tag_name: &str,
    file_name: &str,
) -> HomeResult<TagRemoved> {
    let tag_dir = layout.tag_dir(tag_name)?;
    let link_path = tag_dir.join(layout.file_name_of(file_name)?);

    let tag_id = identity_of(&tag_dir).await?;
    let file_id = identity_of(&link_path).await?;
    tokio::fs::remove_file(&link_path)
        .await
        .map_err(|e| HomeError::io(&link_path, e))?;
    info!(tag = tag_name, file = file_name, "tag removed from note");

    Ok(TagRemoved { tag_id, file_id })
}
