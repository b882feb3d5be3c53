use crate::identity::FileId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A markdown note in the today directory, as handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFile {
    pub id: FileId,
    pub name: String,
    pub data: String,
    #[serde(default)]
    pub tags: Vec<FileId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: FileId,
    pub name: String,
}

/// File identity to the identities of every tag directory linking it.
///
/// Derived from the tags tree on each load; the tree stays authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagIndex {
    pub file_tags: HashMap<FileId, Vec<FileId>>,
    pub tags: Vec<TagRecord>,
}

impl TagIndex {
    pub fn tags_for(&self, file: &FileId) -> &[FileId] {
        self.file_tags.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tag_named(&self, name: &str) -> Option<&TagRecord> {
        self.tags.iter().find(|t| t.name == name)
    }

    pub(crate) fn insert(&mut self, file: FileId, tag: FileId) {
        let tags = self.file_tags.entry(file).or_default();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
}

/// Everything the UI needs to render the home grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Home {
    pub files: Vec<NoteFile>,
    pub tags: Vec<TagRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCreated {
    pub tag: TagRecord,
    pub file_id: FileId,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRemoved {
    pub tag_id: FileId,
    pub file_id: FileId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenameOutcome {
    /// No file existed under the previous name; an empty one was created.
    Created { id: FileId },
    Renamed { id: FileId },
    /// Destination taken and the conflict policy said to leave both alone.
    Skipped { id: FileId },
}

impl RenameOutcome {
    pub fn id(&self) -> FileId {
        match self {
            RenameOutcome::Created { id }
            | RenameOutcome::Renamed { id }
            | RenameOutcome::Skipped { id } => *id,
        }
    }
}
