//! Typed request/reply channel between a UI and the host.
//!
//! Every [`Request`] carries an id that is echoed on its [`Reply`], so a
//! caller can pair answers with questions. Wire names match the UI channel
//! names (`noteUpdate`, `createTag`, ...), fields are camelCase.

use crate::config::ConflictPolicy;
use crate::error::HomeResult;
use crate::identity::FileId;
use crate::layout::HomeLayout;
use crate::models::{NoteFile, RenameOutcome, TagRecord};
use crate::{notes, tagging};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    LoadHome,
    Open {
        paths: Vec<PathBuf>,
    },
    NoteUpdate {
        name: String,
        val: String,
    },
    #[serde(rename_all = "camelCase")]
    Rename {
        prev_name: String,
        new_name: String,
        #[serde(default)]
        layout_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CreateTag {
        tag_name: String,
        file_name: String,
        #[serde(default)]
        file_id: Option<FileId>,
    },
    #[serde(rename_all = "camelCase")]
    RemoveFileTag {
        tag_name: String,
        file_name: String,
        #[serde(default)]
        file_id: Option<FileId>,
        #[serde(default)]
        tag_id: Option<FileId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    LoadHome {
        files: Vec<NoteFile>,
        tags: Vec<TagRecord>,
    },
    OpenFiles {
        files: Vec<NoteFile>,
    },
    NoteSaved {
        id: FileId,
        name: String,
    },
    /// A rename of a never-saved note created the file.
    #[serde(rename_all = "camelCase")]
    FileSaved {
        id: FileId,
        layout_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    FileRenamed {
        id: FileId,
        layout_id: Option<String>,
        skipped: bool,
    },
    #[serde(rename_all = "camelCase")]
    FileTagged {
        tag: TagRecord,
        file_id: FileId,
        created: bool,
    },
    #[serde(rename_all = "camelCase")]
    FileTagRemoved {
        tag_id: FileId,
        file_id: FileId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok(Event),
    Error(String),
}

impl Reply {
    pub fn event(&self) -> Option<&Event> {
        match &self.outcome {
            Outcome::Ok(event) => Some(event),
            Outcome::Error(_) => None,
        }
    }
}

/// Host side of the channel, bound to one home layout.
#[derive(Debug, Clone)]
pub struct HomeSpace {
    layout: HomeLayout,
    conflict: ConflictPolicy,
    excludes: Vec<String>,
}

impl HomeSpace {
    pub fn new(layout: HomeLayout) -> Self {
        Self {
            layout,
            conflict: ConflictPolicy::default(),
            excludes: Vec::new(),
        }
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict = policy;
        self
    }

    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn layout(&self) -> &HomeLayout {
        &self.layout
    }

    pub async fn handle(&self, command: Command) -> HomeResult<Event> {
        match command {
            Command::LoadHome => {
                let home = notes::load_home(&self.layout, &self.excludes).await?;
                Ok(Event::LoadHome {
                    files: home.files,
                    tags: home.tags,
                })
            }
            Command::Open { paths } => {
                let files = notes::open_files(&self.layout, &paths, self.conflict).await?;
                Ok(Event::OpenFiles { files })
            }
            Command::NoteUpdate { name, val } => {
                let id = notes::save_note(&self.layout, &name, &val).await?;
                Ok(Event::NoteSaved { id, name })
            }
            Command::Rename {
                prev_name,
                new_name,
                layout_id,
            } => {
                let outcome =
                    notes::rename_note(&self.layout, &prev_name, &new_name, self.conflict).await?;
                Ok(match outcome {
                    RenameOutcome::Created { id } => Event::FileSaved { id, layout_id },
                    RenameOutcome::Renamed { id } => Event::FileRenamed {
                        id,
                        layout_id,
                        skipped: false,
                    },
                    RenameOutcome::Skipped { id } => Event::FileRenamed {
                        id,
                        layout_id,
                        skipped: true,
                    },
                })
            }
            Command::CreateTag {
                tag_name,
                file_name,
                file_id,
            } => {
                let tagged =
                    tagging::create_tag(&self.layout, &tag_name, &file_name, file_id).await?;
                Ok(Event::FileTagged {
                    tag: tagged.tag,
                    file_id: tagged.file_id,
                    created: tagged.created,
                })
            }
            Command::RemoveFileTag {
                tag_name,
                file_name,
                file_id,
                tag_id,
            } => {
                let removed = tagging::remove_file_tag(&self.layout, &tag_name, &file_name).await?;
                if file_id.is_some_and(|id| id != removed.file_id)
                    || tag_id.is_some_and(|id| id != removed.tag_id)
                {
                    warn!(
                        tag = %tag_name,
                        file = %file_name,
                        "removed link identities differ from the ones the UI sent"
                    );
                }
                Ok(Event::FileTagRemoved {
                    tag_id: removed.tag_id,
                    file_id: removed.file_id,
                })
            }
        }
    }

    /// Answers requests in arrival order until the request side closes or the
    /// reply side is dropped. A failed command gets an error reply.
    pub async fn serve(&self, mut requests: mpsc::Receiver<Request>, replies: mpsc::Sender<Reply>) {
        while let Some(Request { id, command }) = requests.recv().await {
            debug!(id, ?command, "request");
            let outcome = match self.handle(command).await {
                Ok(event) => Outcome::Ok(event),
                Err(e) => {
                    warn!(id, error = %e, "command failed");
                    Outcome::Error(e.to_string())
                }
            };
            if replies.send(Reply { id, outcome }).await.is_err() {
                // Receiver dropped, stop serving.
                break;
            }
        }
    }
}
