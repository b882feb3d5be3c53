//! Note files in the today directory: save, rename, load and open.

use crate::config::ConflictPolicy;
use crate::error::{HomeError, HomeResult};
use crate::identity::{identity_of, FileId};
use crate::layout::HomeLayout;
use crate::models::{Home, NoteFile, RenameOutcome};
use crate::tag_index::build_tag_index;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Writes `content` to `<today>/<name>.md`, creating or truncating it.
pub async fn save_note(layout: &HomeLayout, name: &str, content: &str) -> HomeResult<FileId> {
    let path = layout.note_path(name)?;
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| HomeError::io(&path, e))?;
    debug!(note = name, bytes = content.len(), "note saved");
    identity_of(&path).await
}

/// Renames a note in place; a note that was never saved gets an empty file
/// under the new name instead.
pub async fn rename_note(
    layout: &HomeLayout,
    prev_name: &str,
    new_name: &str,
    policy: ConflictPolicy,
) -> HomeResult<RenameOutcome> {
    let from = layout.note_path(prev_name)?;
    let to = layout.note_path(new_name)?;

    if !exists(&from).await? {
        tokio::fs::write(&to, "")
            .await
            .map_err(|e| HomeError::io(&to, e))?;
        let id = identity_of(&to).await?;
        info!(note = new_name, %id, "note created");
        return Ok(RenameOutcome::Created { id });
    }

    let id = identity_of(&from).await?;
    if from == to {
        return Ok(RenameOutcome::Renamed { id });
    }
    let target = match resolve_target(&to, policy).await? {
        Some(target) => target,
        None => {
            info!(from = prev_name, to = new_name, "rename skipped, destination exists");
            return Ok(RenameOutcome::Skipped { id });
        }
    };
    tokio::fs::rename(&from, &target)
        .await
        .map_err(|e| HomeError::io(&from, e))?;
    info!(from = %from.display(), to = %target.display(), "note renamed");
    Ok(RenameOutcome::Renamed { id })
}

/// Reads every note in the today directory and attaches its tags.
pub async fn load_home(layout: &HomeLayout, excludes: &[String]) -> HomeResult<Home> {
    let exclude_set = build_globset(excludes)?;
    let today = layout.today_dir();
    let index = build_tag_index(&layout.tags_dir()).await?;

    let mut files = Vec::new();
    if exists(&today).await? {
        let mut reader = tokio::fs::read_dir(&today)
            .await
            .map_err(|e| HomeError::io(&today, e))?;
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| HomeError::io(&today, e))?
        {
            let path = entry.path();
            if is_hidden(&path) || exclude_set.is_match(&path) || !layout.has_note_extension(&path)
            {
                continue;
            }
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| HomeError::io(&path, e))?;
            if !file_type.is_file() {
                continue;
            }
            let mut note = read_note(&path).await?;
            note.tags = index.tags_for(&note.id).to_vec();
            files.push(note);
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));

    info!(files = files.len(), tags = index.tags.len(), "home loaded");
    Ok(Home {
        files,
        tags: index.tags,
    })
}

/// Reads the selected files, linking those that live elsewhere into the today
/// directory. A failed link is logged and the file is still returned.
pub async fn open_files(
    layout: &HomeLayout,
    paths: &[PathBuf],
    policy: ConflictPolicy,
) -> HomeResult<Vec<NoteFile>> {
    let today = layout.today_dir();
    let mut seen = HashSet::new();
    let mut opened = Vec::new();

    for path in paths {
        if !layout.has_note_extension(path) {
            debug!(path = %path.display(), "not a note, skipped");
            continue;
        }
        let note = read_note(path).await?;
        if !seen.insert(note.id) {
            continue;
        }

        let in_today = match path.parent() {
            Some(dir) => layout.is_today_dir(dir).await,
            None => false,
        };
        if !in_today {
            if let Err(e) = link_into(path, &today.join(&note.name), note.id, policy).await {
                warn!(path = %path.display(), error = %e, "could not link note into today");
            }
        }
        opened.push(note);
    }
    Ok(opened)
}

/// Hard-links `source` to `dest` in the today directory. An existing
/// different file at `dest` is never replaced: `rename` picks a suffixed
/// name, the other policies leave the existing note alone.
async fn link_into(
    source: &Path,
    dest: &Path,
    id: FileId,
    policy: ConflictPolicy,
) -> HomeResult<()> {
    let target = if exists(dest).await? {
        if identity_of(dest).await? == id {
            return Ok(());
        }
        match policy {
            ConflictPolicy::Rename => resolve_conflict(dest).await?,
            ConflictPolicy::Overwrite | ConflictPolicy::Skip => {
                info!(path = %dest.display(), "today already has a different note with this name, keeping it");
                return Ok(());
            }
        }
    } else {
        dest.to_path_buf()
    };
    tokio::fs::hard_link(source, &target)
        .await
        .map_err(|e| HomeError::io(&target, e))?;
    debug!(from = %source.display(), to = %target.display(), "note linked into today");
    Ok(())
}

async fn read_note(path: &Path) -> HomeResult<NoteFile> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| HomeError::io(path, e))?;
    let id = identity_of(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(NoteFile {
        id,
        name,
        data: String::from_utf8_lossy(&bytes).into_owned(),
        tags: Vec::new(),
    })
}

/// Where a write to `dest` should land under `policy`; `None` means skip.
async fn resolve_target(dest: &Path, policy: ConflictPolicy) -> HomeResult<Option<PathBuf>> {
    if !exists(dest).await? {
        return Ok(Some(dest.to_path_buf()));
    }
    match policy {
        ConflictPolicy::Overwrite => Ok(Some(dest.to_path_buf())),
        ConflictPolicy::Skip => Ok(None),
        ConflictPolicy::Rename => resolve_conflict(dest).await.map(Some),
    }
}

async fn resolve_conflict(dest: &Path) -> HomeResult<PathBuf> {
    let stem = dest
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("note")
        .to_string();
    let ext = dest
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut counter = 1;
    loop {
        let name = if ext.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, ext)
        };
        let candidate = parent.join(name);
        if !exists(&candidate).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

async fn exists(path: &Path) -> HomeResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| HomeError::io(path, e))
}

fn build_globset(patterns: &[String]) -> HomeResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|_| HomeError::InvalidName(pat.clone()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| HomeError::InvalidName(e.to_string()))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    async fn home() -> (tempfile::TempDir, HomeLayout) {
        let temp = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(
            temp.path().join("hs"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        layout.ensure_dirs().await.unwrap();
        (temp, layout)
    }

    #[tokio::test]
    async fn save_then_rename_keeps_identity() {
        let (_temp, layout) = home().await;
        let id = save_note(&layout, "draft", "# hi").await.unwrap();
        let outcome = rename_note(&layout, "draft", "final", ConflictPolicy::Overwrite)
            .await
            .unwrap();
        assert_eq!(outcome, RenameOutcome::Renamed { id });
        assert!(!layout.note_path("draft").unwrap().exists());
        assert_eq!(
            fs::read_to_string(layout.note_path("final").unwrap()).unwrap(),
            "# hi"
        );
    }

    #[tokio::test]
    async fn rename_over_existing_note_follows_policy() {
        let (_temp, layout) = home().await;
        save_note(&layout, "a", "from a").await.unwrap();
        save_note(&layout, "b", "from b").await.unwrap();

        let skipped = rename_note(&layout, "a", "b", ConflictPolicy::Skip).await.unwrap();
        assert!(matches!(skipped, RenameOutcome::Skipped { .. }));
        assert!(layout.note_path("a").unwrap().exists());

        rename_note(&layout, "a", "b", ConflictPolicy::Rename).await.unwrap();
        assert_eq!(
            fs::read_to_string(layout.today_dir().join("b_1.md")).unwrap(),
            "from a"
        );

        save_note(&layout, "c", "from c").await.unwrap();
        rename_note(&layout, "c", "b", ConflictPolicy::Overwrite).await.unwrap();
        assert_eq!(
            fs::read_to_string(layout.note_path("b").unwrap()).unwrap(),
            "from c"
        );
    }

    #[tokio::test]
    async fn load_home_skips_hidden_excluded_and_foreign_files() {
        let (_temp, layout) = home().await;
        let today = layout.today_dir();
        save_note(&layout, "b", "bee").await.unwrap();
        save_note(&layout, "a", "ay").await.unwrap();
        fs::write(today.join(".hidden.md"), "x").unwrap();
        fs::write(today.join("scratch.tmp.md"), "x").unwrap();
        fs::write(today.join("image.png"), "x").unwrap();
        fs::create_dir(today.join("folder.md")).unwrap();

        let home = load_home(&layout, &["**/*.tmp.md".to_string()]).await.unwrap();
        let names: Vec<_> = home.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
        assert_eq!(home.files[0].data, "ay");
        assert!(home.tags.is_empty());
    }

    #[tokio::test]
    async fn load_home_without_today_dir_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let layout = HomeLayout::new(temp.path(), NaiveDate::from_ymd_opt(2023, 5, 5).unwrap());
        let home = load_home(&layout, &[]).await.unwrap();
        assert!(home.files.is_empty());
    }

    #[tokio::test]
    async fn open_links_outside_notes_and_dedupes() {
        let (temp, layout) = home().await;
        let outside = temp.path().join("elsewhere");
        fs::create_dir_all(&outside).unwrap();
        let ext_note = outside.join("ideas.md");
        fs::write(&ext_note, "idea").unwrap();
        fs::write(outside.join("photo.jpg"), "jpg").unwrap();

        let opened = open_files(
            &layout,
            &[ext_note.clone(), outside.join("photo.jpg"), ext_note.clone()],
            ConflictPolicy::Overwrite,
        )
        .await
        .unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].name, "ideas.md");
        assert_eq!(opened[0].data, "idea");

        let linked = layout.today_dir().join("ideas.md");
        assert_eq!(identity_of(&linked).await.unwrap(), opened[0].id);
    }

    #[tokio::test]
    async fn open_inside_today_does_not_relink() {
        let (_temp, layout) = home().await;
        let id = save_note(&layout, "here", "x").await.unwrap();
        let opened = open_files(
            &layout,
            &[layout.note_path("here").unwrap()],
            ConflictPolicy::Rename,
        )
        .await
        .unwrap();
        assert_eq!(opened[0].id, id);
        assert!(!layout.today_dir().join("here_1.md").exists());
    }

    #[tokio::test]
    async fn open_keeps_a_different_today_note_with_the_same_name() {
        let (temp, layout) = home().await;
        let kept = save_note(&layout, "ideas", "today's only copy").await.unwrap();
        let outside = temp.path().join("elsewhere");
        fs::create_dir_all(&outside).unwrap();
        let ext_note = outside.join("ideas.md");
        fs::write(&ext_note, "from elsewhere").unwrap();

        for policy in [ConflictPolicy::Overwrite, ConflictPolicy::Skip] {
            let opened = open_files(&layout, &[ext_note.clone()], policy)
                .await
                .unwrap();
            assert_eq!(opened[0].data, "from elsewhere");
            let today_note = layout.note_path("ideas").unwrap();
            assert_eq!(fs::read_to_string(&today_note).unwrap(), "today's only copy");
            assert_eq!(identity_of(&today_note).await.unwrap(), kept);
        }

        open_files(&layout, &[ext_note.clone()], ConflictPolicy::Rename)
            .await
            .unwrap();
        assert_eq!(
            fs::read_to_string(layout.today_dir().join("ideas_1.md")).unwrap(),
            "from elsewhere"
        );
        assert_eq!(
            fs::read_to_string(layout.note_path("ideas").unwrap()).unwrap(),
            "today's only copy"
        );
    }

    #[tokio::test]
    async fn failed_cross_device_link_leaves_today_untouched() {
        let (_temp, layout) = home().await;
        let Ok(other_fs) = tempfile::tempdir_in("/dev/shm") else {
            return;
        };
        let ext_note = other_fs.path().join("ideas.md");
        fs::write(&ext_note, "from tmpfs").unwrap();
        let today_dev = identity_of(&layout.today_dir()).await.unwrap().dev;
        if identity_of(&ext_note).await.unwrap().dev == today_dev {
            return;
        }
        save_note(&layout, "ideas", "today's only copy").await.unwrap();

        for policy in [ConflictPolicy::Overwrite, ConflictPolicy::Rename] {
            let opened = open_files(&layout, &[ext_note.clone()], policy)
                .await
                .unwrap();
            assert_eq!(opened[0].data, "from tmpfs");
            assert_eq!(
                fs::read_to_string(layout.note_path("ideas").unwrap()).unwrap(),
                "today's only copy"
            );
            assert!(!layout.today_dir().join("ideas_1.md").exists());
        }
    }

    #[tokio::test]
    async fn open_through_a_symlinked_root_counts_as_today() {
        let (temp, layout) = home().await;
        let alias = temp.path().join("alias");
        std::os::unix::fs::symlink(layout.root(), &alias).unwrap();
        let id = save_note(&layout, "here", "x").await.unwrap();

        let via_alias = alias.join("2024-01-01").join("here.md");
        assert!(layout.is_today_dir(via_alias.parent().unwrap()).await);
        assert!(!layout.is_today_dir(temp.path()).await);

        let opened = open_files(&layout, &[via_alias], ConflictPolicy::Rename)
            .await
            .unwrap();
        assert_eq!(opened[0].id, id);
        assert!(!layout.today_dir().join("here_1.md").exists());
    }
}
