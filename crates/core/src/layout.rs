//! Directory layout under the chosen root.
//!
//! ```text
//! <root>/<YYYY-MM-DD>/<note>.md      today's notes
//! <root>/tags/<tag>/<note>.md        hard links, one directory per tag
//! ```

use crate::config::HomeConfig;
use crate::error::{HomeError, HomeResult};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct HomeLayout {
    root: PathBuf,
    today: NaiveDate,
    tags_dir_name: String,
    extension: String,
}

impl HomeLayout {
    pub fn new(root: impl Into<PathBuf>, today: NaiveDate) -> Self {
        Self {
            root: root.into(),
            today,
            tags_dir_name: "tags".to_string(),
            extension: "md".to_string(),
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, today: NaiveDate, cfg: &HomeConfig) -> Self {
        Self {
            root: root.into(),
            today,
            tags_dir_name: cfg.tags_dir.clone(),
            extension: cfg.extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn today_dir(&self) -> PathBuf {
        self.root.join(self.today.format("%Y-%m-%d").to_string())
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.root.join(&self.tags_dir_name)
    }

    pub fn tag_dir(&self, tag: &str) -> HomeResult<PathBuf> {
        validate_name(tag)?;
        Ok(self.tags_dir().join(tag))
    }

    /// `<today>/<name>.<ext>` for a note's display name.
    pub fn note_path(&self, name: &str) -> HomeResult<PathBuf> {
        Ok(self.today_dir().join(self.note_file_name(name)?))
    }

    pub fn note_file_name(&self, name: &str) -> HomeResult<String> {
        validate_name(name)?;
        Ok(format!("{}.{}", name, self.extension))
    }

    /// On-disk file name for either a display name or a file name that
    /// already carries the note extension.
    pub fn file_name_of(&self, name: &str) -> HomeResult<String> {
        validate_name(name)?;
        if self.has_note_extension(Path::new(name)) {
            return Ok(name.to_string());
        }
        self.note_file_name(name)
    }

    pub fn note_file(&self, name: &str) -> HomeResult<PathBuf> {
        Ok(self.today_dir().join(self.file_name_of(name)?))
    }

    pub fn has_note_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    pub async fn is_today_dir(&self, dir: &Path) -> bool {
        let today = self.today_dir();
        if dir == today {
            return true;
        }
        match (
            tokio::fs::canonicalize(dir).await,
            tokio::fs::canonicalize(&today).await,
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    pub async fn ensure_dirs(&self) -> HomeResult<()> {
        let today = self.today_dir();
        tokio::fs::create_dir_all(&today)
            .await
            .map_err(|e| HomeError::io(&today, e))
    }
}

/// Rejects names that would escape their directory or are not a single entry.
pub fn validate_name(name: &str) -> HomeResult<()> {
    let bad = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(HomeError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
}
