//! Stable file identity derived from the filesystem `(device, inode)` pair.
//!
//! Every directory entry that points at the same inode yields the same
//! [`FileId`], so a note and each of its tag links share one key. The key
//! survives renames within a filesystem.

use crate::error::{HomeError, HomeResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::Metadata;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId {
    pub dev: u64,
    pub ino: u64,
}

impl FileId {
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> HomeResult<Self> {
        use std::os::unix::fs::MetadataExt;
        Ok(Self::new(meta.dev(), meta.ino()))
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_meta: &Metadata) -> HomeResult<Self> {
        Err(HomeError::Unsupported(
            "device/inode identity requires a unix filesystem",
        ))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.dev, self.ino)
    }
}

impl FromStr for FileId {
    type Err = HomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dev, ino) = s
            .split_once('-')
            .ok_or_else(|| HomeError::InvalidId(s.to_string()))?;
        let dev = dev
            .parse()
            .map_err(|_| HomeError::InvalidId(s.to_string()))?;
        let ino = ino
            .parse()
            .map_err(|_| HomeError::InvalidId(s.to_string()))?;
        Ok(Self::new(dev, ino))
    }
}

impl Serialize for FileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Stats `path` (following symlinks) and returns its identity.
pub async fn identity_of(path: &Path) -> HomeResult<FileId> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| HomeError::io(path, e))?;
    FileId::from_metadata(&meta)
}
