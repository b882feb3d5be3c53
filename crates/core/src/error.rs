use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeError {
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("conflict: {0} is a different file")]
    Conflict(PathBuf),
    #[error("invalid identity key: {0:?}")]
    InvalidId(String),
    #[error("io failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HomeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return HomeError::NotFound(path);
        }
        HomeError::Io { path, source }
    }
}

pub type HomeResult<T> = Result<T, HomeError>;
