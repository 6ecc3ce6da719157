use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rejection of a submitted command line before anything touches the filesystem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

/// A single failed filesystem step. Tree walks collect these instead of stopping.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{op} failed on {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("walk aborted at {}: more than {limit} open directories", .path.display())]
    DescriptorLimit { path: PathBuf, limit: usize },

    #[error("refusing to copy {} onto itself", .path.display())]
    SelfCopy { path: PathBuf },

    #[error("not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },
}

impl FsError {
    pub fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}
