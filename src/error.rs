use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Malformed input at line {line}, column {column}: {message}")]
    MalformedInput {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Missing field '{field}' in {}", path.display())]
    MissingField { field: &'static str, path: PathBuf },

    #[error("Invalid value '{value}' for '{field}' in {}", path.display())]
    InvalidField {
        field: &'static str,
        value: String,
        path: PathBuf,
    },

    #[error("Cannot access {} ({kind}): {source}", path.display())]
    PathAccess {
        path: PathBuf,
        kind: PathErrorKind,
        #[source]
        source: io::Error,
    },

    #[error("Refusing to start: {0}")]
    Precondition(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

impl SweepError {
    pub(crate) fn path_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::PathAccess {
            path: path.into(),
            kind: PathErrorKind::classify(&source),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;

/// Coarse classification of a filesystem failure on a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathErrorKind {
    PermissionDenied,
    Busy,
    NotFound,
    Other,
}

impl PathErrorKind {
    pub fn classify(err: &io::Error) -> Self {
        // EBUSY (16) and ETXTBSY (26) have no stable ErrorKind of their own
        #[cfg(unix)]
        if matches!(err.raw_os_error(), Some(16) | Some(26)) {
            return PathErrorKind::Busy;
        }

        match err.kind() {
            io::ErrorKind::PermissionDenied => PathErrorKind::PermissionDenied,
            io::ErrorKind::NotFound => PathErrorKind::NotFound,
            _ => PathErrorKind::Other,
        }
    }
}

impl fmt::Display for PathErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PathErrorKind::PermissionDenied => "permission denied",
            PathErrorKind::Busy => "busy",
            PathErrorKind::NotFound => "not found",
            PathErrorKind::Other => "io error",
        };
        f.write_str(label)
    }
}
