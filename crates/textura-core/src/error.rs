use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    InvalidArguments = 2,
    Io = 3,
    InvalidScript = 4,
    NoPath = 5,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::Failure),
            2 => Some(Self::InvalidArguments),
            3 => Some(Self::Io),
            4 => Some(Self::InvalidScript),
            5 => Some(Self::NoPath),
            _ => None,
        }
    }
}

/// Failures raised by the persistence collaborator and the script reader.
///
/// Buffer, history, notification and rendering operations are total and
/// never produce one of these.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("document has no path; use save-as first")]
    NoPath,

    #[error("invalid script at line {line}: {message}")]
    InvalidScript { line: usize, message: String },
}

impl EditorError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io { .. } => ExitCode::Io,
            Self::NoPath => ExitCode::NoPath,
            Self::InvalidScript { .. } => ExitCode::InvalidScript,
        }
    }
}

pub type EditorResult<T> = Result<T, EditorError>;
