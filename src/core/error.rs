use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("coordination file missing: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("locked")]
    Locked,
    #[error("timed out after {polls} polls")]
    TimedOut { polls: u64 },
    #[error("read-only filesystem: {}: {source}", path.display())]
    ReadOnlyFilesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("worker index {index} out of range for {workers} slots")]
    InvalidWorker { index: usize, workers: usize },
    #[error("corrupt coordination file: {0}")]
    Corrupt(&'static str),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless discriminant of [`Error`], used for reporting and matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingFile,
    Locked,
    TimedOut,
    ReadOnlyFilesystem,
    InvalidWorker,
    Corrupt,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingFile => "MissingFile",
            ErrorKind::Locked => "Locked",
            ErrorKind::TimedOut => "TimedOut",
            ErrorKind::ReadOnlyFilesystem => "ReadOnlyFilesystem",
            ErrorKind::InvalidWorker => "InvalidWorker",
            ErrorKind::Corrupt => "Corrupt",
            ErrorKind::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingFile(_) => ErrorKind::MissingFile,
            Error::Locked => ErrorKind::Locked,
            Error::TimedOut { .. } => ErrorKind::TimedOut,
            Error::ReadOnlyFilesystem { .. } => ErrorKind::ReadOnlyFilesystem,
            Error::InvalidWorker { .. } => ErrorKind::InvalidWorker,
            Error::Corrupt(_) => ErrorKind::Corrupt,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Contention is the only condition a caller is expected to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Locked)
    }

    pub(crate) fn read_only(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::ReadOnlyFilesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
