use std::{error, fmt, io};

/// An error that occurred while building an object file.
#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

#[derive(Debug)]
enum ErrorInner {
    NotFound(String),
    Io(io::Error),
    Malformed(String),
    ParseInt(String),
    Write(rspobj::write::Error),
}

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input file does not exist.
    NotFound,
    /// An I/O error occurred while reading an input or writing the output.
    Io(io::ErrorKind),
    /// An input file is syntactically invalid.
    Malformed,
    /// A numeric field of an input file failed to parse.
    ParseInt,
    /// An error occurred while serializing the output file.
    Write,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ErrorInner::NotFound(path) => write!(f, "Input file '{}' does not exist", path),
            ErrorInner::Io(e) => e.fmt(f),
            ErrorInner::Malformed(message) => f.write_str(message),
            ErrorInner::ParseInt(message) => f.write_str(message),
            ErrorInner::Write(e) => e.fmt(f),
        }
    }
}

impl error::Error for Error {}

impl Error {
    /// Get the kind of error.
    pub fn kind(&self) -> ErrorKind {
        match &self.inner {
            ErrorInner::NotFound(_) => ErrorKind::NotFound,
            ErrorInner::Io(e) => ErrorKind::Io(e.kind()),
            ErrorInner::Malformed(_) => ErrorKind::Malformed,
            ErrorInner::ParseInt(_) => ErrorKind::ParseInt,
            ErrorInner::Write(_) => ErrorKind::Write,
        }
    }

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::NotFound(path.into()),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Malformed(message.into()),
        }
    }

    pub(crate) fn parse_int(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::ParseInt(message.into()),
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self {
            inner: ErrorInner::Io(error),
        }
    }
}

impl From<rspobj::write::Error> for Error {
    fn from(error: rspobj::write::Error) -> Self {
        Self {
            inner: ErrorInner::Write(error),
        }
    }
}

/// The `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
