//! Error type shared by every backend.
//!
//! Each backend translates its native error domain (errno, `io::ErrorKind`,
//! or the in-memory tree's own checks) into an [`ErrorKind`] exactly once.
//! Policy code above the backends only ever matches on that tag.

use std::cell::RefCell;
use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a failed filesystem call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    PermissionDenied,
    NotADirectory,
    IsADirectory,
    DirectoryNotEmpty,
    CrossDevice,
    /// The path could not be handed to the backend (interior NUL, relative path...).
    InvalidInput,
    /// An enumeration callback asked to stop with a failure.
    Aborted,
    /// Any other native failure.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::NotADirectory => "not a directory",
            ErrorKind::IsADirectory => "is a directory",
            ErrorKind::DirectoryNotEmpty => "directory not empty",
            ErrorKind::CrossDevice => "cross-device link",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Aborted => "aborted",
            ErrorKind::Io => "i/o error",
        };
        f.write_str(text)
    }
}

/// A failed filesystem call.
///
/// Displays as `"<context>: <native error text>"`, e.g.
/// `Can't remove path: No such file or directory (os error 2)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{context}: {message}")]
pub struct Error {
    kind: ErrorKind,
    context: &'static str,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            context,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Operation context, e.g. `"Can't stat"`.
    pub fn context(&self) -> &'static str {
        self.context
    }

    /// Native error description.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == ErrorKind::AlreadyExists
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Returns the message of the last error recorded by [`crate::Filesystem`] on
/// the calling thread.
///
/// Purely advisory: every call already returns its error as a `Result`. Other
/// threads never observe or overwrite this value.
pub fn last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

pub fn clear_last_error() {
    LAST_ERROR.with(|slot| slot.borrow_mut().take());
}

pub(crate) fn set_last_error(err: &Error) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(err.to_string()));
}
