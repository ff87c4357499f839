//! Uniform filesystem primitives over interchangeable backends.
//!
//! ### Overview
//!
//! `fsops-kit` puts five operations (enumerate a directory, remove, rename,
//! create a directory, query metadata) behind the [`FsBackend`] trait, so
//! code above it never branches on the operating system. Backends:
//!
//! - [`PosixFS`]: raw libc calls (Unix).
//! - [`StdFS`]: the portable `std::fs` API (the native choice elsewhere).
//! - [`MapFS`]: an in-memory tree, for sandboxes and tests.
//!
//! [`Filesystem`] dispatches to one of them; [`Filesystem::native`] picks
//! [`NativeFS`], selected at compile time.
//!
//! **Key rules**:
//! - **Idempotent remove**: removing a missing path succeeds if its parent exists.
//! - **Idempotent mkdir**: creating an existing directory succeeds; an existing
//!   non-directory is still an error.
//! - **Stable metadata**: [`PathInfo`] carries a [`PathType`], a size that is
//!   always `0` for directories, and three epoch-second timestamps.
//! - **One error type**: every native failure becomes an [`Error`] tagged with
//!   an [`ErrorKind`] and displayed as `"<context>: <native text>"`.

mod core;
mod error;
mod filesystem;
mod info;
mod search;
mod vfs;

pub use self::core::{EnumerateCallback, EnumerationResult, FsBackend, Result};
pub use error::{Error, ErrorKind, clear_last_error, last_error};
pub use filesystem::Filesystem;
pub use info::{PathInfo, PathType};
pub use search::GlobOptions;
#[cfg(unix)]
pub use vfs::PosixFS;
pub use vfs::{MapFS, NativeFS, StdFS};

/// Permission bits requested for new directories unless a backend is
/// configured otherwise.
pub const DEFAULT_DIR_MODE: u32 = 0o770;
