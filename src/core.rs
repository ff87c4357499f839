use std::ffi::OsStr;
use std::path::Path;

use crate::PathInfo;

pub(crate) mod policy;
pub(crate) mod utils;

pub use crate::error::Result;

/// Signal returned by an enumeration callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnumerationResult {
    /// Keep scanning.
    Continue,
    /// Stop now; the enumeration succeeded.
    Success,
    /// Stop now; the enumeration failed.
    Failure,
}

/// Per-entry callback: receives the caller's display name of the directory
/// and the entry name.
pub type EnumerateCallback<'a> = dyn FnMut(&Path, &OsStr) -> EnumerationResult + 'a;

/// The five primitives every backend adapter provides.
///
/// All paths are fully resolved absolute native paths. Every call is
/// synchronous and performs one native operation sequence (two for the
/// idempotent `remove` and `mkdir` fallbacks).
pub trait FsBackend: Send + Sync {
    /// Short backend name, used in log records.
    fn name(&self) -> &'static str;

    /// Calls `callback` once per entry of the directory at `fullpath`, in
    /// native order, skipping `.` and `..`.
    ///
    /// Returns `Ok(Continue)` when every entry was visited, `Ok(Success)` when
    /// the callback stopped early, and an [`ErrorKind::Aborted`] error when it
    /// returned [`EnumerationResult::Failure`].
    ///
    /// [`ErrorKind::Aborted`]: crate::ErrorKind::Aborted
    fn enumerate(
        &self,
        fullpath: &Path,
        dirname: &Path,
        callback: &mut EnumerateCallback<'_>,
    ) -> Result<EnumerationResult>;

    /// Removes a file or an empty directory. A missing target whose parent
    /// exists counts as removed.
    fn remove(&self, fullpath: &Path) -> Result<()>;

    /// Renames `old` to `new` with native semantics.
    fn rename(&self, old: &Path, new: &Path) -> Result<()>;

    /// Creates a directory. An existing directory at `fullpath` counts as
    /// created.
    fn mkdir(&self, fullpath: &Path) -> Result<()>;

    /// Queries metadata, following symlinks.
    fn stat(&self, fullpath: &Path) -> Result<PathInfo>;
}

/// Converts the callback's final signal into the enumeration result.
pub(crate) fn finish_enumeration(signal: EnumerationResult, dirname: &Path) -> Result<EnumerationResult> {
    match signal {
        EnumerationResult::Failure => Err(crate::Error::new(
            crate::ErrorKind::Aborted,
            "Enumeration stopped",
            format!("callback failed in {}", dirname.display()),
        )),
        other => Ok(other),
    }
}
