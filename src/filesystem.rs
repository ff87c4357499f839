//! The dispatch facade: one entry point over whichever backend was picked.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::{EnumerationResult, FsBackend, Result};
use crate::error::set_last_error;
use crate::search::{self, GlobOptions};
use crate::{NativeFS, PathInfo};

/// Uniform filesystem operations over a single backend.
///
/// Every method returns its error directly and also stores the message in
/// the calling thread's advisory slot (see [`crate::last_error`]).
///
/// ### Example:
/// ```
/// use fsops_kit::{Filesystem, MapFS, PathType};
///
/// let fs = Filesystem::new(MapFS::new());
/// fs.create_directory_all("/docs/drafts").unwrap();
/// fs.create_directory("/docs/drafts").unwrap(); // already there: fine
///
/// assert_eq!(fs.path_info("/docs").unwrap().path_type, PathType::Directory);
/// fs.remove("/docs/drafts").unwrap();
/// fs.remove("/docs/drafts").unwrap(); // already gone: fine
/// ```
pub struct Filesystem {
    backend: Box<dyn FsBackend>,
}

impl Filesystem {
    /// Uses the backend compiled in for this target ([`NativeFS`]).
    pub fn native() -> Self {
        Self::new(NativeFS::default())
    }

    pub fn new<B: FsBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn backend(&self) -> &dyn FsBackend {
        self.backend.as_ref()
    }

    /// Calls `callback(path, entry_name)` for each entry of the directory.
    /// See [`FsBackend::enumerate`] for the meaning of the result.
    pub fn enumerate<P, F>(&self, path: P, mut callback: F) -> Result<EnumerationResult>
    where
        P: AsRef<Path>,
        F: FnMut(&Path, &OsStr) -> EnumerationResult,
    {
        let path = path.as_ref();
        record(self.backend.enumerate(path, path, &mut callback))
    }

    pub fn remove<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        record(self.backend.remove(path.as_ref()))
    }

    pub fn rename<P: AsRef<Path>, Q: AsRef<Path>>(&self, old: P, new: Q) -> Result<()> {
        record(self.backend.rename(old.as_ref(), new.as_ref()))
    }

    pub fn create_directory<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        record(self.backend.mkdir(path.as_ref()))
    }

    /// Creates `path` and any missing parents.
    pub fn create_directory_all<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        record(self.mkdir_all(path.as_ref()))
    }

    pub fn path_info<P: AsRef<Path>>(&self, path: P) -> Result<PathInfo> {
        record(self.backend.stat(path.as_ref()))
    }

    /// `Ok(false)` only when the backend reports the path as not found.
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        match self.backend.stat(path.as_ref()) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => record(Err(err)),
        }
    }

    /// Recursively lists `path`, keeping entries whose relative
    /// `/`-separated path matches `pattern` (`*` never crosses a `/`).
    /// `None` keeps everything. Order is unspecified.
    pub fn glob_directory<P: AsRef<Path>>(
        &self,
        path: P,
        pattern: Option<&str>,
        options: GlobOptions,
    ) -> Result<Vec<String>> {
        record(search::glob_directory(
            self.backend.as_ref(),
            path.as_ref(),
            pattern,
            options,
        ))
    }

    /// Starts from the closest existing ancestor and creates the rest one
    /// level at a time.
    fn mkdir_all(&self, path: &Path) -> Result<()> {
        let mut missing: Vec<PathBuf> = Vec::new();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() || self.backend.stat(ancestor).is_ok() {
                break;
            }
            missing.push(ancestor.to_path_buf());
        }

        for dir in missing.iter().rev() {
            debug!(path = %dir.display(), "creating missing directory");
            self.backend.mkdir(dir)?;
        }
        // Surfaces "exists but is not a directory" when nothing was missing.
        self.backend.mkdir(path)
    }
}

impl Default for Filesystem {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filesystem")
            .field("backend", &self.backend.name())
            .finish()
    }
}

fn record<T>(result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        set_last_error(err);
    }
    result
}
