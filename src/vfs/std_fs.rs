//! Backend over the portable `std::fs` API. This is the native backend on
//! targets without libc (Windows and friends).

use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

use crate::core::{EnumerateCallback, EnumerationResult, FsBackend, Result, finish_enumeration, policy};
use crate::{DEFAULT_DIR_MODE, Error, ErrorKind, PathInfo, PathType};

const OPEN_DIR: &str = "Can't open directory";
const READ_DIR: &str = "Can't read directory";
const REMOVE: &str = "Can't remove path";
const RENAME: &str = "Can't rename path";
const MKDIR: &str = "Can't create directory";
const STAT: &str = "Can't stat";

/// Backend built on `std::fs`.
///
/// Overwrite behaviour of [`FsBackend::rename`] is whatever the platform's
/// `std::fs::rename` does (replace on Unix, `MoveFileExW` rules on Windows).
#[derive(Debug, Clone)]
pub struct StdFS {
    dir_mode: u32,
}

impl StdFS {
    pub fn new() -> Self {
        Self {
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    /// Sets the permission bits used for new directories. Ignored on
    /// platforms without Unix permissions.
    pub fn with_dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    pub fn dir_mode(&self) -> u32 {
        self.dir_mode
    }

    fn create_dir(&self, fullpath: &Path) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.dir_mode);
        }
        builder.create(fullpath)
    }
}

impl Default for StdFS {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps an `io::Error` onto the shared error tags.
fn translate(context: &'static str, err: io::Error) -> Error {
    let kind = match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
        io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
        io::ErrorKind::NotADirectory => ErrorKind::NotADirectory,
        io::ErrorKind::IsADirectory => ErrorKind::IsADirectory,
        io::ErrorKind::DirectoryNotEmpty => ErrorKind::DirectoryNotEmpty,
        io::ErrorKind::CrossesDevices => ErrorKind::CrossDevice,
        io::ErrorKind::InvalidInput => ErrorKind::InvalidInput,
        _ => ErrorKind::Io,
    };
    Error::new(kind, context, err.to_string())
}

/// Whole seconds relative to the Unix epoch; `0` when the platform does not
/// record the timestamp.
fn epoch_seconds(time: io::Result<SystemTime>) -> i64 {
    match time {
        Ok(time) => match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs() as i64,
            Err(before) => -(before.duration().as_secs() as i64),
        },
        Err(_) => 0,
    }
}

fn path_info(meta: &fs::Metadata) -> PathInfo {
    let path_type = if meta.is_file() {
        PathType::File
    } else if meta.is_dir() {
        PathType::Directory
    } else {
        PathType::Other
    };
    PathInfo::new(
        path_type,
        meta.len(),
        epoch_seconds(meta.created()),
        epoch_seconds(meta.modified()),
        epoch_seconds(meta.accessed()),
    )
}

impl FsBackend for StdFS {
    fn name(&self) -> &'static str {
        "std"
    }

    fn enumerate(
        &self,
        fullpath: &Path,
        dirname: &Path,
        callback: &mut EnumerateCallback<'_>,
    ) -> Result<EnumerationResult> {
        trace!(path = %fullpath.display(), "enumerate");
        let entries = fs::read_dir(fullpath).map_err(|e| translate(OPEN_DIR, e))?;

        let mut signal = EnumerationResult::Continue;
        for entry in entries {
            let entry = entry.map_err(|e| translate(READ_DIR, e))?;
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }
            signal = callback(dirname, &name);
            if signal != EnumerationResult::Continue {
                break;
            }
        }

        finish_enumeration(signal, dirname)
    }

    fn remove(&self, fullpath: &Path) -> Result<()> {
        trace!(path = %fullpath.display(), "remove");
        // std has no single call for "file or empty directory"; pick by the
        // entry itself, not by what a symlink points to.
        let removed = fs::symlink_metadata(fullpath).and_then(|meta| {
            if meta.is_dir() {
                fs::remove_dir(fullpath)
            } else {
                fs::remove_file(fullpath)
            }
        });
        match removed {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = translate(REMOVE, e);
                policy::absorb_missing_target(err, fullpath, |parent| self.stat(parent))
            }
        }
    }

    fn rename(&self, old: &Path, new: &Path) -> Result<()> {
        trace!(from = %old.display(), to = %new.display(), "rename");
        fs::rename(old, new).map_err(|e| translate(RENAME, e))
    }

    fn mkdir(&self, fullpath: &Path) -> Result<()> {
        trace!(path = %fullpath.display(), "mkdir");
        match self.create_dir(fullpath) {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = translate(MKDIR, e);
                policy::absorb_existing_dir(err, fullpath, |path| self.stat(path))
            }
        }
    }

    fn stat(&self, fullpath: &Path) -> Result<PathInfo> {
        let meta = fs::metadata(fullpath).map_err(|e| translate(STAT, e))?;
        Ok(path_info(&meta))
    }
}
