//! Idempotence rules shared by every backend.
//!
//! Both run only after the native call has already failed and inspect the
//! error tag, never a platform error code. There is a window between the
//! failed call and the verifying `stat` in which another actor can change the
//! path; that race is accepted.

use std::path::Path;

use tracing::debug;

use crate::core::utils;
use crate::{Error, PathInfo, Result};

/// `remove` fallback: a missing target counts as removed when its parent
/// directory is still there. Any other failure, or a missing parent, returns
/// the original error.
pub(crate) fn absorb_missing_target<F>(err: Error, fullpath: &Path, stat: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<PathInfo>,
{
    if !err.is_not_found() {
        return Err(err);
    }
    let parent = utils::parent_or_cwd(fullpath);
    match stat(parent) {
        Ok(_) => {
            debug!(path = %fullpath.display(), "already removed, parent exists");
            Ok(())
        }
        Err(_) => Err(err),
    }
}

/// `mkdir` fallback: an existing directory counts as created. An existing
/// non-directory returns the original error.
pub(crate) fn absorb_existing_dir<F>(err: Error, fullpath: &Path, stat: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<PathInfo>,
{
    if !err.is_already_exists() {
        return Err(err);
    }
    match stat(fullpath) {
        Ok(info) if info.is_dir() => {
            debug!(path = %fullpath.display(), "directory already exists");
            Ok(())
        }
        _ => Err(err),
    }
}
