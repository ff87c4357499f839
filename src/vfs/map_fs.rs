//! This module provides a backend that keeps a directory tree in memory and
//! answers the five primitives with POSIX-like semantics, without touching the
//! host filesystem.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use tracing::trace;

use super::entry::Entry;
use crate::core::{EnumerateCallback, EnumerationResult, FsBackend, Result, finish_enumeration, policy, utils};
use crate::{Error, ErrorKind, PathInfo, PathType};

const OPEN_DIR: &str = "Can't open directory";
const REMOVE: &str = "Can't remove path";
const RENAME: &str = "Can't rename path";
const MKDIR: &str = "Can't create directory";
const STAT: &str = "Can't stat";
const CREATE_FILE: &str = "Can't create file";

type Tree = BTreeMap<PathBuf, Entry>;

/// An in-memory backend, useful as a sandbox and in tests.
///
/// ### Internal state
///
/// * `entries` — every node of the tree keyed by its absolute normalized path.
///   `BTreeMap` keeps a directory's descendants in one contiguous range.
/// * `clock` — source of the epoch seconds stamped on created and modified
///   entries.
///
/// ### Invariants
///
/// 1. **Root existence**: `/` is always present and is a directory.
/// 2. **Parent consistency**: for any entry at `/a/b/c` there is a directory
///    entry at `/a/b`.
/// 3. Only absolute paths are accepted; `.` and `..` are resolved lexically.
///
/// ### Thread Safety
///
/// The tree sits behind a `RwLock`. The lock is released before an
/// enumeration callback runs, so callbacks may call back into the same
/// `MapFS`.
///
/// ### Example
///
/// ```
/// use std::path::Path;
/// use fsops_kit::{FsBackend, MapFS, PathType};
///
/// let fs = MapFS::new();
/// fs.mkdir(Path::new("/docs")).unwrap();
/// fs.create_file(Path::new("/docs/note.txt"), 5).unwrap();
///
/// let info = fs.stat(Path::new("/docs/note.txt")).unwrap();
/// assert_eq!(info.path_type, PathType::File);
/// assert_eq!(info.size, 5);
/// ```
#[derive(Debug)]
pub struct MapFS {
    entries: RwLock<Tree>,
    clock: fn() -> i64,
}

fn system_clock() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(_) => 0,
    }
}

fn not_found(context: &'static str, path: &Path) -> Error {
    Error::new(
        ErrorKind::NotFound,
        context,
        format!("no such file or directory: {}", path.display()),
    )
}

fn not_a_directory(context: &'static str, path: &Path) -> Error {
    Error::new(
        ErrorKind::NotADirectory,
        context,
        format!("not a directory: {}", path.display()),
    )
}

impl MapFS {
    /// Creates a tree holding only the root directory, stamped with the
    /// system clock.
    pub fn new() -> Self {
        Self::with_clock(system_clock)
    }

    /// Creates a tree whose timestamps come from `clock`.
    pub fn with_clock(clock: fn() -> i64) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::new(PathType::Directory, 0, clock()));
        Self {
            entries: RwLock::new(entries),
            clock,
        }
    }

    /// Creates (or truncates to `size`) a regular file. The parent directory
    /// must exist.
    pub fn create_file(&self, path: &Path, size: u64) -> Result<()> {
        self.insert_leaf(path, PathType::File, size)
    }

    /// Creates an entry that is neither a file nor a directory, standing in
    /// for a device, FIFO or socket.
    pub fn create_special(&self, path: &Path) -> Result<()> {
        self.insert_leaf(path, PathType::Other, 0)
    }

    fn insert_leaf(&self, path: &Path, entry_type: PathType, size: u64) -> Result<()> {
        let path = resolve(path, CREATE_FILE)?;
        let now = (self.clock)();
        let mut entries = self.entries.write();
        check_ancestors(&entries, &path, CREATE_FILE)?;
        if entries.get(&path).is_some_and(Entry::is_dir) {
            return Err(Error::new(
                ErrorKind::IsADirectory,
                CREATE_FILE,
                format!("is a directory: {}", path.display()),
            ));
        }
        entries.insert(path.clone(), Entry::new(entry_type, size, now));
        touch_parent(&mut entries, &path, now);
        Ok(())
    }

    fn remove_locked(&self, entries: &mut Tree, path: &Path) -> Result<()> {
        if utils::is_root(path) {
            return Err(Error::new(
                ErrorKind::PermissionDenied,
                REMOVE,
                "the root cannot be removed",
            ));
        }
        check_ancestors(entries, path, REMOVE)?;
        let entry = entries.get(path).ok_or_else(|| not_found(REMOVE, path))?;
        if entry.is_dir() && has_children(entries, path) {
            return Err(Error::new(
                ErrorKind::DirectoryNotEmpty,
                REMOVE,
                format!("directory not empty: {}", path.display()),
            ));
        }
        entries.remove(path);
        touch_parent(entries, path, (self.clock)());
        Ok(())
    }

    fn rename_locked(&self, entries: &mut Tree, old: &Path, new: &Path) -> Result<()> {
        check_ancestors(entries, old, RENAME)?;
        let source = entries.get(old).ok_or_else(|| not_found(RENAME, old))?;
        let source_is_dir = source.is_dir();
        check_ancestors(entries, new, RENAME)?;

        if old == new {
            return Ok(());
        }
        if utils::is_root(old) || new.starts_with(old) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                RENAME,
                format!("cannot move {} into itself", old.display()),
            ));
        }

        if let Some(target) = entries.get(new) {
            match (source_is_dir, target.is_dir()) {
                (true, false) => return Err(not_a_directory(RENAME, new)),
                (false, true) => {
                    return Err(Error::new(
                        ErrorKind::IsADirectory,
                        RENAME,
                        format!("is a directory: {}", new.display()),
                    ));
                }
                (true, true) if has_children(entries, new) => {
                    return Err(Error::new(
                        ErrorKind::DirectoryNotEmpty,
                        RENAME,
                        format!("directory not empty: {}", new.display()),
                    ));
                }
                _ => {}
            }
            entries.remove(new);
        }

        let moved: Vec<PathBuf> = entries
            .range(old.to_path_buf()..)
            .map(|(path, _)| path)
            .take_while(|path| path.starts_with(old))
            .cloned()
            .collect();
        for from in moved {
            if let Some(entry) = entries.remove(&from) {
                let to = match from.strip_prefix(old) {
                    Ok(rest) if !rest.as_os_str().is_empty() => new.join(rest),
                    _ => new.to_path_buf(),
                };
                entries.insert(to, entry);
            }
        }

        let now = (self.clock)();
        touch_parent(entries, old, now);
        touch_parent(entries, new, now);
        Ok(())
    }

    fn mkdir_locked(&self, entries: &mut Tree, path: &Path) -> Result<()> {
        if entries.contains_key(path) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                MKDIR,
                format!("file exists: {}", path.display()),
            ));
        }
        check_ancestors(entries, path, MKDIR)?;
        let now = (self.clock)();
        entries.insert(path.to_path_buf(), Entry::new(PathType::Directory, 0, now));
        touch_parent(entries, path, now);
        Ok(())
    }
}

impl Default for MapFS {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts only absolute paths and resolves `.`/`..` in them.
fn resolve(path: &Path, context: &'static str) -> Result<PathBuf> {
    if !path.has_root() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            context,
            format!("path must be absolute: {}", path.display()),
        ));
    }
    Ok(utils::normalize(path))
}

/// Every directory above `path` must exist and be a directory.
fn check_ancestors(entries: &Tree, path: &Path, context: &'static str) -> Result<()> {
    let mut ancestors: Vec<&Path> = path.ancestors().skip(1).collect();
    ancestors.reverse();
    for dir in ancestors {
        match entries.get(dir) {
            None => return Err(not_found(context, path)),
            Some(entry) if !entry.is_dir() => return Err(not_a_directory(context, path)),
            Some(_) => {}
        }
    }
    Ok(())
}

fn children(entries: &Tree, dir: &Path) -> impl Iterator<Item = PathBuf> {
    entries
        .range(dir.to_path_buf()..)
        .map(|(path, _)| path)
        .take_while(move |path| path.starts_with(dir))
        .filter(move |path| path.parent() == Some(dir))
        .cloned()
}

fn has_children(entries: &Tree, dir: &Path) -> bool {
    children(entries, dir).next().is_some()
}

fn touch_parent(entries: &mut Tree, path: &Path, now: i64) {
    if let Some(parent) = path.parent().and_then(|parent| entries.get_mut(parent)) {
        parent.touch(now);
    }
}

impl FsBackend for MapFS {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn enumerate(
        &self,
        fullpath: &Path,
        dirname: &Path,
        callback: &mut EnumerateCallback<'_>,
    ) -> Result<EnumerationResult> {
        trace!(path = %fullpath.display(), "enumerate");
        let path = resolve(fullpath, OPEN_DIR)?;
        let names: Vec<OsString> = {
            let entries = self.entries.read();
            check_ancestors(&entries, &path, OPEN_DIR)?;
            match entries.get(&path) {
                None => return Err(not_found(OPEN_DIR, &path)),
                Some(entry) if !entry.is_dir() => return Err(not_a_directory(OPEN_DIR, &path)),
                Some(_) => {}
            }
            children(&entries, &path)
                .filter_map(|child| child.file_name().map(|name| name.to_os_string()))
                .collect()
        };

        let mut signal = EnumerationResult::Continue;
        for name in &names {
            signal = callback(dirname, name);
            if signal != EnumerationResult::Continue {
                break;
            }
        }

        finish_enumeration(signal, dirname)
    }

    fn remove(&self, fullpath: &Path) -> Result<()> {
        trace!(path = %fullpath.display(), "remove");
        let path = resolve(fullpath, REMOVE)?;
        let removed = {
            let mut entries = self.entries.write();
            self.remove_locked(&mut entries, &path)
        };
        removed.or_else(|err| policy::absorb_missing_target(err, &path, |parent| self.stat(parent)))
    }

    fn rename(&self, old: &Path, new: &Path) -> Result<()> {
        trace!(from = %old.display(), to = %new.display(), "rename");
        let old = resolve(old, RENAME)?;
        let new = resolve(new, RENAME)?;
        let mut entries = self.entries.write();
        self.rename_locked(&mut entries, &old, &new)
    }

    fn mkdir(&self, fullpath: &Path) -> Result<()> {
        trace!(path = %fullpath.display(), "mkdir");
        let path = resolve(fullpath, MKDIR)?;
        let created = {
            let mut entries = self.entries.write();
            self.mkdir_locked(&mut entries, &path)
        };
        created.or_else(|err| policy::absorb_existing_dir(err, &path, |path| self.stat(path)))
    }

    fn stat(&self, fullpath: &Path) -> Result<PathInfo> {
        let path = resolve(fullpath, STAT)?;
        let entries = self.entries.read();
        match entries.get(&path) {
            Some(entry) => Ok(entry.info()),
            None => {
                check_ancestors(&entries, &path, STAT)?;
                Err(not_found(STAT, &path))
            }
        }
    }
}
