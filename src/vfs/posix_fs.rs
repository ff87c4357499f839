//! Backend over raw POSIX calls: `opendir`/`readdir`, `remove`, `rename`,
//! `mkdir` and `stat`.
//!
//! Every failure is read from `errno` right after the call and translated
//! once, in [`translate`]; the idempotence rules then work on the tag.

use std::ffi::{CStr, CString, OsStr};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr::NonNull;

use errno::{Errno, errno, set_errno};
use tracing::{trace, warn};

use crate::core::{EnumerateCallback, EnumerationResult, FsBackend, Result, finish_enumeration, policy};
use crate::{DEFAULT_DIR_MODE, Error, ErrorKind, PathInfo, PathType};

const OPEN_DIR: &str = "Can't open directory";
const READ_DIR: &str = "Can't read directory";
const REMOVE: &str = "Can't remove path";
const RENAME: &str = "Can't rename path";
const MKDIR: &str = "Can't create directory";
const STAT: &str = "Can't stat";

/// Backend calling libc directly. Unix only.
///
/// ### Example:
/// ```no_run
/// use std::path::Path;
/// use fsops_kit::{FsBackend, PosixFS};
///
/// let fs = PosixFS::new();
/// fs.mkdir(Path::new("/tmp/fsops_docs")).unwrap();
/// assert!(fs.stat(Path::new("/tmp/fsops_docs")).unwrap().is_dir());
/// fs.remove(Path::new("/tmp/fsops_docs")).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct PosixFS {
    dir_mode: u32,
}

impl PosixFS {
    /// Creates the backend with the default directory mode (`0o770`).
    pub fn new() -> Self {
        Self {
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    /// Sets the permission bits passed to `mkdir` (still subject to umask).
    pub fn with_dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    pub fn dir_mode(&self) -> u32 {
        self.dir_mode
    }
}

impl Default for PosixFS {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps an errno value onto the shared error tags.
fn translate(context: &'static str, err: io::Error) -> Error {
    let kind = match err.raw_os_error() {
        Some(libc::ENOENT) => ErrorKind::NotFound,
        Some(libc::EEXIST) => ErrorKind::AlreadyExists,
        Some(libc::EACCES) | Some(libc::EPERM) => ErrorKind::PermissionDenied,
        Some(libc::ENOTDIR) => ErrorKind::NotADirectory,
        Some(libc::EISDIR) => ErrorKind::IsADirectory,
        Some(libc::ENOTEMPTY) => ErrorKind::DirectoryNotEmpty,
        Some(libc::EXDEV) => ErrorKind::CrossDevice,
        Some(libc::EINVAL) | Some(libc::ENAMETOOLONG) => ErrorKind::InvalidInput,
        _ => ErrorKind::Io,
    };
    Error::new(kind, context, err.to_string())
}

fn last_error(context: &'static str) -> Error {
    translate(context, io::Error::last_os_error())
}

fn to_cstring(path: &Path, context: &'static str) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        Error::new(
            ErrorKind::InvalidInput,
            context,
            format!("path contains a nul byte: {}", path.display()),
        )
    })
}

/// Open directory stream, closed on drop.
struct DirHandle(NonNull<libc::DIR>);

impl DirHandle {
    fn open(path: &CStr) -> io::Result<Self> {
        // SAFETY: `path` is a valid NUL-terminated string.
        let dir = unsafe { libc::opendir(path.as_ptr()) };
        NonNull::new(dir).map(Self).ok_or_else(io::Error::last_os_error)
    }

    /// Next entry name, or `None` at the end of the stream.
    ///
    /// `readdir` returns NULL both at the end and on failure; only errno
    /// tells them apart, so it is cleared before every call.
    fn next_name(&mut self) -> io::Result<Option<&OsStr>> {
        set_errno(Errno(0));
        // SAFETY: the stream is open for as long as `self` lives.
        let ent = unsafe { libc::readdir(self.0.as_ptr()) };
        if ent.is_null() {
            return match errno() {
                Errno(0) => Ok(None),
                Errno(code) => Err(io::Error::from_raw_os_error(code)),
            };
        }
        // SAFETY: `d_name` is NUL-terminated and valid until the next
        // `readdir` on this stream, which needs `&mut self` again.
        let name = unsafe { CStr::from_ptr((*ent).d_name.as_ptr()) };
        Ok(Some(OsStr::from_bytes(name.to_bytes())))
    }
}

impl Drop for DirHandle {
    fn drop(&mut self) {
        // SAFETY: the stream was returned by `opendir` and is closed only here.
        if unsafe { libc::closedir(self.0.as_ptr()) } != 0 {
            warn!("closedir failed: {}", io::Error::last_os_error());
        }
    }
}

fn mode_to_type(mode: libc::mode_t) -> PathType {
    match mode & libc::S_IFMT {
        libc::S_IFREG => PathType::File,
        libc::S_IFDIR => PathType::Directory,
        _ => PathType::Other,
    }
}

impl FsBackend for PosixFS {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn enumerate(
        &self,
        fullpath: &Path,
        dirname: &Path,
        callback: &mut EnumerateCallback<'_>,
    ) -> Result<EnumerationResult> {
        trace!(path = %fullpath.display(), "enumerate");
        let cpath = to_cstring(fullpath, OPEN_DIR)?;
        let mut dir = DirHandle::open(&cpath).map_err(|e| translate(OPEN_DIR, e))?;

        let mut signal = EnumerationResult::Continue;
        while signal == EnumerationResult::Continue {
            let Some(name) = dir.next_name().map_err(|e| translate(READ_DIR, e))? else {
                break;
            };
            if name == "." || name == ".." {
                continue;
            }
            signal = callback(dirname, name);
        }
        drop(dir);

        finish_enumeration(signal, dirname)
    }

    fn remove(&self, fullpath: &Path) -> Result<()> {
        trace!(path = %fullpath.display(), "remove");
        let cpath = to_cstring(fullpath, REMOVE)?;
        // SAFETY: `cpath` is a valid NUL-terminated string.
        if unsafe { libc::remove(cpath.as_ptr()) } < 0 {
            let err = last_error(REMOVE);
            return policy::absorb_missing_target(err, fullpath, |parent| self.stat(parent));
        }
        Ok(())
    }

    fn rename(&self, old: &Path, new: &Path) -> Result<()> {
        trace!(from = %old.display(), to = %new.display(), "rename");
        let cold = to_cstring(old, RENAME)?;
        let cnew = to_cstring(new, RENAME)?;
        // SAFETY: both are valid NUL-terminated strings.
        if unsafe { libc::rename(cold.as_ptr(), cnew.as_ptr()) } < 0 {
            return Err(last_error(RENAME));
        }
        Ok(())
    }

    fn mkdir(&self, fullpath: &Path) -> Result<()> {
        trace!(path = %fullpath.display(), mode = self.dir_mode, "mkdir");
        let cpath = to_cstring(fullpath, MKDIR)?;
        // SAFETY: `cpath` is a valid NUL-terminated string.
        if unsafe { libc::mkdir(cpath.as_ptr(), self.dir_mode as libc::mode_t) } < 0 {
            let err = last_error(MKDIR);
            return policy::absorb_existing_dir(err, fullpath, |path| self.stat(path));
        }
        Ok(())
    }

    fn stat(&self, fullpath: &Path) -> Result<PathInfo> {
        let cpath = to_cstring(fullpath, STAT)?;
        let mut buf = MaybeUninit::<libc::stat>::uninit();
        // SAFETY: `buf` is large enough for a `stat` and is only read on success.
        if unsafe { libc::stat(cpath.as_ptr(), buf.as_mut_ptr()) } < 0 {
            return Err(last_error(STAT));
        }
        // SAFETY: `stat` returned 0, so the buffer is initialized.
        let st = unsafe { buf.assume_init() };

        // Epoch seconds straight from the kernel. A 32-bit `time_t` overflows
        // in 2038 here exactly as it does everywhere else on that host.
        #[allow(clippy::unnecessary_cast)]
        let info = PathInfo::new(
            mode_to_type(st.st_mode),
            st.st_size as u64,
            st.st_ctime as i64,
            st.st_mtime as i64,
            st.st_atime as i64,
        );
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempdir::TempDir;

    mod translation {
        use super::*;

        #[test]
        fn test_translate_errno() {
            let cases = [
                (libc::ENOENT, ErrorKind::NotFound),
                (libc::EEXIST, ErrorKind::AlreadyExists),
                (libc::EACCES, ErrorKind::PermissionDenied),
                (libc::EPERM, ErrorKind::PermissionDenied),
                (libc::ENOTDIR, ErrorKind::NotADirectory),
                (libc::EISDIR, ErrorKind::IsADirectory),
                (libc::ENOTEMPTY, ErrorKind::DirectoryNotEmpty),
                (libc::EXDEV, ErrorKind::CrossDevice),
                (libc::EIO, ErrorKind::Io),
            ];
            for (errno, kind) in cases {
                let err = translate(STAT, io::Error::from_raw_os_error(errno));
                assert_eq!(err.kind(), kind, "errno {errno}");
                assert_eq!(err.context(), STAT);
            }
        }

        #[test]
        fn test_message_carries_native_text() {
            let err = translate(REMOVE, io::Error::from_raw_os_error(libc::ENOENT));
            assert!(err.to_string().starts_with("Can't remove path: "));
            assert!(err.message().contains("No such file or directory"));
        }

        #[test]
        fn test_nul_byte_is_invalid_input() {
            let fs = PosixFS::new();
            let path = Path::new(OsStr::from_bytes(b"/tmp/bad\0name"));
            let err = fs.stat(path).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    mod config {
        use super::*;

        #[test]
        fn test_default_dir_mode() {
            assert_eq!(PosixFS::new().dir_mode(), 0o770);
            assert_eq!(PosixFS::default().dir_mode(), DEFAULT_DIR_MODE);
        }

        #[test]
        fn test_with_dir_mode_is_applied() {
            let tmp = setup_test_env();
            let fs = PosixFS::new().with_dir_mode(0o700);
            let dir = tmp.path().join("private");

            fs.mkdir(&dir).unwrap();

            let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
            assert_eq!(mode & 0o077, 0);
        }
    }

    mod native {
        use super::*;

        #[test]
        fn test_stat_fifo_is_other() {
            let tmp = setup_test_env();
            let fifo = tmp.path().join("pipe");
            let cpath = CString::new(fifo.as_os_str().as_bytes()).unwrap();
            assert_eq!(unsafe { libc::mkfifo(cpath.as_ptr(), 0o600) }, 0);

            let info = PosixFS::new().stat(&fifo).unwrap();
            assert_eq!(info.path_type, PathType::Other);
        }

        #[test]
        fn test_stat_timestamps_are_epoch_seconds() {
            let tmp = setup_test_env();
            let file = tmp.path().join("f");
            std::fs::write(&file, b"hello").unwrap();

            let info = PosixFS::new().stat(&file).unwrap();
            let expected = std::fs::metadata(&file).unwrap();
            use std::os::unix::fs::MetadataExt;
            assert_eq!(info.size, 5);
            assert_eq!(info.modify_time, expected.mtime());
            assert_eq!(info.access_time, expected.atime());
            assert_eq!(info.create_time, expected.ctime());
        }

        #[test]
        fn test_stat_follows_symlink() {
            let tmp = setup_test_env();
            let target = tmp.path().join("target");
            let link = tmp.path().join("link");
            std::fs::create_dir(&target).unwrap();
            std::os::unix::fs::symlink(&target, &link).unwrap();

            assert!(PosixFS::new().stat(&link).unwrap().is_dir());
        }

        #[test]
        fn test_stat_broken_symlink_is_not_found() {
            let tmp = setup_test_env();
            let link = tmp.path().join("dangling");
            std::os::unix::fs::symlink(tmp.path().join("missing"), &link).unwrap();

            let err = PosixFS::new().stat(&link).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }

        #[test]
        fn test_remove_non_empty_dir_is_surfaced() {
            let tmp = setup_test_env();
            let dir = tmp.path().join("full");
            std::fs::create_dir(&dir).unwrap();
            std::fs::write(dir.join("x"), b"").unwrap();

            let err = PosixFS::new().remove(&dir).unwrap_err();
            // Some platforms report EEXIST for rmdir on a non-empty directory.
            assert!(matches!(
                err.kind(),
                ErrorKind::DirectoryNotEmpty | ErrorKind::AlreadyExists
            ));
            assert!(dir.exists());
        }

        #[test]
        fn test_stale_errno_does_not_fail_enumeration() {
            let tmp = setup_test_env();
            std::fs::write(tmp.path().join("only"), b"").unwrap();

            set_errno(Errno(libc::EBADF));
            let mut names = Vec::new();
            let result = PosixFS::new()
                .enumerate(tmp.path(), tmp.path(), &mut |_, name| {
                    names.push(name.to_os_string());
                    set_errno(Errno(libc::EIO));
                    EnumerationResult::Continue
                })
                .unwrap();

            assert_eq!(result, EnumerationResult::Continue);
            assert_eq!(names, vec![std::ffi::OsString::from("only")]);
        }

        #[test]
        fn test_read_error_context() {
            let err = translate(READ_DIR, io::Error::from_raw_os_error(libc::EIO));
            assert_eq!(err.kind(), ErrorKind::Io);
            assert!(err.to_string().starts_with("Can't read directory: "));
        }

        #[test]
        fn test_enumerate_file_is_not_a_directory() {
            let tmp = setup_test_env();
            let file = tmp.path().join("plain");
            std::fs::write(&file, b"").unwrap();

            let err = PosixFS::new()
                .enumerate(&file, Path::new("plain"), &mut |_, _| EnumerationResult::Continue)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotADirectory);
            assert_eq!(err.context(), OPEN_DIR);
        }
    }

    // Helper function: Creates a temporary directory for tests
    fn setup_test_env() -> TempDir {
        TempDir::new("posixfs_test").unwrap()
    }
}
