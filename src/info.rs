/// Kind of object found at a path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PathType {
    File,
    Directory,
    /// Symlinks, devices, sockets, FIFOs: anything that is neither a regular
    /// file nor a directory.
    Other,
}

/// Backend-independent result of a metadata query.
///
/// Timestamps are seconds since the Unix epoch, passed through from the
/// backend without sub-second precision or timezone interpretation. A backend
/// that does not track one of them reports `0` for it.
///
/// Fields are readable, but outside this crate a value can only come from
/// [`PathInfo::new`], so a directory never carries a size:
///
/// ```compile_fail
/// use fsops_kit::{PathInfo, PathType};
///
/// let info = PathInfo {
///     path_type: PathType::Directory,
///     size: 4096,
///     create_time: 0,
///     modify_time: 0,
///     access_time: 0,
/// };
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct PathInfo {
    pub path_type: PathType,
    /// Byte count. Always `0` for directories.
    pub size: u64,
    pub create_time: i64,
    pub modify_time: i64,
    pub access_time: i64,
}

impl PathInfo {
    /// Builds a `PathInfo`, forcing `size` to `0` for directories.
    pub fn new(
        path_type: PathType,
        size: u64,
        create_time: i64,
        modify_time: i64,
        access_time: i64,
    ) -> Self {
        let size = match path_type {
            PathType::Directory => 0,
            PathType::File | PathType::Other => size,
        };
        Self {
            path_type,
            size,
            create_time,
            modify_time,
            access_time,
        }
    }

    pub fn is_file(&self) -> bool {
        self.path_type == PathType::File
    }

    pub fn is_dir(&self) -> bool {
        self.path_type == PathType::Directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_size_is_zeroed() {
        let info = PathInfo::new(PathType::Directory, 4096, 1, 2, 3);
        assert_eq!(info.size, 0);
        assert!(info.is_dir());
        assert!(!info.is_file());
    }

    #[test]
    fn test_file_and_other_keep_size() {
        let info = PathInfo::new(PathType::File, 42, 1, 2, 3);
        assert_eq!(info.size, 42);
        assert!(info.is_file());
        assert_eq!((info.create_time, info.modify_time, info.access_time), (1, 2, 3));

        let info = PathInfo::new(PathType::Other, 7, 0, 0, 0);
        assert_eq!(info.size, 7);
        assert_eq!(info.path_type, PathType::Other);
    }
}
