use std::path::{Component, Path, PathBuf};

/// Resolves `.` and `..` lexically and drops redundant separators.
/// `..` never climbs above the root.
pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if result.parent().is_some() {
                    result.pop();
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Returns the directory that would hold `path`: everything before the last
/// separator, or the current directory when there is none.
pub fn parent_or_cwd(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Returns true if `path` is the root directory (`/`).
pub fn is_root<P: AsRef<Path>>(path: P) -> bool {
    let mut components = path.as_ref().components();
    matches!(components.next(), Some(Component::RootDir)) && components.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/foo/././bar"), PathBuf::from("/foo/bar"));
        assert_eq!(normalize("/foo/./../bar"), PathBuf::from("/bar"));
        assert_eq!(normalize("/a/b/"), PathBuf::from("/a/b"));
        assert_eq!(normalize("//a//b"), PathBuf::from("/a/b"));
        assert_eq!(normalize("/../../.."), PathBuf::from("/"));
        assert_eq!(normalize("/"), PathBuf::from("/"));
    }

    #[test]
    fn test_parent_or_cwd() {
        assert_eq!(parent_or_cwd(Path::new("/tmp/child")), Path::new("/tmp"));
        assert_eq!(parent_or_cwd(Path::new("/a/b/c")), Path::new("/a/b"));
        assert_eq!(parent_or_cwd(Path::new("/child")), Path::new("/"));
        assert_eq!(parent_or_cwd(Path::new("child")), Path::new("."));
        assert_eq!(parent_or_cwd(Path::new("dir/child")), Path::new("dir"));
    }

    #[test]
    fn test_is_root() {
        assert!(is_root("/"));
        assert!(!is_root("/a"));
        assert!(!is_root("a"));
        assert!(!is_root(""));
    }
}
