use crate::{PathInfo, PathType};

/// A node of the in-memory tree kept by [`crate::MapFS`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    entry_type: PathType,
    size: u64,
    created: i64,
    modified: i64,
    accessed: i64,
}

impl Entry {
    pub fn new(entry_type: PathType, size: u64, now: i64) -> Entry {
        Entry {
            entry_type,
            size,
            created: now,
            modified: now,
            accessed: now,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == PathType::Directory
    }

    /// Records a change of the entry's contents (for a directory: its list of
    /// children).
    pub fn touch(&mut self, now: i64) {
        self.modified = now;
    }

    pub fn info(&self) -> PathInfo {
        PathInfo::new(
            self.entry_type,
            self.size,
            self.created,
            self.modified,
            self.accessed,
        )
    }
}
