//! Recursive pattern search built only on `enumerate` and `stat`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use crate::core::{EnumerationResult, FsBackend, Result};
use crate::{Error, ErrorKind};

/// Matching switches for [`crate::Filesystem::glob_directory`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GlobOptions {
    pub case_insensitive: bool,
}

impl GlobOptions {
    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: !self.case_insensitive,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        }
    }
}

/// Walks `root` depth-first and returns every entry whose `/`-separated
/// path relative to `root` matches `pattern` (all entries when `None`).
///
/// Results come in backend enumeration order. Entries whose names are not
/// valid UTF-8 cannot be expressed as a result string and are skipped.
pub(crate) fn glob_directory(
    fs: &dyn FsBackend,
    root: &Path,
    pattern: Option<&str>,
    options: GlobOptions,
) -> Result<Vec<String>> {
    let pattern = pattern
        .map(Pattern::new)
        .transpose()
        .map_err(|e| Error::new(ErrorKind::InvalidInput, "Invalid glob pattern", e.to_string()))?;
    let match_options = options.match_options();

    let mut found = Vec::new();
    let mut pending: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];

    while let Some((dir, prefix)) = pending.pop() {
        let mut names: Vec<OsString> = Vec::new();
        fs.enumerate(&dir, &dir, &mut |_, name| {
            names.push(name.to_os_string());
            EnumerationResult::Continue
        })?;

        for name in names {
            let Some(utf8) = name.to_str() else {
                warn!(dir = %dir.display(), name = ?name, "skipping non-UTF-8 entry name");
                continue;
            };
            let relative = if prefix.is_empty() {
                utf8.to_owned()
            } else {
                format!("{prefix}/{utf8}")
            };
            let full = dir.join(&name);

            let matched = pattern
                .as_ref()
                .is_none_or(|p| p.matches_with(&relative, match_options));
            // An entry that can't be stat'd (dangling link, loop) is still
            // matched by name but never descended into.
            if matches!(fs.stat(&full), Ok(info) if info.is_dir()) {
                pending.push((full, relative.clone()));
            }
            if matched {
                found.push(relative);
            }
        }
    }

    debug!(root = %root.display(), matches = found.len(), "glob finished");
    Ok(found)
}
