//! Blocking filesystem primitives. Every function keeps going past entries it
//! cannot remove; only the top-level failure to read a directory is reported.
//! Walks check `cancel` between entries and stop early once it fires.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::error::CleanupError;

/// Remove everything inside `dir`, keeping `dir` itself. Subdirectories that
/// cannot be removed whole are emptied instead. Returns the number of entries
/// removed. A missing directory is not an error.
pub fn delete_contents(dir: &Path, cancel: &CancellationToken) -> Result<usize, CleanupError> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let entries = std::fs::read_dir(dir).map_err(|e| CleanupError::io(dir, e))?;
    let mut removed = 0;
    for entry in entries.flatten() {
        if cancel.is_cancelled() {
            break;
        }
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            match std::fs::remove_dir_all(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::trace!(
                        path = %path.display(),
                        error = %e,
                        "dir locked, clearing contents"
                    );
                    removed += delete_contents(&path, cancel).unwrap_or(0);
                }
            }
        } else if std::fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Empty each existing directory in `dirs`; failures on one target do not
/// stop the others.
pub fn delete_targets<I>(dirs: I, cancel: &CancellationToken) -> usize
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut seen = HashSet::new();
    let mut removed = 0;
    for dir in dirs {
        if cancel.is_cancelled() {
            break;
        }
        let key = dir.to_string_lossy().to_lowercase();
        if !seen.insert(key) {
            continue;
        }
        match delete_contents(&dir, cancel) {
            Ok(n) => removed += n,
            Err(e) => tracing::debug!(error = %e, "skipping target"),
        }
    }
    removed
}

pub fn try_delete_file(path: &Path) -> bool {
    path.is_file() && std::fs::remove_file(path).is_ok()
}

pub fn try_delete_dir(path: &Path) -> bool {
    path.is_dir() && std::fs::remove_dir_all(path).is_ok()
}

/// Delete files in `dir` (non-recursive) whose name matches a glob such as
/// `thumbcache*.db`. Matching is case-insensitive.
pub fn delete_matching(
    dir: &Path,
    pattern: &str,
    cancel: &CancellationToken,
) -> Result<usize, CleanupError> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let full = format!(
        "{}{}{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        std::path::MAIN_SEPARATOR,
        pattern
    );
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };
    let paths =
        glob::glob_with(&full, options).map_err(|e| CleanupError::Pattern(e.to_string()))?;
    Ok(paths
        .flatten()
        .take_while(|_| !cancel.is_cancelled())
        .filter(|p| try_delete_file(p))
        .count())
}

/// Recursively delete empty directories below `root`. Directories listed in
/// `protected` (compared case-insensitively) and everything below them are
/// never touched, and neither is `root` itself.
pub fn remove_empty_dirs(
    root: &Path,
    protected: &[PathBuf],
    cancel: &CancellationToken,
) -> usize {
    let protected: HashSet<String> = protected.iter().map(|p| normalize(p)).collect();
    let Ok(entries) = std::fs::read_dir(root) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        if cancel.is_cancelled() {
            break;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            removed += prune(&entry.path(), &protected, cancel);
        }
    }
    removed
}

fn prune(dir: &Path, protected: &HashSet<String>, cancel: &CancellationToken) -> usize {
    if cancel.is_cancelled() || protected.contains(&normalize(dir)) {
        return 0;
    }
    // Do not follow junctions or symlinks out of the tree.
    if std::fs::symlink_metadata(dir)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(true)
    {
        return 0;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        if cancel.is_cancelled() {
            return removed;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            removed += prune(&entry.path(), protected, cancel);
        }
    }
    let empty = std::fs::read_dir(dir)
        .map(|mut it| it.next().is_none())
        .unwrap_or(false);
    if empty && std::fs::remove_dir(dir).is_ok() {
        removed += 1;
    }
    removed
}

fn normalize(p: &Path) -> String {
    p.to_string_lossy()
        .trim_end_matches(['\\', '/'])
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn live() -> CancellationToken {
        CancellationToken::new()
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"junk").unwrap();
    }

    #[test]
    fn test_delete_contents_keeps_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("cache");
        touch(&root.join("a.tmp"));
        touch(&root.join("nested").join("b.tmp"));

        let removed = delete_contents(&root, &live()).unwrap();

        assert_eq!(removed, 2);
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_delete_contents_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(delete_contents(&tmp.path().join("absent"), &live()).unwrap(), 0);
    }

    #[test]
    fn test_delete_targets_dedups_and_continues() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        touch(&a.join("1"));
        let targets = vec![a.clone(), tmp.path().join("missing"), a.clone()];
        assert_eq!(delete_targets(targets, &live()), 1);
    }

    #[test]
    fn test_delete_matching_pattern() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("thumbcache_32.db"));
        touch(&tmp.path().join("ThumbCache_96.db"));
        touch(&tmp.path().join("iconcache_16.db"));

        let removed = delete_matching(tmp.path(), "thumbcache*.db", &live()).unwrap();

        assert_eq!(removed, 2);
        assert!(tmp.path().join("iconcache_16.db").exists());
    }

    #[test]
    fn test_remove_empty_dirs_skips_protected() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("empty").join("deeper")).unwrap();
        fs::create_dir_all(root.join("Windows").join("empty")).unwrap();
        touch(&root.join("full").join("keep.txt"));

        let removed = remove_empty_dirs(root, &[root.join("windows")], &live());

        assert_eq!(removed, 2);
        assert!(!root.join("empty").exists());
        assert!(root.join("Windows").join("empty").exists());
        assert!(root.join("full").join("keep.txt").exists());
    }

    #[test]
    fn test_cancelled_walks_leave_files_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("cache");
        touch(&root.join("a.tmp"));
        touch(&root.join("nested").join("b.tmp"));
        fs::create_dir_all(tmp.path().join("empty")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(delete_contents(&root, &cancel).unwrap(), 0);
        assert_eq!(delete_targets([root.clone()], &cancel), 0);
        assert_eq!(delete_matching(&root, "*.tmp", &cancel).unwrap(), 0);
        assert_eq!(remove_empty_dirs(tmp.path(), &[], &cancel), 0);
        assert!(root.join("a.tmp").exists());
        assert!(root.join("nested").join("b.tmp").exists());
        assert!(tmp.path().join("empty").is_dir());
    }
}
