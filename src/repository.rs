//! Local repository layout.
//!
//! ```text
//! <root>/<group as path>/<artifact>/<version>/<artifact>-<version><ext>
//! ```
//!
//! Path computation is pure. Directory creation is left to callers, except
//! for [`ensure_repository_root`] which bootstraps the root itself.

use std::path::{Path, PathBuf};

use crate::error::{Result, TfaError};
use crate::models::{CachePath, CoordinateSet};
use crate::report::{StatusEvent, StatusReporter};

/// Compute where `coords` live under `repo_root`.
///
/// `extension` is appended verbatim, so it carries its own leading dot
/// (`".js"`) or is empty.
pub fn resolve_cache_path(
    coords: &CoordinateSet,
    repo_root: &Path,
    extension: &str,
) -> Result<CachePath> {
    coords.validate()?;

    let mut directory = repo_root.to_path_buf();
    for segment in coords.group.split('.') {
        directory.push(segment);
    }
    directory.push(&coords.artifact);
    directory.push(&coords.version);

    Ok(CachePath {
        directory,
        file_name: format!("{}-{}{}", coords.artifact, coords.version, extension),
    })
}

/// Extension of `path` with its leading dot, or `""` when it has none.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Create `repo_root` and its parent home directory if missing, reporting
/// each creation.
pub fn ensure_repository_root(repo_root: &Path, reporter: &dyn StatusReporter) -> Result<()> {
    let mut missing: Vec<PathBuf> = Vec::new();
    if let Some(home) = repo_root.parent() {
        if !home.as_os_str().is_empty() && !home.is_dir() {
            missing.push(home.to_path_buf());
        }
    }
    if !repo_root.is_dir() {
        missing.push(repo_root.to_path_buf());
    }

    for dir in missing {
        std::fs::create_dir_all(&dir).map_err(|e| TfaError::cache_write(&dir, e))?;
        reporter.report(StatusEvent::DirectoryCreated { path: dir });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::QuietStatus;
    use tempfile::TempDir;

    #[test]
    fn group_dots_become_directories() {
        let coords = CoordinateSet::new("org.cccs.jslibs", "jquery.collapsible", "1.0.0");
        let path = resolve_cache_path(&coords, Path::new("/repo"), ".js").unwrap();
        assert_eq!(
            path.directory,
            Path::new("/repo/org/cccs/jslibs/jquery.collapsible/1.0.0")
        );
        // Dots outside the group are kept as-is.
        assert_eq!(path.file_name, "jquery.collapsible-1.0.0.js");
        assert_eq!(
            path.file(),
            Path::new("/repo/org/cccs/jslibs/jquery.collapsible/1.0.0/jquery.collapsible-1.0.0.js")
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let coords = CoordinateSet::new("a.b-c.d_e", "art", "0.1-SNAPSHOT");
        let root = Path::new("/r");
        let first = resolve_cache_path(&coords, root, ".css").unwrap();
        let second = resolve_cache_path(&coords, root, ".css").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.directory, Path::new("/r/a/b-c/d_e/art/0.1-SNAPSHOT"));
    }

    #[test]
    fn empty_extension_is_allowed() {
        let coords = CoordinateSet::new("g", "a", "1");
        let path = resolve_cache_path(&coords, Path::new("/r"), "").unwrap();
        assert_eq!(path.file_name, "a-1");
    }

    #[test]
    fn empty_fields_are_rejected() {
        let root = Path::new("/r");
        for coords in [
            CoordinateSet::new("", "a", "1"),
            CoordinateSet::new("g", "", "1"),
            CoordinateSet::new("g", "a", ""),
            CoordinateSet::new("g.", "a", "1"),
        ] {
            assert!(matches!(
                resolve_cache_path(&coords, root, ".js"),
                Err(TfaError::MissingCoordinate(_))
            ));
        }
    }

    #[test]
    fn coordinates_cannot_leave_the_repository() {
        let root = Path::new("/repo");
        for coords in [
            CoordinateSet::new("org", "../../x", "1"),
            CoordinateSet::new("org", "../../../../etc", "1"),
            CoordinateSet::new("org", "..", "1"),
            CoordinateSet::new("org", "a", "../1"),
            CoordinateSet::new("org", "a", ".."),
            CoordinateSet::new("org/x", "a", "1"),
            CoordinateSet::new("org", "/etc", "1"),
            CoordinateSet::new("org", "a\\..\\b", "1"),
        ] {
            assert!(
                matches!(
                    resolve_cache_path(&coords, root, ".js"),
                    Err(TfaError::InvalidCoordinate { .. })
                ),
                "{coords}"
            );
        }
    }

    #[test]
    fn dotted_extension_cases() {
        assert_eq!(dotted_extension(Path::new("lib/app.min.js")), ".js");
        assert_eq!(dotted_extension(Path::new("Makefile")), "");
        assert_eq!(dotted_extension(Path::new(".bashrc")), "");
    }

    #[test]
    fn bootstrap_creates_home_and_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join(".tfa").join("repository");
        ensure_repository_root(&root, &QuietStatus).unwrap();
        assert!(root.is_dir());
        // Second call is a no-op.
        ensure_repository_root(&root, &QuietStatus).unwrap();
    }
}
