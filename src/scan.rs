use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::config::{Config, ScanConfig};
use crate::download::HttpDownloader;
use crate::metadata::RemoteMetadataClient;
use crate::models::Action;
use crate::report::{StatusEvent, StatusMode, StatusReporter};
use crate::repository::ensure_repository_root;
use crate::substitute::CacheSubstitutor;

/// Per-action counts for one scan.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub examined: usize,
    pub skipped: usize,
    pub substituted: usize,
    pub fetched: usize,
    pub failed: usize,
}

impl ScanSummary {
    fn record(&mut self, action: Action) {
        match action {
            Action::Skipped => self.skipped += 1,
            Action::SubstitutedFromCache => self.substituted += 1,
            Action::FetchTriggered => self.fetched += 1,
        }
    }
}

/// `tfa scan`: bootstrap the repository, then scan `root`.
///
/// Repository bootstrap failure is fatal. Individual file failures are only
/// counted; the caller decides what exit status they map to.
pub fn run_scan(config: &Config, root: &Path, mode: StatusMode) -> Result<ScanSummary> {
    let reporter = mode.reporter();
    ensure_repository_root(&config.repository.root, reporter.as_ref())?;

    let downloader = HttpDownloader::new(&config.remote)?;
    let metadata = config
        .remote
        .base_url
        .as_deref()
        .map(|base| RemoteMetadataClient::new(base, &config.remote))
        .transpose()?;

    let mut substitutor =
        CacheSubstitutor::new(&config.repository.root, &downloader, reporter.as_ref());
    if let Some(client) = metadata.as_ref() {
        substitutor = substitutor.with_metadata(client);
    }

    let summary = scan_directory(root, &config.scan, &substitutor, reporter.as_ref())?;

    if mode == StatusMode::Json {
        println!("{}", serde_json::json!({ "event": "summary", "summary": &summary }));
    } else if mode != StatusMode::Quiet {
        println!(
            "examined: {}  skipped: {}  substituted: {}  fetched: {}  failed: {}",
            summary.examined, summary.skipped, summary.substituted, summary.fetched, summary.failed
        );
    }
    Ok(summary)
}

/// Walk `root` in file-name order and run every regular file through the
/// substitutor. Directories starting with `.` and the repository itself are
/// not entered. A failing file is reported and the walk moves on.
pub fn scan_directory(
    root: &Path,
    scan: &ScanConfig,
    substitutor: &CacheSubstitutor<'_>,
    reporter: &dyn StatusReporter,
) -> Result<ScanSummary> {
    if !root.is_dir() {
        bail!("Scan root is not a directory: {}", root.display());
    }

    let exclude_set = build_globset(&scan.exclude_globs)?;
    let repo_root = substitutor.repo_root().canonicalize().ok();

    reporter.report(StatusEvent::ScanStarted {
        root: root.to_path_buf(),
    });

    let mut summary = ScanSummary::default();

    let walker = WalkDir::new(root)
        .follow_links(scan.follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden_dir(e) && !is_repository(e, repo_root.as_deref()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                summary.failed += 1;
                reporter.report(StatusEvent::Failed {
                    path: e.path().map(Path::to_path_buf),
                    error: e.to_string(),
                });
                continue;
            }
        };
        // Symlinks to files are examined even when links are not followed.
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative) {
            continue;
        }

        summary.examined += 1;
        match substitutor.process(path) {
            Ok(action) => summary.record(action),
            Err(e) => {
                summary.failed += 1;
                reporter.report(StatusEvent::Failed {
                    path: Some(path.to_path_buf()),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_repository(entry: &DirEntry, repo_root: Option<&Path>) -> bool {
    match repo_root {
        Some(repo) if entry.file_type().is_dir() => entry
            .path()
            .canonicalize()
            .map(|p| p == repo)
            .unwrap_or(false),
        _ => false,
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{ArtifactDownloader, Download};
    use crate::error::TfaError;
    use crate::report::QuietStatus;
    use std::fs;
    use tempfile::TempDir;

    struct NoNetwork;

    impl ArtifactDownloader for NoNetwork {
        fn download(&self, url: &str, _destination: &Path) -> crate::error::Result<Download> {
            Err(TfaError::DownloadFailed {
                url: url.to_string(),
                reason: "offline".into(),
            })
        }
    }

    fn managed(artifact: &str) -> String {
        format!(
            "// @tfamanaged\n/*\n@groupId >= org.example\n@artefactId >= {}\n@version >= 1.0\n*/\n",
            artifact
        )
    }

    #[test]
    fn counts_each_outcome_and_continues_past_failures() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        let cached = repo.join("org/example/cached/1.0/cached-1.0.js");
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, "from cache").unwrap();

        let work = tmp.path().join("work");
        fs::create_dir_all(work.join("lib")).unwrap();
        fs::write(work.join("plain.txt"), "hello").unwrap();
        fs::write(work.join("lib/cached.js"), managed("cached")).unwrap();
        fs::write(work.join("lib/missing.js"), managed("missing")).unwrap();

        let dl = NoNetwork;
        let sub = CacheSubstitutor::new(&repo, &dl, &QuietStatus);
        let summary =
            scan_directory(&work, &ScanConfig::default(), &sub, &QuietStatus).unwrap();

        assert_eq!(
            summary,
            ScanSummary {
                examined: 3,
                skipped: 1,
                substituted: 1,
                fetched: 0,
                failed: 1,
            }
        );
        assert_eq!(
            fs::read_to_string(work.join("lib/cached.js")).unwrap(),
            "from cache"
        );
    }

    #[test]
    fn hidden_directories_and_excludes_are_not_visited() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        let work = tmp.path().join("work");
        fs::create_dir_all(work.join(".git")).unwrap();
        fs::create_dir_all(work.join("vendor")).unwrap();
        fs::write(work.join(".git/x.js"), managed("x")).unwrap();
        fs::write(work.join("vendor/y.js"), managed("y")).unwrap();
        fs::write(work.join(".hidden.txt"), "dotfiles are still examined").unwrap();

        let dl = NoNetwork;
        let sub = CacheSubstitutor::new(&repo, &dl, &QuietStatus);
        let scan = ScanConfig {
            exclude_globs: vec!["vendor/**".to_string()],
            follow_symlinks: false,
        };
        let summary = scan_directory(&work, &scan, &sub, &QuietStatus).unwrap();
        assert_eq!(summary.examined, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_is_examined_without_following_links() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        let cached = repo.join("org/example/linked/1.0/linked-1.0.js");
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, "from cache").unwrap();

        let shared = tmp.path().join("shared");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("linked.js"), managed("linked")).unwrap();

        let work = tmp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        std::os::unix::fs::symlink(shared.join("linked.js"), work.join("linked.js")).unwrap();

        let dl = NoNetwork;
        let sub = CacheSubstitutor::new(&repo, &dl, &QuietStatus);
        let summary =
            scan_directory(&work, &ScanConfig::default(), &sub, &QuietStatus).unwrap();

        assert_eq!(summary.examined, 1);
        assert_eq!(summary.substituted, 1);
        assert_eq!(
            fs::read_to_string(work.join("linked.js")).unwrap(),
            "from cache"
        );
    }

    #[test]
    fn repository_inside_scan_root_is_not_entered() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        let cached = repo.join("org/example/w/1.0/w-1.0.js");
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, managed("w")).unwrap();

        let dl = NoNetwork;
        let sub = CacheSubstitutor::new(&repo, &dl, &QuietStatus);
        let summary =
            scan_directory(tmp.path(), &ScanConfig::default(), &sub, &QuietStatus).unwrap();
        assert_eq!(summary.examined, 0);
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let dl = NoNetwork;
        let sub = CacheSubstitutor::new(tmp.path(), &dl, &QuietStatus);
        assert!(scan_directory(
            &tmp.path().join("absent"),
            &ScanConfig::default(),
            &sub,
            &QuietStatus
        )
        .is_err());
    }
}
