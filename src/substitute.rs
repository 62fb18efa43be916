//! Per-file resolve-or-fetch.
//!
//! For one candidate file: check the management marker, read the header,
//! resolve the repository path, then either copy the cached artifact over
//! the file or fetch it into the repository first.
//!
//! A cached file is trusted on presence alone; there is no expiry check.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::download::{download_to, ArtifactDownloader};
use crate::error::{Result, TfaError};
use crate::header::{is_managed, parse_header};
use crate::metadata::RemoteMetadataClient;
use crate::models::{Action, CoordinateSet, HeaderMetadata, KEY_URL};
use crate::report::{StatusEvent, StatusReporter};
use crate::repository::{dotted_extension, resolve_cache_path};

pub struct CacheSubstitutor<'a> {
    repo_root: PathBuf,
    downloader: &'a dyn ArtifactDownloader,
    metadata: Option<&'a RemoteMetadataClient>,
    reporter: &'a dyn StatusReporter,
}

impl<'a> CacheSubstitutor<'a> {
    pub fn new(
        repo_root: impl Into<PathBuf>,
        downloader: &'a dyn ArtifactDownloader,
        reporter: &'a dyn StatusReporter,
    ) -> Self {
        Self {
            repo_root: repo_root.into(),
            downloader,
            metadata: None,
            reporter,
        }
    }

    /// Use the metadata service to locate artifacts whose header has no `url`.
    pub fn with_metadata(mut self, client: &'a RemoteMetadataClient) -> Self {
        self.metadata = Some(client);
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn process(&self, file_path: &Path) -> Result<Action> {
        let file = File::open(file_path).map_err(|e| TfaError::read_failed(file_path, e))?;
        let mut reader = BufReader::new(file);

        let mut first = Vec::new();
        reader
            .read_until(b'\n', &mut first)
            .map_err(|e| TfaError::read_failed(file_path, e))?;
        if !is_managed([String::from_utf8_lossy(&first)]) {
            self.reporter.report(StatusEvent::Skipped {
                path: file_path.to_path_buf(),
            });
            return Ok(Action::Skipped);
        }

        // The marker line is consumed by the check; the header scan starts after it.
        let mut rest = Vec::new();
        reader
            .read_to_end(&mut rest)
            .map_err(|e| TfaError::read_failed(file_path, e))?;
        let metadata = parse_header(String::from_utf8_lossy(&rest).lines());
        let coords = CoordinateSet::from_header(&metadata)?;

        let cache = resolve_cache_path(&coords, &self.repo_root, &dotted_extension(file_path))?;
        let cached_file = cache.file();

        if cached_file.is_file() {
            self.substitute(&cached_file, file_path)?;
            self.reporter.report(StatusEvent::Substituted {
                path: file_path.to_path_buf(),
                cached: cached_file,
            });
            return Ok(Action::SubstitutedFromCache);
        }

        if !cache.directory.is_dir() {
            fs::create_dir_all(&cache.directory)
                .map_err(|e| TfaError::cache_write(&cache.directory, e))?;
            self.reporter.report(StatusEvent::DirectoryCreated {
                path: cache.directory.clone(),
            });
        }

        let url = self.remote_location(&coords, &metadata)?;
        self.reporter.report(StatusEvent::Fetching {
            path: file_path.to_path_buf(),
            cached: cached_file.clone(),
            url: url.clone(),
        });

        let download = download_to(self.downloader, &url, &cached_file)?;
        if !download.is_success() {
            self.reporter.report(StatusEvent::HttpStatusIgnored {
                url: url.clone(),
                status: download.status,
            });
        }
        self.reporter.report(StatusEvent::Downloaded {
            path: cached_file.clone(),
            url,
            bytes: download.bytes,
        });

        self.substitute(&cached_file, file_path)?;
        Ok(Action::FetchTriggered)
    }

    /// Replace `target` with a copy of `cached`.
    fn substitute(&self, cached: &Path, target: &Path) -> Result<()> {
        if same_file(cached, target) {
            return Ok(());
        }
        fs::remove_file(target).map_err(|e| TfaError::cache_write(target, e))?;
        fs::copy(cached, target).map_err(|e| TfaError::cache_write(target, e))?;
        Ok(())
    }

    /// Header `url` first, then the metadata service.
    fn remote_location(&self, coords: &CoordinateSet, metadata: &HeaderMetadata) -> Result<String> {
        if let Some(url) = metadata.get(KEY_URL).filter(|u| !u.is_empty()) {
            return Ok(url.clone());
        }
        match self.metadata {
            Some(client) => Ok(client.fetch_descriptor(coords)?.url),
            None => Err(TfaError::MetadataUnavailable(format!(
                "no url in header for {} and no remote.base_url configured",
                coords
            ))),
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
