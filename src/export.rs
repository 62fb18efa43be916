//! Export an artifact by explicit coordinates.
//!
//! Looks the coordinates up on the metadata endpoint, records a sidecar
//! descriptor under the working directory's state folder, and downloads the
//! payload next to it unless a file of that name is already there.

use std::path::Path;

use crate::config::Config;
use crate::descriptor::{sidecar_path, write_if_absent};
use crate::download::{download_to, http_client, ArtifactDownloader, HttpDownloader};
use crate::error::Result;
use crate::metadata::RemoteMetadataClient;
use crate::models::{CoordinateSet, ExportResult};
use crate::report::{StatusEvent, StatusMode, StatusReporter};

/// `tfa export`: resolve the base URL (flag, then config) and export into
/// `working_dir`.
pub fn run_export(
    config: &Config,
    coords: &CoordinateSet,
    base_url: Option<&str>,
    working_dir: &Path,
    mode: StatusMode,
) -> anyhow::Result<ExportResult> {
    let base_url = base_url
        .or(config.remote.base_url.as_deref())
        .ok_or_else(|| {
            anyhow::anyhow!("No metadata endpoint: pass --base-url or set remote.base_url")
        })?;

    let reporter = mode.reporter();
    let client = http_client(&config.remote)?;
    let metadata = RemoteMetadataClient::with_client(base_url, client.clone());
    let downloader = HttpDownloader::with_client(client);

    let orchestrator = ExportOrchestrator::new(
        &metadata,
        &downloader,
        reporter.as_ref(),
        config.export.state_dir.as_str(),
    );
    Ok(orchestrator.export(coords, working_dir)?)
}

pub struct ExportOrchestrator<'a> {
    metadata: &'a RemoteMetadataClient,
    downloader: &'a dyn ArtifactDownloader,
    reporter: &'a dyn StatusReporter,
    state_dir: String,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new(
        metadata: &'a RemoteMetadataClient,
        downloader: &'a dyn ArtifactDownloader,
        reporter: &'a dyn StatusReporter,
        state_dir: impl Into<String>,
    ) -> Self {
        Self {
            metadata,
            downloader,
            reporter,
            state_dir: state_dir.into(),
        }
    }

    pub fn export(&self, coords: &CoordinateSet, working_dir: &Path) -> Result<ExportResult> {
        let descriptor = self.metadata.fetch_descriptor(coords)?;
        let file_name = descriptor.file_name();

        let storage_dir = working_dir.join(&self.state_dir);
        let sidecar = sidecar_path(&storage_dir, &file_name);
        if write_if_absent(&descriptor.to_sidecar(), &storage_dir)? {
            self.reporter
                .report(StatusEvent::DescriptorWritten { path: sidecar });
        } else {
            self.reporter.report(StatusEvent::DescriptorKept { path: sidecar });
        }

        let target = working_dir.join(&file_name);
        if target.exists() {
            self.reporter.report(StatusEvent::AlreadyExists {
                path: target.clone(),
            });
            return Ok(ExportResult::AlreadyExists { path: target });
        }

        let download = download_to(self.downloader, &descriptor.url, &target)?;
        if !download.is_success() {
            self.reporter.report(StatusEvent::HttpStatusIgnored {
                url: descriptor.url.clone(),
                status: download.status,
            });
        }
        self.reporter.report(StatusEvent::Downloaded {
            path: target.clone(),
            url: descriptor.url,
            bytes: download.bytes,
        });
        Ok(ExportResult::Downloaded {
            path: target,
            bytes: download.bytes,
        })
    }
}
