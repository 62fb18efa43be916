//! Artifact payload retrieval.
//!
//! Port 443 means encrypted transport, whatever scheme the URL was written
//! with. Certificate verification follows `remote.insecure_tls`, which is
//! **off by default**: a server presenting any certificate is trusted. Turn
//! it on for anything reachable from an untrusted network.
//!
//! Response status is not checked. A 404 page is written to the destination
//! like any other body; callers see the status in [`Download::status`].

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use url::Url;

use crate::config::RemoteConfig;
use crate::error::{Result, TfaError};

const HTTPS_PORT: u16 = 443;

/// Build the blocking HTTP client shared by metadata lookups and downloads.
pub fn http_client(remote: &RemoteConfig) -> Result<Client> {
    Client::builder()
        .danger_accept_invalid_certs(remote.insecure_tls)
        .user_agent(remote.user_agent.as_str())
        .timeout(remote.timeout())
        .build()
        .map_err(|e| TfaError::ClientSetup(e.to_string()))
}

/// Parse an artifact URL, upgrading plain `http` on port 443 to `https`.
pub fn normalize_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| TfaError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(TfaError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                raw, other
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(TfaError::InvalidUrl(format!("{}: missing host", raw)));
    }
    if url.scheme() == "http" && url.port() == Some(HTTPS_PORT) {
        url.set_scheme("https")
            .map_err(|_| TfaError::InvalidUrl(format!("{}: cannot switch to https", raw)))?;
    }
    Ok(url)
}

/// Result of one download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download {
    pub bytes: u64,
    pub status: u16,
}

impl Download {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retrieves a payload from a URL into a file.
pub trait ArtifactDownloader {
    /// Fetch `url` and write the full body to `destination`, creating or
    /// truncating it.
    fn download(&self, url: &str, destination: &Path) -> Result<Download>;
}

/// [`ArtifactDownloader`] over HTTP(S).
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(remote: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(remote)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl ArtifactDownloader for HttpDownloader {
    fn download(&self, url: &str, destination: &Path) -> Result<Download> {
        let target = normalize_url(url)?;
        let failed = |reason: String| TfaError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(target)
            .send()
            .map_err(|e| failed(e.to_string()))?;
        let status = response.status().as_u16();

        let mut file =
            File::create(destination).map_err(|e| TfaError::cache_write(destination, e))?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| failed(e.to_string()))?;

        Ok(Download { bytes, status })
    }
}

/// Download through a `.part` sibling and rename into place, so an
/// interrupted transfer never leaves a truncated file at `destination`.
pub fn download_to(
    downloader: &dyn ArtifactDownloader,
    url: &str,
    destination: &Path,
) -> Result<Download> {
    let mut partial = destination.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    match downloader.download(url, &partial) {
        Ok(download) => {
            fs::rename(&partial, destination)
                .map_err(|e| TfaError::cache_write(destination, e))?;
            Ok(download)
        }
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}
