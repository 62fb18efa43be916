//! Error kinds shared by the resolution, export, and download paths.
//!
//! There is no "no header" error: a file without a header parses to an
//! empty map and only becomes a [`TfaError::MissingCoordinate`] once its
//! coordinates are asked for.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the core engine.
#[derive(Debug, Error)]
pub enum TfaError {
    /// A required coordinate (`groupId`, `artefactId`, `version`) is absent or empty.
    #[error("missing coordinate: {0}")]
    MissingCoordinate(String),

    /// A coordinate (or a metadata field used to build a file name) is not a
    /// single plain path component.
    #[error("invalid {field}: {value:?} is not a plain path component")]
    InvalidCoordinate { field: String, value: String },

    /// The remote metadata endpoint could not be reached or returned garbage.
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// The metadata document parsed but lacks a required element.
    #[error("metadata field missing: <{0}>")]
    MetadataFieldMissing(String),

    /// Transport failure while retrieving an artifact payload.
    #[error("download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The HTTP client could not be constructed (TLS backend, bad user agent).
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    /// The artifact URL is not an absolute http(s) URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A candidate file could not be read.
    #[error("cannot read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation, file write, delete, or copy failed.
    #[error("cache write failed at {path}: {source}")]
    CacheWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TfaError {
    pub(crate) fn cache_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TfaError::CacheWriteFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TfaError::ReadFailed {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TfaError>;
