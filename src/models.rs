//! Core data types that flow between the header parser, the repository
//! resolver, and the remote clients.
//!
//! Everything here is a value: cache paths and sidecar descriptors are
//! recomputed from a [`CoordinateSet`] on demand, never stored.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, TfaError};

/// Header key holding the group coordinate.
pub const KEY_GROUP: &str = "groupId";
/// Header key holding the artifact coordinate. Spelled the way headers spell it.
pub const KEY_ARTIFACT: &str = "artefactId";
/// Header key holding the version coordinate.
pub const KEY_VERSION: &str = "version";
/// Optional header key naming where to fetch the artifact from.
pub const KEY_URL: &str = "url";

/// Flat key/value map declared in a file's leading comment block.
pub type HeaderMetadata = BTreeMap<String, String>;

/// The `(group, artifact, version)` triple that addresses an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CoordinateSet {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl CoordinateSet {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// Extract coordinates from parsed header metadata.
    ///
    /// Fails with [`TfaError::MissingCoordinate`] naming the first absent
    /// or blank key.
    pub fn from_header(metadata: &HeaderMetadata) -> Result<Self> {
        let field = |key: &str| -> Result<String> {
            match metadata.get(key) {
                Some(v) if !v.trim().is_empty() => Ok(v.clone()),
                _ => Err(TfaError::MissingCoordinate(key.to_string())),
            }
        };
        Ok(Self {
            group: field(KEY_GROUP)?,
            artifact: field(KEY_ARTIFACT)?,
            version: field(KEY_VERSION)?,
        })
    }

    /// Reject empty fields, empty group segments (`a..b`), and any field or
    /// group segment that is not a plain path component.
    pub fn validate(&self) -> Result<()> {
        if self.group.is_empty() || self.group.split('.').any(str::is_empty) {
            return Err(TfaError::MissingCoordinate(KEY_GROUP.to_string()));
        }
        if self.artifact.is_empty() {
            return Err(TfaError::MissingCoordinate(KEY_ARTIFACT.to_string()));
        }
        if self.version.is_empty() {
            return Err(TfaError::MissingCoordinate(KEY_VERSION.to_string()));
        }

        for segment in self.group.split('.') {
            require_component(KEY_GROUP, segment)?;
        }
        require_component(KEY_ARTIFACT, &self.artifact)?;
        require_component(KEY_VERSION, &self.version)
    }
}

/// True when `name` is exactly one normal path component: no separators,
/// not `.` or `..`, no root or drive prefix.
pub fn is_path_component(name: &str) -> bool {
    if name.contains(|c: char| c == '/' || c == '\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

pub(crate) fn require_component(field: &str, value: &str) -> Result<()> {
    if is_path_component(value) {
        Ok(())
    } else {
        Err(TfaError::InvalidCoordinate {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for CoordinateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Location of an artifact inside the local repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePath {
    pub directory: PathBuf,
    pub file_name: String,
}

impl CachePath {
    /// Full path of the cached file.
    pub fn file(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Artifact description returned by the remote metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteArtifactDescriptor {
    pub group_id: String,
    pub artefact_id: String,
    pub version: String,
    pub extension: String,
    pub url: String,
}

impl RemoteArtifactDescriptor {
    /// `<artefactId>-<version>.<extension>`
    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.artefact_id, self.version, self.extension)
    }

    pub fn coordinates(&self) -> CoordinateSet {
        CoordinateSet::new(&self.group_id, &self.artefact_id, &self.version)
    }

    pub fn to_sidecar(&self) -> SidecarDescriptor {
        SidecarDescriptor {
            group_id: self.group_id.clone(),
            artefact_id: self.artefact_id.clone(),
            version: self.version.clone(),
            file_name: self.file_name(),
            url: self.url.clone(),
        }
    }
}

/// Write-once record of an exported artifact, stored under the state directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidecarDescriptor {
    pub group_id: String,
    pub artefact_id: String,
    pub version: String,
    pub file_name: String,
    pub url: String,
}

/// What [`crate::substitute::CacheSubstitutor::process`] did with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// The first line carries no management marker.
    Skipped,
    /// The repository already held the artifact; it replaced the file.
    SubstitutedFromCache,
    /// The artifact was missing locally and has been fetched.
    FetchTriggered,
}

/// Outcome of an explicit export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportResult {
    /// The target file was already present in the working directory.
    AlreadyExists { path: PathBuf },
    Downloaded { path: PathBuf, bytes: u64 },
}

impl ExportResult {
    pub fn path(&self) -> &Path {
        match self {
            ExportResult::AlreadyExists { path } | ExportResult::Downloaded { path, .. } => path,
        }
    }
}
