//! Remote metadata lookup.
//!
//! `GET <base>/files/<group>/<artifact>/<version>/` returns an XML document
//! whose `url`, `artefactId`, `groupId`, `version`, and `extension` elements
//! describe the artifact. Elements are matched by local name wherever they
//! sit in the tree; the first occurrence of each wins.
//!
//! `artefactId`, `version`, and `extension` name the exported file, so each
//! must be a single plain path component.

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::blocking::Client;
use url::Url;

use crate::config::RemoteConfig;
use crate::download::http_client;
use crate::error::{Result, TfaError};
use crate::models::{require_component, CoordinateSet, RemoteArtifactDescriptor};

const FIELDS: [&str; 5] = ["url", "artefactId", "groupId", "version", "extension"];

/// Client for the metadata endpoint.
pub struct RemoteMetadataClient {
    client: Client,
    base_url: String,
}

impl RemoteMetadataClient {
    pub fn new(base_url: impl Into<String>, remote: &RemoteConfig) -> Result<Self> {
        Ok(Self::with_client(base_url, http_client(remote)?))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL queried for `coords`. Each coordinate is percent-encoded as one
    /// path segment.
    pub fn query_url(&self, coords: &CoordinateSet) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TfaError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| TfaError::InvalidUrl(format!("{}: cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend([
                "files",
                coords.group.as_str(),
                coords.artifact.as_str(),
                coords.version.as_str(),
                "",
            ]);
        Ok(url)
    }

    /// Query the endpoint and extract the artifact descriptor.
    pub fn fetch_descriptor(&self, coords: &CoordinateSet) -> Result<RemoteArtifactDescriptor> {
        coords.validate()?;
        let url = self.query_url(coords)?;
        let unavailable =
            |reason: String| TfaError::MetadataUnavailable(format!("{}: {}", url, reason));

        let body = self
            .client
            .get(url.clone())
            .send()
            .and_then(|resp| resp.bytes())
            .map_err(|e| unavailable(e.to_string()))?;

        parse_descriptor(&body).map_err(|e| match e {
            TfaError::MetadataUnavailable(reason) => unavailable(reason),
            other => other,
        })
    }
}

/// Extract a descriptor from a metadata document.
///
/// A body that is not well-formed XML fails with
/// [`TfaError::MetadataUnavailable`]; a missing or empty element fails with
/// [`TfaError::MetadataFieldMissing`].
pub fn parse_descriptor(xml: &[u8]) -> Result<RemoteArtifactDescriptor> {
    let mut found: [Option<String>; 5] = Default::default();
    let mut current: Option<usize> = None;
    let mut text = String::new();

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                current = FIELDS
                    .iter()
                    .position(|f| f.as_bytes() == name.as_ref())
                    .filter(|&i| found[i].is_none());
                text.clear();
            }
            Ok(Event::Text(te)) if current.is_some() => {
                let chunk = te.unescape().map_err(|e| malformed(e.to_string()))?;
                text.push_str(&chunk);
            }
            Ok(Event::CData(cd)) if current.is_some() => {
                text.push_str(&String::from_utf8_lossy(&cd.into_inner()));
            }
            Ok(Event::End(_)) => {
                if let Some(i) = current.take() {
                    found[i] = Some(text.trim().to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    let [url, artefact_id, group_id, version, extension] = found;
    let descriptor = RemoteArtifactDescriptor {
        url: required(url, "url")?,
        artefact_id: required(artefact_id, "artefactId")?,
        group_id: required(group_id, "groupId")?,
        version: required(version, "version")?,
        extension: required(extension, "extension")?,
    };

    require_component("artefactId", &descriptor.artefact_id)?;
    require_component("version", &descriptor.version)?;
    require_component("extension", &descriptor.extension)?;
    Ok(descriptor)
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TfaError::MetadataFieldMissing(field.to_string()))
}

fn malformed(reason: String) -> TfaError {
    TfaError::MetadataUnavailable(format!("malformed metadata document: {}", reason))
}
