//! Write-once sidecar descriptors.
//!
//! Each exported artifact gets `<state dir>/<fileName>.tfa` holding five
//! `key=value` lines. An existing sidecar is never rewritten.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, TfaError};
use crate::models::SidecarDescriptor;

/// Suffix appended to the artifact file name.
pub const SIDECAR_SUFFIX: &str = ".tfa";

/// Where the sidecar for `file_name` lives inside `storage_dir`.
pub fn sidecar_path(storage_dir: &Path, file_name: &str) -> PathBuf {
    storage_dir.join(format!("{}{}", file_name, SIDECAR_SUFFIX))
}

/// Persist `descriptor` unless its sidecar already exists.
///
/// Returns `true` when the file was written, `false` when it was already
/// there (its content is left untouched).
pub fn write_if_absent(descriptor: &SidecarDescriptor, storage_dir: &Path) -> Result<bool> {
    fs::create_dir_all(storage_dir).map_err(|e| TfaError::cache_write(storage_dir, e))?;

    let path = sidecar_path(storage_dir, &descriptor.file_name);
    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
    {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(TfaError::cache_write(&path, e)),
    };

    file.write_all(render(descriptor).as_bytes())
        .map_err(|e| TfaError::cache_write(&path, e))?;
    Ok(true)
}

fn render(d: &SidecarDescriptor) -> String {
    format!(
        "groupId={}\nartefactId={}\nversion={}\nfileName={}\nurl={}\n",
        d.group_id, d.artefact_id, d.version, d.file_name, d.url
    )
}

/// Read a sidecar back. Unknown keys are ignored; a missing key yields an
/// empty field.
pub fn read_descriptor(path: &Path) -> Result<SidecarDescriptor> {
    let content = fs::read_to_string(path).map_err(|e| TfaError::cache_write(path, e))?;
    let mut d = SidecarDescriptor {
        group_id: String::new(),
        artefact_id: String::new(),
        version: String::new(),
        file_name: String::new(),
        url: String::new(),
    };
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let slot = match key.trim() {
            "groupId" => &mut d.group_id,
            "artefactId" => &mut d.artefact_id,
            "version" => &mut d.version,
            "fileName" => &mut d.file_name,
            "url" => &mut d.url,
            _ => continue,
        };
        *slot = value.trim().to_string();
    }
    Ok(d)
}

/// All sidecars in `storage_dir`, sorted by file name. A missing directory
/// yields an empty list.
pub fn list_descriptors(storage_dir: &Path) -> Result<Vec<(PathBuf, SidecarDescriptor)>> {
    if !storage_dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(storage_dir).map_err(|e| TfaError::cache_write(storage_dir, e))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .map(|n| n.to_string_lossy().ends_with(SIDECAR_SUFFIX))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|p| read_descriptor(&p).map(|d| (p, d)))
        .collect()
}
