use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::descriptor::list_descriptors;
use crate::report::StatusMode;

/// `tfa list`: print the sidecar descriptors recorded under `working_dir`.
pub fn list_exports(config: &Config, working_dir: &Path, mode: StatusMode) -> Result<()> {
    let storage_dir = working_dir.join(&config.export.state_dir);
    let descriptors = list_descriptors(&storage_dir)?;

    if mode == StatusMode::Json {
        for (_, d) in &descriptors {
            println!("{}", serde_json::to_string(d)?);
        }
        return Ok(());
    }

    if descriptors.is_empty() {
        if mode != StatusMode::Quiet {
            println!("No exports recorded in {}", storage_dir.display());
        }
        return Ok(());
    }

    println!("{:<40} {:<32} PRESENT", "COORDINATES", "FILE");
    for (_, d) in &descriptors {
        let coords = format!("{}:{}:{}", d.group_id, d.artefact_id, d.version);
        let present = working_dir.join(&d.file_name).is_file();
        println!("{:<40} {:<32} {}", coords, d.file_name, present);
    }

    Ok(())
}
