//! Inventory files
//!
//! An inventory is a JSON array of file records.

use std::path::Path;

use tier_core::FileRecord;

use crate::error::{CliError, CliResult};

/// Read an inventory file
pub fn load_inventory(path: &Path) -> CliResult<Vec<FileRecord>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::inventory(path.display().to_string(), e.to_string()))?;
    let files: Vec<FileRecord> = serde_json::from_str(&raw)
        .map_err(|e| CliError::inventory(path.display().to_string(), e.to_string()))?;

    let mut seen = std::collections::HashSet::new();
    for file in &files {
        if !seen.insert(file.id.as_str()) {
            return Err(CliError::inventory(
                path.display().to_string(),
                format!("duplicate file id {}", file.id),
            ));
        }
    }
    Ok(files)
}

/// Overwrite an inventory file
pub fn save_inventory(path: &Path, files: &[FileRecord]) -> CliResult<()> {
    let json = serde_json::to_string_pretty(files)?;
    std::fs::write(path, json + "\n")?;
    Ok(())
}
