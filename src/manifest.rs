//! Startup manifest and shutdown snapshot
//!
//! Both files are a JSON array of capability records. A snapshot written on
//! shutdown can be fed back in as the next start's manifest; liveness fields
//! are reset by registration.

use std::path::Path;

use tracing::{info, warn};

use crate::curator::Curator;
use crate::registry::CapabilityRecord;
use crate::types::{CuratorError, Result};

/// Read a manifest file
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<CapabilityRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        CuratorError::Config(format!("failed to read manifest {}: {}", path.display(), e))
    })?;
    let records: Vec<CapabilityRecord> = serde_json::from_str(&content)?;

    info!(path = %path.display(), capabilities = records.len(), "Loaded manifest");
    Ok(records)
}

/// Register every manifest record, skipping the ones that fail.
///
/// Returns how many were accepted.
pub fn register_all(curator: &Curator, records: Vec<CapabilityRecord>) -> usize {
    let mut accepted = 0;
    for record in records {
        let name = record.name.clone();
        match curator.register(record) {
            Ok(_) => accepted += 1,
            Err(e) => warn!(capability = %name, error = %e, "Skipping manifest entry"),
        }
    }
    accepted
}

/// Write records to a snapshot file
pub fn write_snapshot(path: impl AsRef<Path>, records: &[CapabilityRecord]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json).map_err(|e| {
        CuratorError::Config(format!("failed to write snapshot {}: {}", path.display(), e))
    })?;

    info!(path = %path.display(), capabilities = records.len(), "Wrote registry snapshot");
    Ok(())
}
