//! Static 1:1 access map
//!
//! Maps a consumer name to the exact capability names it may use. Loaded
//! once at process start and never mutated afterwards.
//!
//! ## File Format
//!
//! ```toml
//! [consumers]
//! content_pillar = ["librarian.search", "data_steward.store_file"]
//! insights_pillar = ["librarian.search"]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::types::{CuratorError, Result};

#[derive(Debug, Deserialize)]
struct AccessMapFile {
    #[serde(default)]
    consumers: HashMap<String, Vec<String>>,
}

/// Immutable consumer -> allowed capabilities table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessMap {
    entries: HashMap<String, HashSet<String>>,
}

impl AccessMap {
    /// An empty map (every mapped consumer is denied)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from (consumer, capabilities) pairs
    pub fn from_entries<C, I, S>(entries: impl IntoIterator<Item = (C, I)>) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = HashMap::new();
        for (consumer, capabilities) in entries {
            let set: &mut HashSet<String> = map.entry(consumer.into()).or_default();
            set.extend(capabilities.into_iter().map(Into::into));
        }
        Self { entries: map }
    }

    /// Parse the TOML file format
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: AccessMapFile = toml::from_str(content)?;

        for (consumer, capabilities) in &file.consumers {
            if consumer.trim().is_empty() {
                return Err(CuratorError::Config(
                    "access map consumer names must not be empty".to_string(),
                ));
            }
            if capabilities.iter().any(|c| c.trim().is_empty()) {
                return Err(CuratorError::Config(format!(
                    "access map entry for '{}' lists an empty capability name",
                    consumer
                )));
            }
        }

        Ok(Self::from_entries(file.consumers))
    }

    /// Load the map from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CuratorError::Config(format!("failed to read access map {}: {}", path.display(), e))
        })?;
        let map = Self::from_toml_str(&content)?;

        info!(
            path = %path.display(),
            consumers = map.len(),
            "Loaded access map"
        );
        Ok(map)
    }

    /// Whether the consumer is explicitly allowed the capability
    pub fn allows(&self, consumer: &str, capability_name: &str) -> bool {
        self.entries
            .get(consumer)
            .map(|caps| caps.contains(capability_name))
            .unwrap_or(false)
    }

    /// Capabilities listed for a consumer, if it has an entry
    pub fn allowed_for(&self, consumer: &str) -> Option<&HashSet<String>> {
        self.entries.get(consumer)
    }

    /// Number of consumers with an entry
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
