//! Configuration for the curator binary
//!
//! CLI arguments and environment variable handling using clap. Every option
//! can also be set in a `.env` file, loaded before parsing.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::curator::CuratorConfig;
use crate::heartbeat::HeartbeatConfig;
use crate::policy::AccessMap;
use crate::types::Result;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Curator - capability registry and discovery
#[derive(Parser, Debug, Clone)]
#[command(name = "curator")]
#[command(about = "Capability registry and discovery for realm services")]
pub struct Args {
    /// Expected interval between heartbeats, also the sweep interval
    #[arg(long, env = "HEARTBEAT_INTERVAL_SECONDS", default_value = "30")]
    pub heartbeat_interval_seconds: u64,

    /// Missed heartbeat intervals before a capability is marked degraded
    #[arg(long, env = "DEGRADED_AFTER_MISSED_BEATS", default_value = "2")]
    pub degraded_after_missed_beats: u32,

    /// Missed heartbeat intervals before a capability is evicted
    #[arg(long, env = "EVICTED_AFTER_MISSED_BEATS", default_value = "5")]
    pub evicted_after_missed_beats: u32,

    /// How long an evicted capability name is remembered
    #[arg(long, env = "TOMBSTONE_RETENTION_SECONDS", default_value = "3600")]
    pub tombstone_retention_seconds: u64,

    /// Maximum number of evicted capability names remembered
    #[arg(long, env = "MAX_TOMBSTONES", default_value = "10000")]
    pub max_tombstones: usize,

    /// Realm whose capabilities every realm-scoped consumer may use
    #[arg(long, env = "SHARED_REALM", default_value = "shared")]
    pub shared_realm: String,

    /// TOML file with the consumer -> capability access map.
    /// Without it every non-realm-scoped consumer is denied.
    #[arg(long, env = "ACCESS_MAP_PATH")]
    pub access_map_path: Option<PathBuf>,

    /// JSON list of capability records registered at startup
    #[arg(long, env = "MANIFEST_PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Where to write the registry contents on clean shutdown
    #[arg(long, env = "SNAPSHOT_PATH")]
    pub snapshot_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Args {
    /// Heartbeat interval as a Duration
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }

    /// Library configuration built from the arguments
    pub fn curator_config(&self) -> CuratorConfig {
        CuratorConfig {
            heartbeat: HeartbeatConfig {
                interval: self.heartbeat_interval(),
                degraded_after_missed_beats: self.degraded_after_missed_beats,
                evicted_after_missed_beats: self.evicted_after_missed_beats,
                tombstone_retention: Duration::from_secs(self.tombstone_retention_seconds),
                max_tombstones: self.max_tombstones,
            },
            shared_realm: self.shared_realm.clone(),
        }
    }

    /// Load the access map, or an empty one when no path is configured
    pub fn access_map(&self) -> Result<AccessMap> {
        match &self.access_map_path {
            Some(path) => AccessMap::load(path),
            None => Ok(AccessMap::empty()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.heartbeat_interval_seconds == 0 {
            return Err("HEARTBEAT_INTERVAL_SECONDS must be greater than zero".to_string());
        }

        if self.degraded_after_missed_beats == 0 {
            return Err("DEGRADED_AFTER_MISSED_BEATS must be at least 1".to_string());
        }

        if self.evicted_after_missed_beats <= self.degraded_after_missed_beats {
            return Err(
                "EVICTED_AFTER_MISSED_BEATS must be greater than DEGRADED_AFTER_MISSED_BEATS"
                    .to_string(),
            );
        }

        if self.shared_realm.trim().is_empty() {
            return Err("SHARED_REALM must not be empty".to_string());
        }

        Ok(())
    }
}
