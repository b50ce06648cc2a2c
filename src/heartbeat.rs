//! Heartbeat monitor for capability liveness
//!
//! ## Overview
//!
//! Every registered capability must be kept alive by its owner sending
//! heartbeats. A background sweep runs once per heartbeat interval and:
//!
//! 1. Marks a `Healthy` record `Degraded` after `degraded_after_missed_beats`
//!    intervals without a heartbeat
//! 2. Evicts a record after `evicted_after_missed_beats` intervals without a
//!    heartbeat. Eviction removes the record; the owner must register again.
//!
//! A heartbeat or re-registration at any point before eviction returns the
//! record to `Healthy`.
//!
//! ## Sweep Rules
//!
//! - The sweep snapshots the registered names, then locks each record on its
//!   own, so a slow sweep never holds up unrelated registrations.
//! - At most one sweep is in flight. A sweep that starts while another is
//!   running is skipped, not queued.
//! - Stopping the monitor waits for the in-flight sweep to finish.
//! - Each sweep also drops eviction tombstones older than the retention
//!   window, and the oldest ones beyond `max_tombstones`.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::registry::{RegistryStore, Transition};
use crate::types::{CuratorError, Result};

/// Default interval between sweeps
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default time an evicted name is remembered
pub const DEFAULT_TOMBSTONE_RETENTION: Duration = Duration::from_secs(3600);

/// Default cap on remembered evicted names
pub const DEFAULT_MAX_TOMBSTONES: usize = 10_000;

/// Heartbeat configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Expected heartbeat interval, also the sweep interval
    pub interval: Duration,
    /// Missed intervals before a record is marked degraded
    pub degraded_after_missed_beats: u32,
    /// Missed intervals before a record is evicted
    pub evicted_after_missed_beats: u32,
    /// How long an evicted name resolves as unavailable rather than not found
    pub tombstone_retention: Duration,
    pub max_tombstones: usize,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            degraded_after_missed_beats: 2,
            evicted_after_missed_beats: 5,
            tombstone_retention: DEFAULT_TOMBSTONE_RETENTION,
            max_tombstones: DEFAULT_MAX_TOMBSTONES,
        }
    }
}

impl HeartbeatConfig {
    /// Validate thresholds
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(CuratorError::Config(
                "heartbeat interval must be greater than zero".to_string(),
            ));
        }
        if self.degraded_after_missed_beats == 0 {
            return Err(CuratorError::Config(
                "degraded_after_missed_beats must be at least 1".to_string(),
            ));
        }
        if self.evicted_after_missed_beats <= self.degraded_after_missed_beats {
            return Err(CuratorError::Config(format!(
                "evicted_after_missed_beats ({}) must be greater than degraded_after_missed_beats ({})",
                self.evicted_after_missed_beats, self.degraded_after_missed_beats
            )));
        }
        Ok(())
    }

    /// Silence after which a record is degraded
    pub fn degraded_after(&self) -> chrono::Duration {
        scaled(self.interval, self.degraded_after_missed_beats)
    }

    /// Silence after which a record is evicted
    pub fn evicted_after(&self) -> chrono::Duration {
        scaled(self.interval, self.evicted_after_missed_beats)
    }

    /// Tombstone retention window
    pub fn tombstone_retention(&self) -> chrono::Duration {
        scaled(self.tombstone_retention, 1)
    }
}

fn scaled(interval: Duration, beats: u32) -> chrono::Duration {
    interval
        .checked_mul(beats)
        .and_then(|d| chrono::Duration::from_std(d).ok())
        .unwrap_or(chrono::Duration::MAX)
}

/// What one sweep changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    /// Names examined
    pub checked: usize,
    /// Names moved from healthy to degraded
    pub degraded: Vec<String>,
    /// Names removed from the registry
    pub evicted: Vec<String>,
    /// Tombstones dropped
    pub pruned: usize,
}

struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct MonitorTask {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Background liveness sweeper
pub struct HeartbeatMonitor {
    config: HeartbeatConfig,
    registry: Arc<RegistryStore>,
    /// Set while a sweep is in flight
    sweeping: AtomicBool,
    /// Completion time of the last sweep (unix millis, 0 = never)
    last_sweep_ms: AtomicI64,
    task: Mutex<Option<MonitorTask>>,
}

impl HeartbeatMonitor {
    /// Create a monitor over a registry
    pub fn new(config: HeartbeatConfig, registry: Arc<RegistryStore>) -> Self {
        Self {
            config,
            registry,
            sweeping: AtomicBool::new(false),
            last_sweep_ms: AtomicI64::new(0),
            task: Mutex::new(None),
        }
    }

    /// Monitor configuration
    pub fn config(&self) -> &HeartbeatConfig {
        &self.config
    }

    /// Run one sweep against the current time
    pub fn sweep(&self) -> Option<SweepReport> {
        self.sweep_at(Utc::now())
    }

    /// Run one sweep as of `now`.
    ///
    /// Returns `None` when another sweep is already in flight.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> Option<SweepReport> {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Sweep already in flight, skipping");
            return None;
        }
        let _guard = SweepGuard(&self.sweeping);

        let degraded_after = self.config.degraded_after();
        let evicted_after = self.config.evicted_after();
        let names = self.registry.names();
        let mut report = SweepReport {
            checked: names.len(),
            ..Default::default()
        };

        for name in names {
            match self
                .registry
                .apply_liveness(&name, now, degraded_after, evicted_after)
            {
                Some(Transition::Degraded) => {
                    warn!(capability = %name, "Capability degraded: heartbeats missed");
                    report.degraded.push(name);
                }
                Some(Transition::Evicted(record)) => {
                    warn!(
                        capability = %name,
                        owner = %record.owner_service,
                        last_heartbeat = %record.last_heartbeat,
                        "Capability evicted: heartbeats missed"
                    );
                    report.evicted.push(name);
                }
                // Healthy, or removed since the snapshot
                None => {}
            }
        }

        let evicted_before = now
            .checked_sub_signed(self.config.tombstone_retention())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        report.pruned = self
            .registry
            .prune_tombstones(evicted_before, self.config.max_tombstones);

        self.last_sweep_ms
            .store(Utc::now().timestamp_millis(), Ordering::Release);

        if !report.degraded.is_empty() || !report.evicted.is_empty() || report.pruned > 0 {
            info!(
                checked = report.checked,
                degraded = report.degraded.len(),
                evicted = report.evicted.len(),
                pruned = report.pruned,
                "Sweep complete"
            );
        } else {
            debug!(checked = report.checked, "Sweep complete");
        }

        Some(report)
    }

    /// When the last sweep finished
    pub fn last_sweep(&self) -> Option<DateTime<Utc>> {
        match self.last_sweep_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Utc.timestamp_millis_opt(ms).single(),
        }
    }

    /// Start the background sweep loop
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            warn!("Heartbeat monitor already running");
            return Ok(());
        }

        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            degraded_after_missed_beats = self.config.degraded_after_missed_beats,
            evicted_after_missed_beats = self.config.evicted_after_missed_beats,
            "Starting heartbeat monitor"
        );

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let monitor = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.config.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        monitor.sweep();
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Heartbeat monitor stopped");
                        break;
                    }
                }
            }
        });

        *task = Some(MonitorTask {
            shutdown_tx,
            handle,
        });
        Ok(())
    }

    /// Stop the sweep loop, waiting for an in-flight sweep to finish
    pub async fn stop(&self) {
        let Some(task) = self.task.lock().await.take() else {
            return;
        };

        info!("Stopping heartbeat monitor");
        let _ = task.shutdown_tx.send(()).await;
        if let Err(e) = task.handle.await {
            error!("Heartbeat monitor task failed: {}", e);
        }
    }

    /// Whether the sweep loop is running
    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Contract;
    use crate::identity::ServiceIdentity;
    use crate::registry::{CapabilityRecord, HealthStatus};

    fn registry_with_search() -> Arc<RegistryStore> {
        let store = RegistryStore::new();
        store
            .register(CapabilityRecord::new(
                "librarian.search",
                ServiceIdentity::smart_city("librarian"),
                Contract::rpc("/soa/librarian/search", "POST", "Search"),
            ))
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_default_config() {
        let config = HeartbeatConfig::default();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.degraded_after(), chrono::Duration::seconds(60));
        assert_eq!(config.evicted_after(), chrono::Duration::seconds(150));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let zero = HeartbeatConfig {
            interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let inverted = HeartbeatConfig {
            degraded_after_missed_beats: 5,
            evicted_after_missed_beats: 5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_sweep_transitions() {
        let registry = registry_with_search();
        let monitor = HeartbeatMonitor::new(HeartbeatConfig::default(), Arc::clone(&registry));
        let start = registry.get("librarian.search").unwrap().last_heartbeat;

        let report = monitor.sweep_at(start + chrono::Duration::seconds(10)).unwrap();
        assert_eq!(report.checked, 1);
        assert!(report.degraded.is_empty());

        let report = monitor.sweep_at(start + chrono::Duration::seconds(61)).unwrap();
        assert_eq!(report.degraded, vec!["librarian.search".to_string()]);

        let report = monitor.sweep_at(start + chrono::Duration::seconds(151)).unwrap();
        assert_eq!(report.evicted, vec!["librarian.search".to_string()]);
        assert!(registry.get("librarian.search").is_none());
        assert!(monitor.last_sweep().is_some());
    }

    #[test]
    fn test_heartbeat_before_eviction_recovers() {
        let registry = registry_with_search();
        let monitor = HeartbeatMonitor::new(HeartbeatConfig::default(), Arc::clone(&registry));
        let start = registry.get("librarian.search").unwrap().last_heartbeat;

        monitor.sweep_at(start + chrono::Duration::seconds(61));
        assert_eq!(
            registry.get("librarian.search").unwrap().health_status,
            HealthStatus::Degraded
        );

        registry
            .heartbeat("librarian.search", &ServiceIdentity::smart_city("librarian"))
            .unwrap();
        assert_eq!(
            registry.get("librarian.search").unwrap().health_status,
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_sweep_prunes_expired_tombstones() {
        let registry = registry_with_search();
        let monitor = HeartbeatMonitor::new(HeartbeatConfig::default(), Arc::clone(&registry));
        let start = registry.get("librarian.search").unwrap().last_heartbeat;

        let day_later = start + chrono::Duration::days(1);
        let report = monitor.sweep_at(day_later).unwrap();
        assert_eq!(report.evicted.len(), 1);
        assert_eq!(report.pruned, 0);
        assert_eq!(registry.stats().evicted, 1);

        // Within the one hour retention
        let report = monitor.sweep_at(day_later + chrono::Duration::minutes(59)).unwrap();
        assert_eq!(report.pruned, 0);
        assert!(registry.is_evicted("librarian.search"));

        for _ in 0..10 {
            monitor.sweep_at(day_later + chrono::Duration::days(365));
        }
        assert_eq!(registry.stats().evicted, 0);
        assert!(!registry.is_evicted("librarian.search"));
    }

    #[test]
    fn test_overlapping_sweep_is_skipped() {
        let registry = registry_with_search();
        let monitor = HeartbeatMonitor::new(HeartbeatConfig::default(), registry);

        monitor.sweeping.store(true, Ordering::Release);
        assert!(monitor.sweep().is_none());

        monitor.sweeping.store(false, Ordering::Release);
        assert!(monitor.sweep().is_some());
        assert!(!monitor.sweeping.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let registry = registry_with_search();
        let config = HeartbeatConfig {
            interval: Duration::from_millis(20),
            ..Default::default()
        };
        let monitor = Arc::new(HeartbeatMonitor::new(config, registry));

        monitor.start().await.unwrap();
        assert!(monitor.is_running().await);
        // Second start is a no-op
        monitor.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(monitor.last_sweep().is_some());

        monitor.stop().await;
        assert!(!monitor.is_running().await);
    }
}
