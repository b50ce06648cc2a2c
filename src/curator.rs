//! Curator facade
//!
//! The single entry point callers hold. Construction wires the registry,
//! access policy, resolver and heartbeat monitor together; nothing is
//! process-global.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──► Created ──start()──► Running ──shutdown()──► ShuttingDown
//! ```
//!
//! Registry calls made in `Created` fail with `NotInitialized`; calls made
//! once shutdown has begun fail with `ShuttingDown`. `status()` and
//! `snapshot()` answer in every state.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::contract::ProtocolVariant;
use crate::discovery::{DiscoveryResolver, ProviderHandle};
use crate::heartbeat::{HeartbeatConfig, HeartbeatMonitor, SweepReport};
use crate::identity::{ConsumerIdentity, ServiceIdentity};
use crate::policy::{AccessMap, AccessPolicy, DEFAULT_SHARED_REALM};
use crate::registry::{
    CapabilityRecord, CapabilityState, RegisterOutcome, RegistryStats, RegistryStore, ALL_REALMS,
};
use crate::types::{CuratorError, Result};

/// Library-level configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratorConfig {
    pub heartbeat: HeartbeatConfig,
    /// Realm every realm-scoped consumer can see
    pub shared_realm: String,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            heartbeat: HeartbeatConfig::default(),
            shared_realm: DEFAULT_SHARED_REALM.to_string(),
        }
    }
}

impl CuratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.shared_realm.trim().is_empty() {
            return Err(CuratorError::Config("shared realm must not be empty".to_string()));
        }
        self.heartbeat.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LifecycleState {
    Created = 0,
    Running = 1,
    ShuttingDown = 2,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Created,
            1 => LifecycleState::Running,
            _ => LifecycleState::ShuttingDown,
        }
    }
}

/// Point-in-time registry status
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    pub state: LifecycleState,
    #[serde(flatten)]
    pub registry: RegistryStats,
    pub last_sweep: Option<DateTime<Utc>>,
}

/// Capability registry and discovery service
pub struct Curator {
    config: CuratorConfig,
    registry: Arc<RegistryStore>,
    policy: Arc<AccessPolicy>,
    resolver: DiscoveryResolver,
    monitor: Arc<HeartbeatMonitor>,
    state: AtomicU8,
}

impl Curator {
    /// Build a curator. Nothing runs until `start()`.
    pub fn new(config: CuratorConfig, access_map: AccessMap) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(RegistryStore::new());
        let policy = Arc::new(AccessPolicy::new(
            Arc::clone(&registry),
            Arc::new(access_map),
            config.shared_realm.clone(),
        ));
        let resolver = DiscoveryResolver::new(Arc::clone(&registry), Arc::clone(&policy));
        let monitor = Arc::new(HeartbeatMonitor::new(
            config.heartbeat.clone(),
            Arc::clone(&registry),
        ));

        Ok(Self {
            config,
            registry,
            policy,
            resolver,
            monitor,
            state: AtomicU8::new(LifecycleState::Created as u8),
        })
    }

    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Start the heartbeat monitor and accept calls
    pub async fn start(&self) -> Result<()> {
        match self.state() {
            LifecycleState::Running => return Ok(()),
            LifecycleState::ShuttingDown => return Err(CuratorError::ShuttingDown),
            LifecycleState::Created => {}
        }

        self.monitor.start().await?;

        if self
            .state
            .compare_exchange(
                LifecycleState::Created as u8,
                LifecycleState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
            && self.state() == LifecycleState::ShuttingDown
        {
            // Shutdown raced the start
            self.monitor.stop().await;
            return Err(CuratorError::ShuttingDown);
        }

        info!(
            shared_realm = %self.config.shared_realm,
            "Curator started"
        );
        Ok(())
    }

    /// Reject new calls, stop the monitor and wait for an in-flight sweep
    pub async fn shutdown(&self) {
        let previous = self
            .state
            .swap(LifecycleState::ShuttingDown as u8, Ordering::AcqRel);
        if previous == LifecycleState::ShuttingDown as u8 {
            return;
        }

        info!("Curator shutting down");
        self.monitor.stop().await;
        info!(capabilities = self.registry.len(), "Curator stopped");
    }

    /// Register a capability on behalf of its owner
    pub fn register(&self, record: CapabilityRecord) -> Result<RegisterOutcome> {
        self.ensure_running()?;

        if !record.owner_service.realm.is_empty()
            && !record.owner_service.in_known_realm(&self.config.shared_realm)
        {
            warn!(
                capability = %record.name,
                realm = %record.owner_service.realm,
                "Registering capability in unrecognized realm"
            );
        }

        self.registry.register(record)
    }

    /// Remove a capability on behalf of its owner
    pub fn deregister(&self, capability_name: &str, requester: &ServiceIdentity) -> Result<()> {
        self.ensure_running()?;
        self.registry.deregister(capability_name, requester).map(|_| ())
    }

    /// Remove every capability the service owns, returning their names
    pub fn deregister_service(&self, service: &ServiceIdentity) -> Result<Vec<String>> {
        self.ensure_running()?;
        self.registry.deregister_service(service)
    }

    /// Change a capability's lifecycle state without re-registering
    pub fn update_state(
        &self,
        capability_name: &str,
        requester: &ServiceIdentity,
        state: CapabilityState,
    ) -> Result<()> {
        self.ensure_running()?;
        self.registry
            .update_state(capability_name, requester, state)
            .map(|_| ())
    }

    /// Record a liveness signal from the owner
    pub fn heartbeat(&self, capability_name: &str, requester: &ServiceIdentity) -> Result<()> {
        self.ensure_running()?;
        self.registry.heartbeat(capability_name, requester).map(|_| ())
    }

    /// Look up a record without resolving access
    pub fn get(&self, capability_name: &str) -> Result<Option<CapabilityRecord>> {
        self.ensure_running()?;
        Ok(self.registry.get(capability_name))
    }

    /// Resolve a capability for a consumer
    pub fn resolve(&self, capability_name: &str, consumer: &ConsumerIdentity) -> Result<ProviderHandle> {
        self.ensure_running()?;
        self.resolver.resolve(capability_name, consumer)
    }

    /// Whether a consumer may use a capability
    pub fn authorize(&self, consumer: &ConsumerIdentity, capability_name: &str) -> Result<bool> {
        self.ensure_running()?;
        self.policy.authorize(consumer, capability_name)
    }

    /// Capabilities owned by services in `realm` (`"*"` for all)
    pub fn list_by_owner_realm(&self, realm: &str) -> Result<Vec<CapabilityRecord>> {
        self.ensure_running()?;
        Ok(self.registry.list_by_owner_realm(realm))
    }

    pub fn list_by_owner_service(&self, service_name: &str) -> Result<Vec<CapabilityRecord>> {
        self.ensure_running()?;
        Ok(self.registry.list_by_owner_service(service_name))
    }

    pub fn list_by_variant(&self, variant: ProtocolVariant) -> Result<Vec<CapabilityRecord>> {
        self.ensure_running()?;
        Ok(self.registry.list_by_variant(variant))
    }

    /// Capability names the consumer may use right now
    pub fn entitlements(&self, consumer: &ConsumerIdentity) -> Result<Vec<String>> {
        self.ensure_running()?;
        Ok(self.policy.entitlements(consumer))
    }

    /// Run a liveness sweep immediately.
    ///
    /// `Ok(None)` means a sweep was already in flight.
    pub fn sweep_now(&self) -> Result<Option<SweepReport>> {
        self.sweep_at(Utc::now())
    }

    /// Run a liveness sweep as of `now`
    pub fn sweep_at(&self, now: DateTime<Utc>) -> Result<Option<SweepReport>> {
        self.ensure_running()?;
        Ok(self.monitor.sweep_at(now))
    }

    pub fn status(&self) -> RegistryStatus {
        RegistryStatus {
            state: self.state(),
            registry: self.registry.stats(),
            last_sweep: self.monitor.last_sweep(),
        }
    }

    /// Every live record, for export by the caller
    pub fn snapshot(&self) -> Vec<CapabilityRecord> {
        self.registry.list_by_owner_realm(ALL_REALMS)
    }

    fn ensure_running(&self) -> Result<()> {
        match self.state() {
            LifecycleState::Running => Ok(()),
            LifecycleState::Created => Err(CuratorError::NotInitialized),
            LifecycleState::ShuttingDown => Err(CuratorError::ShuttingDown),
        }
    }
}
