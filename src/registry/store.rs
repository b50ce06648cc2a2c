//! Registry Store
//!
//! Concurrency-safe in-memory map from capability name to capability record.
//!
//! ## Thread Safety
//!
//! Records live in a `DashMap`, so every mutation happens inside the lock of
//! the shard that holds the name. Calls for different names proceed in
//! parallel; calls for the same name are serialized. Readers only ever get
//! clones, never a guard into the map, so no caller can observe a record
//! half-way through a mutation.
//!
//! ## Tombstones
//!
//! Evicted names are remembered in a second map until they age out or are
//! registered again. Tombstones are only written or cleared while the
//! record's own entry lock is held, and always in the order records then
//! tombstones, so a live record never carries a tombstone.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::record::{CapabilityRecord, CapabilityState, HealthStatus};
use crate::contract::ProtocolVariant;
use crate::identity::ServiceIdentity;
use crate::types::{CuratorError, Result};

/// Realm filter matching every record
pub const ALL_REALMS: &str = "*";

/// Result of an accepted registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The name was free
    Inserted { registration_id: Uuid },
    /// The same owner registered the name again
    Replaced { registration_id: Uuid },
}

impl RegisterOutcome {
    /// Registration ID minted for this call
    pub fn registration_id(&self) -> Uuid {
        match self {
            RegisterOutcome::Inserted { registration_id }
            | RegisterOutcome::Replaced { registration_id } => *registration_id,
        }
    }
}

/// State change applied by a liveness sweep
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Healthy record went quiet
    Degraded,
    /// Record removed from the registry
    Evicted(CapabilityRecord),
}

/// Counts over the live records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub rpc_contracts: usize,
    pub tool_contracts: usize,
    pub deprecated: usize,
    pub maintenance: usize,
    pub by_realm: BTreeMap<String, usize>,
    pub evicted: usize,
}

/// In-memory capability registry
#[derive(Debug, Default)]
pub struct RegistryStore {
    /// capability name -> record
    records: DashMap<String, CapabilityRecord>,
    /// capability name -> when it was evicted for missed heartbeats
    tombstones: DashMap<String, DateTime<Utc>>,
}

impl RegistryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            tombstones: DashMap::new(),
        }
    }

    /// Register a capability, or refresh it if the same owner registers again.
    ///
    /// The contract is validated before the map is touched. A name held by a
    /// different owner is a `Conflict` and leaves the existing record as is.
    pub fn register(&self, record: CapabilityRecord) -> Result<RegisterOutcome> {
        record.validate()?;

        let now = Utc::now();
        let registration_id = Uuid::new_v4();
        let name = record.name.clone();

        let outcome = match self.records.entry(name.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get();
                if !existing.owner_service.same_service(&record.owner_service) {
                    warn!(
                        capability = %name,
                        owner = %existing.owner_service,
                        requested_by = %record.owner_service,
                        "Rejected registration: name owned by another service"
                    );
                    return Err(CuratorError::Conflict {
                        capability: name,
                        existing_owner: existing.owner_service.to_string(),
                        requested_by: record.owner_service.to_string(),
                    });
                }

                if existing.owner_service.kind != record.owner_service.kind {
                    warn!(
                        capability = %name,
                        registered_kind = %existing.owner_service.kind,
                        requested_kind = %record.owner_service.kind,
                        "Ignoring service kind change on re-registration"
                    );
                }

                // Owner identity is fixed by the first registration
                let mut updated = record;
                updated.owner_service.registered_at = existing.owner_service.registered_at;
                updated.owner_service.kind = existing.owner_service.kind;
                stamp(&mut updated, now, registration_id);
                entry.insert(updated);

                RegisterOutcome::Replaced { registration_id }
            }
            Entry::Vacant(entry) => {
                let mut fresh = record;
                fresh.owner_service.registered_at = now;
                stamp(&mut fresh, now, registration_id);
                self.tombstones.remove(&name);
                entry.insert(fresh);

                RegisterOutcome::Inserted { registration_id }
            }
        };

        info!(
            capability = %name,
            registration_id = %registration_id,
            replaced = matches!(outcome, RegisterOutcome::Replaced { .. }),
            "Registered capability"
        );

        Ok(outcome)
    }

    /// Remove a capability on behalf of its owner
    pub fn deregister(
        &self,
        capability_name: &str,
        requesting_service: &ServiceIdentity,
    ) -> Result<CapabilityRecord> {
        match self.records.entry(capability_name.to_string()) {
            Entry::Vacant(_) => Err(CuratorError::NotFound(capability_name.to_string())),
            Entry::Occupied(entry) => {
                check_owner(entry.get(), requesting_service)?;
                let (_, removed) = entry.remove_entry();
                info!(
                    capability = %capability_name,
                    owner = %requesting_service,
                    "Deregistered capability"
                );
                Ok(removed)
            }
        }
    }

    /// Remove every capability the service owns.
    ///
    /// Returns the removed names, sorted. A service that owns nothing is
    /// `NotFound`.
    pub fn deregister_service(&self, service: &ServiceIdentity) -> Result<Vec<String>> {
        let owned: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.owner_service.same_service(service))
            .map(|r| r.key().clone())
            .collect();

        let mut removed: Vec<String> = owned
            .into_iter()
            .filter(|name| {
                self.records
                    .remove_if(name, |_, r| r.owner_service.same_service(service))
                    .is_some()
            })
            .collect();

        if removed.is_empty() {
            return Err(CuratorError::NotFound(service.to_string()));
        }

        removed.sort();
        info!(
            service = %service,
            capabilities = removed.len(),
            "Deregistered service"
        );
        Ok(removed)
    }

    /// Change a capability's lifecycle state on behalf of its owner.
    ///
    /// Returns the previous state. Liveness is untouched.
    pub fn update_state(
        &self,
        capability_name: &str,
        requesting_service: &ServiceIdentity,
        state: CapabilityState,
    ) -> Result<CapabilityState> {
        let mut record = self
            .records
            .get_mut(capability_name)
            .ok_or_else(|| CuratorError::NotFound(capability_name.to_string()))?;

        check_owner(&record, requesting_service)?;

        let previous = record.state;
        record.state = state;

        info!(
            capability = %capability_name,
            previous = %previous,
            state = %state,
            "Capability state updated"
        );
        Ok(previous)
    }

    /// Record a heartbeat from the owner.
    ///
    /// Returns the health status the record had before the heartbeat.
    pub fn heartbeat(
        &self,
        capability_name: &str,
        requesting_service: &ServiceIdentity,
    ) -> Result<HealthStatus> {
        let mut record = self
            .records
            .get_mut(capability_name)
            .ok_or_else(|| CuratorError::NotFound(capability_name.to_string()))?;

        check_owner(&record, requesting_service)?;

        let previous = record.health_status;
        record.last_heartbeat = Utc::now();
        record.health_status = HealthStatus::Healthy;

        if previous != HealthStatus::Healthy {
            info!(
                capability = %capability_name,
                previous = %previous,
                "Capability recovered"
            );
        } else {
            debug!(capability = %capability_name, "Heartbeat");
        }

        Ok(previous)
    }

    /// Look up a capability. Never mutates.
    pub fn get(&self, capability_name: &str) -> Option<CapabilityRecord> {
        self.records.get(capability_name).map(|r| r.clone())
    }

    /// Whether the name was evicted for missed heartbeats and not re-registered
    pub fn is_evicted(&self, capability_name: &str) -> bool {
        self.tombstones.contains_key(capability_name)
    }

    /// Records owned by services in `realm`, sorted by name.
    ///
    /// `"*"` matches every realm.
    pub fn list_by_owner_realm(&self, realm: &str) -> Vec<CapabilityRecord> {
        self.collect_sorted(|r| realm == ALL_REALMS || r.owner_realm() == realm)
    }

    /// Records owned by the named service, sorted by name
    pub fn list_by_owner_service(&self, service_name: &str) -> Vec<CapabilityRecord> {
        self.collect_sorted(|r| r.owner_service.name == service_name)
    }

    /// Records with the given contract variant, sorted by name
    pub fn list_by_variant(&self, variant: ProtocolVariant) -> Vec<CapabilityRecord> {
        self.collect_sorted(|r| r.protocol_variant() == variant)
    }

    /// Snapshot of every registered name
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.key().clone()).collect()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no live records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counts over the live records
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            evicted: self.tombstones.len(),
            ..Default::default()
        };

        for record in self.records.iter() {
            stats.total += 1;
            match record.health_status {
                HealthStatus::Healthy => stats.healthy += 1,
                HealthStatus::Degraded => stats.degraded += 1,
                HealthStatus::Unknown => {}
            }
            match record.state {
                CapabilityState::Deprecated => stats.deprecated += 1,
                CapabilityState::Maintenance => stats.maintenance += 1,
                CapabilityState::Active | CapabilityState::Experimental => {}
            }
            match record.protocol_variant() {
                ProtocolVariant::RpcContract => stats.rpc_contracts += 1,
                ProtocolVariant::ToolContract => stats.tool_contracts += 1,
            }
            *stats
                .by_realm
                .entry(record.owner_realm().to_string())
                .or_default() += 1;
        }

        stats
    }

    /// Apply liveness rules to one record as of `now`.
    ///
    /// Silence is read under the record's lock, so a heartbeat that lands
    /// between the sweep's key snapshot and this call wins.
    pub(crate) fn apply_liveness(
        &self,
        capability_name: &str,
        now: DateTime<Utc>,
        degraded_after: chrono::Duration,
        evicted_after: chrono::Duration,
    ) -> Option<Transition> {
        let Entry::Occupied(mut entry) = self.records.entry(capability_name.to_string()) else {
            return None;
        };

        let silence = entry.get().silence(now);
        if silence >= evicted_after {
            self.tombstones.insert(capability_name.to_string(), now);
            let (_, record) = entry.remove_entry();
            return Some(Transition::Evicted(record));
        }

        let record = entry.get_mut();
        if record.health_status == HealthStatus::Healthy && silence >= degraded_after {
            record.health_status = HealthStatus::Degraded;
            return Some(Transition::Degraded);
        }

        None
    }

    /// Drop tombstones older than `evicted_before`, then the oldest ones
    /// beyond `max_tombstones`. Returns how many were dropped.
    pub(crate) fn prune_tombstones(&self, evicted_before: DateTime<Utc>, max_tombstones: usize) -> usize {
        let mut pruned = 0;
        self.tombstones.retain(|_, evicted_at| {
            let keep = *evicted_at >= evicted_before;
            if !keep {
                pruned += 1;
            }
            keep
        });

        let excess = self.tombstones.len().saturating_sub(max_tombstones);
        if excess > 0 {
            let mut oldest: Vec<(String, DateTime<Utc>)> = self
                .tombstones
                .iter()
                .map(|t| (t.key().clone(), *t.value()))
                .collect();
            oldest.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

            for (name, evicted_at) in oldest.into_iter().take(excess) {
                if self
                    .tombstones
                    .remove_if(&name, |_, at| *at == evicted_at)
                    .is_some()
                {
                    pruned += 1;
                }
            }
        }

        if pruned > 0 {
            debug!(pruned, remaining = self.tombstones.len(), "Pruned eviction tombstones");
        }
        pruned
    }

    fn collect_sorted(&self, keep: impl Fn(&CapabilityRecord) -> bool) -> Vec<CapabilityRecord> {
        let mut records: Vec<CapabilityRecord> = self
            .records
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }
}

fn stamp(record: &mut CapabilityRecord, now: DateTime<Utc>, registration_id: Uuid) {
    record.last_heartbeat = now;
    record.health_status = HealthStatus::Healthy;
    record.registration_id = Some(registration_id);
}

fn check_owner(record: &CapabilityRecord, requester: &ServiceIdentity) -> Result<()> {
    if record.owner_service.same_service(requester) {
        return Ok(());
    }

    warn!(
        capability = %record.name,
        owner = %record.owner_service,
        requested_by = %requester,
        "Rejected call from non-owner"
    );
    Err(CuratorError::NotOwner {
        capability: record.name.clone(),
        owner: record.owner_service.to_string(),
        requested_by: requester.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Contract;
    use crate::identity::{ServiceIdentity, ServiceKind};

    fn librarian() -> ServiceIdentity {
        ServiceIdentity::smart_city("librarian")
    }

    fn search_record() -> CapabilityRecord {
        CapabilityRecord::new(
            "librarian.search",
            librarian(),
            Contract::rpc("/soa/librarian/search", "POST", "Search knowledge"),
        )
    }

    #[test]
    fn test_register_and_get() {
        let store = RegistryStore::new();
        let outcome = store.register(search_record()).unwrap();
        assert!(matches!(outcome, RegisterOutcome::Inserted { .. }));

        let record = store.get("librarian.search").unwrap();
        assert_eq!(record.health_status, HealthStatus::Healthy);
        assert_eq!(record.registration_id, Some(outcome.registration_id()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_conflicting_owner_does_not_mutate() {
        let store = RegistryStore::new();
        store.register(search_record()).unwrap();
        let before = store.get("librarian.search").unwrap();

        let intruder = CapabilityRecord::new(
            "librarian.search",
            ServiceIdentity::smart_city("data_steward"),
            Contract::rpc("/soa/data_steward/search", "GET", "Hijack"),
        );
        let err = store.register(intruder).unwrap_err();
        assert!(matches!(err, CuratorError::Conflict { .. }));

        assert_eq!(store.get("librarian.search").unwrap(), before);
    }

    #[test]
    fn test_reregistration_keeps_one_record() {
        let store = RegistryStore::new();
        let first = store.register(search_record()).unwrap();
        let first_seen = store.get("librarian.search").unwrap();

        let second = store.register(search_record().with_version("1.1.0")).unwrap();
        assert!(matches!(second, RegisterOutcome::Replaced { .. }));
        assert_ne!(first.registration_id(), second.registration_id());

        let record = store.get("librarian.search").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(record.version, "1.1.0");
        assert!(record.last_heartbeat >= first_seen.last_heartbeat);
        assert_eq!(
            record.owner_service.registered_at,
            first_seen.owner_service.registered_at
        );
    }

    #[test]
    fn test_invalid_contract_rejected_before_store() {
        let store = RegistryStore::new();
        let record = CapabilityRecord::new(
            "librarian.search",
            librarian(),
            Contract::rpc("", "POST", ""),
        );
        assert!(matches!(
            store.register(record),
            Err(CuratorError::InvalidContract { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_deregister_by_non_owner() {
        let store = RegistryStore::new();
        store.register(search_record()).unwrap();

        let err = store
            .deregister("librarian.search", &ServiceIdentity::smart_city("data_steward"))
            .unwrap_err();
        assert!(matches!(err, CuratorError::NotOwner { .. }));
        assert!(store.get("librarian.search").is_some());

        let removed = store.deregister("librarian.search", &librarian()).unwrap();
        assert_eq!(removed.name, "librarian.search");
        assert!(store.get("librarian.search").is_none());
        assert!(!store.is_evicted("librarian.search"));
    }

    #[test]
    fn test_deregister_missing() {
        let store = RegistryStore::new();
        assert_eq!(
            store.deregister("nope", &librarian()),
            Err(CuratorError::NotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_heartbeat_ownership_and_missing() {
        let store = RegistryStore::new();
        assert!(matches!(
            store.heartbeat("librarian.search", &librarian()),
            Err(CuratorError::NotFound(_))
        ));

        store.register(search_record()).unwrap();
        assert!(matches!(
            store.heartbeat("librarian.search", &ServiceIdentity::smart_city("nurse")),
            Err(CuratorError::NotOwner { .. })
        ));
        assert_eq!(
            store.heartbeat("librarian.search", &librarian()),
            Ok(HealthStatus::Healthy)
        );
    }

    #[test]
    fn test_liveness_degrades_then_evicts() {
        let store = RegistryStore::new();
        store.register(search_record()).unwrap();
        let registered = store.get("librarian.search").unwrap().last_heartbeat;

        let degraded_after = chrono::Duration::seconds(60);
        let evicted_after = chrono::Duration::seconds(150);

        let t = registered + chrono::Duration::seconds(30);
        assert_eq!(
            store.apply_liveness("librarian.search", t, degraded_after, evicted_after),
            None
        );

        let t = registered + chrono::Duration::seconds(61);
        assert_eq!(
            store.apply_liveness("librarian.search", t, degraded_after, evicted_after),
            Some(Transition::Degraded)
        );
        assert_eq!(
            store.get("librarian.search").unwrap().health_status,
            HealthStatus::Degraded
        );

        // Already degraded, nothing new to apply
        assert_eq!(
            store.apply_liveness("librarian.search", t, degraded_after, evicted_after),
            None
        );

        let t = registered + chrono::Duration::seconds(151);
        assert!(matches!(
            store.apply_liveness("librarian.search", t, degraded_after, evicted_after),
            Some(Transition::Evicted(_))
        ));
        assert!(store.get("librarian.search").is_none());
        assert!(store.is_evicted("librarian.search"));

        // Registering again clears the tombstone
        store.register(search_record()).unwrap();
        assert!(!store.is_evicted("librarian.search"));
    }

    #[test]
    fn test_tombstones_age_out() {
        let store = RegistryStore::new();
        for i in 0..100 {
            store
                .register(CapabilityRecord::new(
                    format!("svc_{}.op", i),
                    ServiceIdentity::smart_city(format!("svc_{}", i)),
                    Contract::rpc("/op", "POST", ""),
                ))
                .unwrap();
        }

        let evicted_at = Utc::now() + chrono::Duration::days(1);
        for name in store.names() {
            store.apply_liveness(
                &name,
                evicted_at,
                chrono::Duration::seconds(60),
                chrono::Duration::seconds(150),
            );
        }
        assert!(store.is_empty());
        assert_eq!(store.stats().evicted, 100);

        // Still within retention
        assert_eq!(store.prune_tombstones(evicted_at - chrono::Duration::hours(1), 1000), 0);
        assert_eq!(store.stats().evicted, 100);

        let a_year_later = evicted_at + chrono::Duration::days(365);
        assert_eq!(store.prune_tombstones(a_year_later - chrono::Duration::hours(1), 1000), 100);
        assert_eq!(store.stats().evicted, 0);
        assert!(!store.is_evicted("svc_0.op"));
    }

    #[test]
    fn test_tombstone_cap_drops_oldest() {
        let store = RegistryStore::new();
        let t0 = Utc::now();
        for i in 0..5 {
            store.tombstones.insert(format!("gone_{}", i), t0 + chrono::Duration::seconds(i));
        }

        assert_eq!(store.prune_tombstones(t0 - chrono::Duration::hours(1), 2), 3);
        assert!(!store.is_evicted("gone_0"));
        assert!(!store.is_evicted("gone_2"));
        assert!(store.is_evicted("gone_3"));
        assert!(store.is_evicted("gone_4"));
    }

    #[test]
    fn test_live_record_never_tombstoned_under_contention() {
        use std::sync::Arc;

        let store = Arc::new(RegistryStore::new());
        store.register(search_record()).unwrap();

        let registrar = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    store.register(search_record()).unwrap();
                }
            })
        };
        let sweeper = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    // Far enough ahead that every live record is evicted
                    store.apply_liveness(
                        "librarian.search",
                        Utc::now() + chrono::Duration::days(1),
                        chrono::Duration::seconds(60),
                        chrono::Duration::seconds(150),
                    );
                }
            })
        };
        registrar.join().unwrap();
        sweeper.join().unwrap();

        // Exactly one of live or tombstoned, whichever thread finished last
        assert_ne!(
            store.get("librarian.search").is_some(),
            store.is_evicted("librarian.search")
        );

        store.register(search_record()).unwrap();
        assert!(store.get("librarian.search").is_some());
        assert!(!store.is_evicted("librarian.search"));
        assert_eq!(store.stats().evicted, 0);
    }

    #[test]
    fn test_reregistration_keeps_service_kind() {
        let store = RegistryStore::new();
        store.register(search_record()).unwrap();

        let mut relabelled = search_record();
        relabelled.owner_service.kind = ServiceKind::BusinessRealmService;
        store.register(relabelled).unwrap();

        assert_eq!(
            store.get("librarian.search").unwrap().owner_service.kind,
            ServiceKind::SmartCityRole
        );
    }

    #[test]
    fn test_deregister_service_removes_only_its_capabilities() {
        let store = RegistryStore::new();
        store.register(search_record()).unwrap();
        store
            .register(CapabilityRecord::new(
                "librarian.catalog",
                librarian(),
                Contract::tool("librarian_catalog", "Browse", []),
            ))
            .unwrap();
        store
            .register(CapabilityRecord::new(
                "data_steward.store_file",
                ServiceIdentity::smart_city("data_steward"),
                Contract::rpc("/soa/data_steward/store", "POST", ""),
            ))
            .unwrap();

        // Same name, other realm: not the owner
        let impostor = ServiceIdentity::new("librarian", ServiceKind::BusinessRealmService, "journey");
        assert_eq!(
            store.deregister_service(&impostor),
            Err(CuratorError::NotFound("librarian@journey".to_string()))
        );
        assert_eq!(store.len(), 3);

        assert_eq!(
            store.deregister_service(&librarian()).unwrap(),
            vec!["librarian.catalog".to_string(), "librarian.search".to_string()]
        );
        assert_eq!(store.names(), vec!["data_steward.store_file".to_string()]);
        assert!(!store.is_evicted("librarian.search"));
        assert!(matches!(
            store.deregister_service(&librarian()),
            Err(CuratorError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_state() {
        let store = RegistryStore::new();
        store.register(search_record()).unwrap();
        let before = store.get("librarian.search").unwrap();

        assert!(matches!(
            store.update_state(
                "librarian.search",
                &ServiceIdentity::smart_city("nurse"),
                CapabilityState::Maintenance
            ),
            Err(CuratorError::NotOwner { .. })
        ));
        assert!(matches!(
            store.update_state("missing", &librarian(), CapabilityState::Deprecated),
            Err(CuratorError::NotFound(_))
        ));

        assert_eq!(
            store.update_state("librarian.search", &librarian(), CapabilityState::Deprecated),
            Ok(CapabilityState::Active)
        );

        let after = store.get("librarian.search").unwrap();
        assert_eq!(after.state, CapabilityState::Deprecated);
        assert_eq!(after.registration_id, before.registration_id);
        assert_eq!(after.last_heartbeat, before.last_heartbeat);
        assert_eq!(store.stats().deprecated, 1);
    }

    #[test]
    fn test_list_by_realm_and_wildcard() {
        let store = RegistryStore::new();
        store.register(search_record()).unwrap();
        store
            .register(CapabilityRecord::new(
                "content.parse",
                ServiceIdentity::new(
                    "content_pillar",
                    ServiceKind::BusinessRealmService,
                    "business_enablement",
                ),
                Contract::tool("content_parse_file", "Parse a file", []),
            ))
            .unwrap();

        let city = store.list_by_owner_realm("smart_city");
        assert_eq!(city.len(), 1);
        assert_eq!(city[0].name, "librarian.search");

        let all = store.list_by_owner_realm(ALL_REALMS);
        let names: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["content.parse", "librarian.search"]);

        assert_eq!(store.list_by_variant(ProtocolVariant::ToolContract).len(), 1);
        assert_eq!(store.list_by_owner_service("librarian").len(), 1);
        assert!(store.list_by_owner_realm("journey").is_empty());

        let stats = store.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.healthy, 2);
        assert_eq!(stats.rpc_contracts, 1);
        assert_eq!(stats.tool_contracts, 1);
        assert_eq!(stats.by_realm.get("smart_city"), Some(&1));
    }
}
