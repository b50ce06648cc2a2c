//! Discovery resolver
//!
//! Resolves a capability name to a provider handle for one consumer:
//!
//! 1. Look the name up in the registry
//! 2. A missing name is `CapabilityUnavailable` if it was evicted for missed
//!    heartbeats, `CapabilityNotFound` otherwise
//! 3. A capability its owner put in maintenance is `CapabilityUnavailable`
//! 4. Ask the access policy for a grant; no grant is `AccessDenied`
//! 5. Return a read-only handle copied out of the record
//!
//! Names are unique, so resolution is a single lookup with no ranking.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::contract::Contract;
use crate::identity::{ConsumerIdentity, ServiceIdentity};
use crate::policy::{AccessGrant, AccessPolicy};
use crate::registry::{CapabilityState, HealthStatus, RegistryStore};
use crate::types::{CuratorError, Result};

/// Read-only view of a resolved provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderHandle {
    pub capability_name: String,
    pub owner_service: ServiceIdentity,
    pub contract: Contract,
    /// Lifecycle state at resolution time
    pub state: CapabilityState,
    /// Health at resolution time
    pub health_status: HealthStatus,
    /// The grant that allowed this resolution
    pub grant: AccessGrant,
}

/// Resolves capability names for consumers
pub struct DiscoveryResolver {
    registry: Arc<RegistryStore>,
    policy: Arc<AccessPolicy>,
}

impl DiscoveryResolver {
    pub fn new(registry: Arc<RegistryStore>, policy: Arc<AccessPolicy>) -> Self {
        Self { registry, policy }
    }

    /// Resolve `capability_name` on behalf of `consumer`
    pub fn resolve(&self, capability_name: &str, consumer: &ConsumerIdentity) -> Result<ProviderHandle> {
        let Some(record) = self.registry.get(capability_name) else {
            if self.registry.is_evicted(capability_name) {
                debug!(capability = %capability_name, consumer = %consumer, "Resolve: evicted");
                return Err(CuratorError::CapabilityUnavailable(capability_name.to_string()));
            }
            debug!(capability = %capability_name, consumer = %consumer, "Resolve: not registered");
            return Err(CuratorError::CapabilityNotFound(capability_name.to_string()));
        };

        if record.state == CapabilityState::Maintenance {
            debug!(capability = %capability_name, consumer = %consumer, "Resolve: in maintenance");
            return Err(CuratorError::CapabilityUnavailable(capability_name.to_string()));
        }

        let Some(grant) = self.policy.grant(consumer, &record) else {
            warn!(
                capability = %capability_name,
                consumer = %consumer,
                realm_scoped = consumer.is_realm_scoped,
                "Access denied"
            );
            return Err(CuratorError::AccessDenied {
                consumer: consumer.to_string(),
                capability: capability_name.to_string(),
            });
        };

        debug!(
            capability = %capability_name,
            consumer = %consumer,
            basis = %grant.basis,
            "Resolved capability"
        );

        Ok(ProviderHandle {
            capability_name: record.name,
            owner_service: record.owner_service,
            contract: record.contract,
            state: record.state,
            health_status: record.health_status,
            grant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{AccessMap, GrantBasis, DEFAULT_SHARED_REALM};
    use crate::registry::CapabilityRecord;

    fn setup(map: AccessMap) -> (Arc<RegistryStore>, DiscoveryResolver) {
        let registry = Arc::new(RegistryStore::new());
        registry
            .register(CapabilityRecord::new(
                "librarian.search",
                ServiceIdentity::smart_city("librarian"),
                Contract::rpc("/soa/librarian/search", "POST", "Search"),
            ))
            .unwrap();
        let policy = Arc::new(AccessPolicy::new(
            Arc::clone(&registry),
            Arc::new(map),
            DEFAULT_SHARED_REALM,
        ));
        let resolver = DiscoveryResolver::new(Arc::clone(&registry), policy);
        (registry, resolver)
    }

    #[test]
    fn test_resolve_realm_scoped() {
        let (_, resolver) = setup(AccessMap::empty());
        let consumer = ConsumerIdentity::realm_scoped("traffic_cop", "smart_city");

        let handle = resolver.resolve("librarian.search", &consumer).unwrap();
        assert_eq!(handle.capability_name, "librarian.search");
        assert_eq!(handle.owner_service.name, "librarian");
        assert_eq!(handle.grant.basis, GrantBasis::OwnRealm);
        assert_eq!(handle.contract, Contract::rpc("/soa/librarian/search", "POST", "Search"));
    }

    #[test]
    fn test_resolve_denied() {
        let (_, resolver) = setup(AccessMap::empty());
        let consumer = ConsumerIdentity::mapped("content_pillar", "business_enablement");

        let err = resolver.resolve("librarian.search", &consumer).unwrap_err();
        assert!(matches!(err, CuratorError::AccessDenied { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_resolve_not_found_vs_unavailable() {
        let (registry, resolver) = setup(AccessMap::empty());
        let consumer = ConsumerIdentity::realm_scoped("traffic_cop", "smart_city");

        assert_eq!(
            resolver.resolve("missing", &consumer),
            Err(CuratorError::CapabilityNotFound("missing".to_string()))
        );

        let heartbeat = registry.get("librarian.search").unwrap().last_heartbeat;
        registry.apply_liveness(
            "librarian.search",
            heartbeat + chrono::Duration::seconds(300),
            chrono::Duration::seconds(60),
            chrono::Duration::seconds(150),
        );
        assert_eq!(
            resolver.resolve("librarian.search", &consumer),
            Err(CuratorError::CapabilityUnavailable("librarian.search".to_string()))
        );
    }

    #[test]
    fn test_maintenance_is_unavailable() {
        let (registry, resolver) = setup(AccessMap::empty());
        let consumer = ConsumerIdentity::realm_scoped("traffic_cop", "smart_city");
        let librarian = ServiceIdentity::smart_city("librarian");

        registry
            .update_state("librarian.search", &librarian, CapabilityState::Maintenance)
            .unwrap();
        let err = resolver.resolve("librarian.search", &consumer).unwrap_err();
        assert_eq!(err, CuratorError::CapabilityUnavailable("librarian.search".to_string()));
        assert!(err.is_retryable());

        registry
            .update_state("librarian.search", &librarian, CapabilityState::Deprecated)
            .unwrap();
        let handle = resolver.resolve("librarian.search", &consumer).unwrap();
        assert_eq!(handle.state, CapabilityState::Deprecated);
    }

    #[test]
    fn test_handle_is_a_copy() {
        let (registry, resolver) = setup(AccessMap::empty());
        let consumer = ConsumerIdentity::realm_scoped("traffic_cop", "smart_city");

        let handle = resolver.resolve("librarian.search", &consumer).unwrap();
        registry
            .deregister("librarian.search", &ServiceIdentity::smart_city("librarian"))
            .unwrap();

        assert_eq!(handle.capability_name, "librarian.search");
        assert!(matches!(
            resolver.resolve("librarian.search", &consumer),
            Err(CuratorError::CapabilityNotFound(_))
        ));
    }
}
