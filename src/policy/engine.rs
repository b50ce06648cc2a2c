//! Access policy engine

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::access_map::AccessMap;
use crate::identity::ConsumerIdentity;
use crate::registry::{CapabilityRecord, RegistryStore};
use crate::types::{CuratorError, Result};

/// Realm visible to every realm-scoped consumer unless configured otherwise
pub const DEFAULT_SHARED_REALM: &str = "shared";

/// Why a grant was given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantBasis {
    /// Realm-scoped consumer, capability in its own realm
    OwnRealm,
    /// Realm-scoped consumer, capability in the shared realm
    SharedRealm,
    /// Explicit access map entry
    Mapping,
}

impl fmt::Display for GrantBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantBasis::OwnRealm => write!(f, "own_realm"),
            GrantBasis::SharedRealm => write!(f, "shared_realm"),
            GrantBasis::Mapping => write!(f, "mapping"),
        }
    }
}

/// A grant computed for one resolution. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGrant {
    pub consumer: ConsumerIdentity,
    pub capability_name: String,
    pub basis: GrantBasis,
    pub granted_at: DateTime<Utc>,
}

/// Computes which capabilities a consumer may use.
///
/// Holds only read access to the registry and an immutable access map, so
/// every decision is a pure function of the current registry contents.
pub struct AccessPolicy {
    registry: Arc<RegistryStore>,
    access_map: Arc<AccessMap>,
    shared_realm: String,
}

impl AccessPolicy {
    /// Create a policy engine over a registry
    pub fn new(
        registry: Arc<RegistryStore>,
        access_map: Arc<AccessMap>,
        shared_realm: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            access_map,
            shared_realm: shared_realm.into(),
        }
    }

    /// The configured shared realm
    pub fn shared_realm(&self) -> &str {
        &self.shared_realm
    }

    /// Decide access to an already looked-up record
    pub fn grant(&self, consumer: &ConsumerIdentity, record: &CapabilityRecord) -> Option<AccessGrant> {
        let basis = self.basis(consumer, record)?;
        Some(AccessGrant {
            consumer: consumer.clone(),
            capability_name: record.name.clone(),
            basis,
            granted_at: Utc::now(),
        })
    }

    /// Whether `consumer` may use `capability_name`.
    ///
    /// Fails only when the capability is not registered; a policy denial is
    /// `Ok(false)`.
    pub fn authorize(&self, consumer: &ConsumerIdentity, capability_name: &str) -> Result<bool> {
        let record = self.registry.get(capability_name).ok_or_else(|| {
            if self.registry.is_evicted(capability_name) {
                CuratorError::CapabilityUnavailable(capability_name.to_string())
            } else {
                CuratorError::CapabilityNotFound(capability_name.to_string())
            }
        })?;

        let granted = self.basis(consumer, &record).is_some();
        debug!(
            consumer = %consumer,
            capability = %capability_name,
            granted,
            "Authorization evaluated"
        );
        Ok(granted)
    }

    /// Every registered capability the consumer may use, sorted by name
    pub fn entitlements(&self, consumer: &ConsumerIdentity) -> Vec<String> {
        let names: BTreeSet<String> = if consumer.is_realm_scoped {
            let mut names: BTreeSet<String> = self
                .registry
                .list_by_owner_realm(&consumer.realm)
                .into_iter()
                .map(|r| r.name)
                .collect();
            names.extend(
                self.registry
                    .list_by_owner_realm(&self.shared_realm)
                    .into_iter()
                    .map(|r| r.name),
            );
            names
        } else {
            match self.access_map.allowed_for(&consumer.name) {
                Some(allowed) => allowed
                    .iter()
                    .filter(|name| self.registry.get(name.as_str()).is_some())
                    .cloned()
                    .collect(),
                None => BTreeSet::new(),
            }
        };

        names.into_iter().collect()
    }

    fn basis(&self, consumer: &ConsumerIdentity, record: &CapabilityRecord) -> Option<GrantBasis> {
        if consumer.is_realm_scoped {
            let realm = record.owner_realm();
            if realm == consumer.realm {
                Some(GrantBasis::OwnRealm)
            } else if realm == self.shared_realm {
                Some(GrantBasis::SharedRealm)
            } else {
                None
            }
        } else if self.access_map.allows(&consumer.name, &record.name) {
            Some(GrantBasis::Mapping)
        } else {
            None
        }
    }
}
