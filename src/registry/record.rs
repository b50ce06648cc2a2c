//! Capability records held by the registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::contract::{Contract, ProtocolVariant};
use crate::identity::ServiceIdentity;
use crate::types::{CuratorError, Result};

/// Liveness of a registered capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Heartbeat received within the degraded window
    Healthy,
    /// Heartbeats missed, still resolvable until eviction
    Degraded,
    /// Not yet accepted by the registry
    #[default]
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Lifecycle state set by the owning service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityState {
    #[default]
    Active,
    /// Still served, scheduled for removal
    Deprecated,
    /// Temporarily out of service; resolution fails as unavailable
    Maintenance,
    /// Served, with no stability promise
    Experimental,
}

impl fmt::Display for CapabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityState::Active => write!(f, "active"),
            CapabilityState::Deprecated => write!(f, "deprecated"),
            CapabilityState::Maintenance => write!(f, "maintenance"),
            CapabilityState::Experimental => write!(f, "experimental"),
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// A registered capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    /// Globally unique capability name (e.g., "librarian.search")
    pub name: String,
    /// Service that owns this capability
    pub owner_service: ServiceIdentity,
    /// How the capability is invoked
    pub contract: Contract,
    /// Protocol implemented by the owner (e.g., "LibrarianServiceProtocol")
    #[serde(default)]
    pub protocol_name: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub state: CapabilityState,
    #[serde(default)]
    pub health_status: HealthStatus,
    #[serde(default = "Utc::now")]
    pub last_heartbeat: DateTime<Utc>,
    /// Minted on every accepted registration
    #[serde(default)]
    pub registration_id: Option<Uuid>,
}

impl CapabilityRecord {
    /// Create an unregistered record
    pub fn new(name: impl Into<String>, owner_service: ServiceIdentity, contract: Contract) -> Self {
        Self {
            name: name.into(),
            owner_service,
            contract,
            protocol_name: None,
            version: default_version(),
            state: CapabilityState::Active,
            health_status: HealthStatus::Unknown,
            last_heartbeat: Utc::now(),
            registration_id: None,
        }
    }

    /// Set the implementing protocol name
    pub fn with_protocol(mut self, protocol_name: impl Into<String>) -> Self {
        self.protocol_name = Some(protocol_name.into());
        self
    }

    /// Set the capability version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the lifecycle state
    pub fn with_state(mut self, state: CapabilityState) -> Self {
        self.state = state;
        self
    }

    /// Contract variant tag
    pub fn protocol_variant(&self) -> ProtocolVariant {
        self.contract.variant()
    }

    /// Realm of the owning service
    pub fn owner_realm(&self) -> &str {
        &self.owner_service.realm
    }

    /// Description taken from the contract
    pub fn description(&self) -> &str {
        self.contract.description()
    }

    /// Check the record is complete enough to store
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CuratorError::invalid("name", "must not be empty"));
        }
        if self.owner_service.name.trim().is_empty() {
            return Err(CuratorError::invalid("owner_service.name", "must not be empty"));
        }
        if self.owner_service.realm.trim().is_empty() {
            return Err(CuratorError::invalid("owner_service.realm", "must not be empty"));
        }
        self.contract.validate()
    }

    /// Time elapsed since the last heartbeat, as of `now`
    pub fn silence(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_heartbeat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_unknown() {
        let record = CapabilityRecord::new(
            "librarian.search",
            ServiceIdentity::smart_city("librarian"),
            Contract::rpc("/soa/librarian/search", "POST", "Search"),
        );
        assert_eq!(record.health_status, HealthStatus::Unknown);
        assert_eq!(record.version, "1.0.0");
        assert!(record.registration_id.is_none());
        assert_eq!(record.protocol_variant(), ProtocolVariant::RpcContract);
        assert_eq!(record.owner_realm(), "smart_city");
    }

    #[test]
    fn test_validate_owner_fields() {
        let mut record = CapabilityRecord::new(
            "librarian.search",
            ServiceIdentity::smart_city("librarian"),
            Contract::rpc("/soa/librarian/search", "POST", "Search"),
        );
        record.owner_service.realm = String::new();

        match record.validate() {
            Err(CuratorError::InvalidContract { field, .. }) => {
                assert_eq!(field, "owner_service.realm")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_record_from_manifest_json() {
        let json = r#"{
            "name": "librarian.search",
            "owner_service": { "name": "librarian", "kind": "smart_city_role", "realm": "smart_city" },
            "contract": { "variant": "rpc", "endpoint_path": "/soa/librarian/search", "http_method": "POST" },
            "protocol_name": "LibrarianServiceProtocol"
        }"#;

        let record: CapabilityRecord = serde_json::from_str(json).unwrap();
        assert!(record.validate().is_ok());
        assert_eq!(record.version, "1.0.0");
        assert_eq!(record.state, CapabilityState::Active);
        assert_eq!(record.protocol_name.as_deref(), Some("LibrarianServiceProtocol"));
    }
}
