//! Service and consumer identities
//!
//! A `ServiceIdentity` owns capabilities; a `ConsumerIdentity` asks for them.
//! Consumers carry no persisted state and are supplied on every call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Realm of the privileged platform tier
pub const SMART_CITY_REALM: &str = "smart_city";

/// Realms the platform ships with. Anything else is accepted but logged.
pub const KNOWN_REALMS: &[&str] = &[
    SMART_CITY_REALM,
    "business_enablement",
    "journey",
    "solution",
    "experience",
    "agentic",
];

/// Kind of service that registered a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Privileged platform role (librarian, traffic cop, ...)
    SmartCityRole,
    /// Business-logic service in one of the realms
    BusinessRealmService,
    #[default]
    Unknown,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::SmartCityRole => write!(f, "smart_city_role"),
            ServiceKind::BusinessRealmService => write!(f, "business_realm_service"),
            ServiceKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Identity of a service that owns capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// Unique service name (e.g., "librarian")
    pub name: String,
    /// Kind of service
    #[serde(default)]
    pub kind: ServiceKind,
    /// Realm the service belongs to (e.g., "smart_city")
    pub realm: String,
    /// When the service first registered the capability
    #[serde(default = "Utc::now")]
    pub registered_at: DateTime<Utc>,
}

impl ServiceIdentity {
    /// Create an identity stamped with the current time
    pub fn new(name: impl Into<String>, kind: ServiceKind, realm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            realm: realm.into(),
            registered_at: Utc::now(),
        }
    }

    /// Convenience constructor for a Smart City role
    pub fn smart_city(name: impl Into<String>) -> Self {
        Self::new(name, ServiceKind::SmartCityRole, SMART_CITY_REALM)
    }

    /// Whether `other` names the same service.
    ///
    /// Ownership is decided by name and realm; the registration timestamp
    /// is ignored.
    pub fn same_service(&self, other: &ServiceIdentity) -> bool {
        self.name == other.name && self.realm == other.realm
    }

    /// Whether the realm is one of the platform's standard realms
    pub fn in_known_realm(&self, shared_realm: &str) -> bool {
        self.realm == shared_realm || KNOWN_REALMS.contains(&self.realm.as_str())
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.realm)
    }
}

/// Identity of a caller asking for a capability
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsumerIdentity {
    /// Consumer name, the key into the 1:1 access map
    pub name: String,
    /// Realm the consumer belongs to
    pub realm: String,
    /// True for the privileged tier (realm-wide grant)
    #[serde(default)]
    pub is_realm_scoped: bool,
}

impl ConsumerIdentity {
    /// A realm-scoped consumer (broad same-realm plus shared access)
    pub fn realm_scoped(name: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            realm: realm.into(),
            is_realm_scoped: true,
        }
    }

    /// A consumer restricted to its explicit allow-list
    pub fn mapped(name: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            realm: realm.into(),
            is_realm_scoped: false,
        }
    }
}

impl fmt::Display for ConsumerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.realm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_service_ignores_timestamp() {
        let a = ServiceIdentity::smart_city("librarian");
        let mut b = ServiceIdentity::smart_city("librarian");
        b.registered_at = a.registered_at + chrono::Duration::hours(1);

        assert!(a.same_service(&b));
        assert!(!a.same_service(&ServiceIdentity::smart_city("data_steward")));
    }

    #[test]
    fn test_same_name_other_realm_is_different_service() {
        let a = ServiceIdentity::smart_city("librarian");
        let b = ServiceIdentity::new("librarian", ServiceKind::BusinessRealmService, "journey");
        assert!(!a.same_service(&b));
    }

    #[test]
    fn test_known_realms() {
        let service = ServiceIdentity::new("x", ServiceKind::Unknown, "shared");
        assert!(service.in_known_realm("shared"));
        assert!(!service.in_known_realm("platform"));

        let city = ServiceIdentity::smart_city("nurse");
        assert!(city.in_known_realm("shared"));
    }

    #[test]
    fn test_service_kind_serde() {
        let json = serde_json::to_string(&ServiceKind::SmartCityRole).unwrap();
        assert_eq!(json, "\"smart_city_role\"");
        let kind: ServiceKind = serde_json::from_str("\"business_realm_service\"").unwrap();
        assert_eq!(kind, ServiceKind::BusinessRealmService);
    }
}
