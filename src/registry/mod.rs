//! Capability registry
//!
//! Holds every live capability record. Only the registration protocol and
//! the heartbeat monitor mutate it; discovery and access policy only read.

pub mod record;
pub mod store;

pub use record::{CapabilityRecord, CapabilityState, HealthStatus};
pub use store::{RegisterOutcome, RegistryStats, RegistryStore, Transition, ALL_REALMS};
