//! Curator - capability registry and discovery
//!
//! "Every capability in its place"
//!
//! Services advertise what they can do as typed contracts; consumers discover
//! those capabilities by name, gated by a realm-aware access policy.
//!
//! ## Components
//!
//! - **Contract**: RPC-style and tool-style contract variants, with validation
//! - **Registry**: concurrency-safe store of capability records
//! - **Heartbeat**: background sweep that degrades and evicts silent records
//! - **Discovery**: resolves a capability name to a provider handle
//! - **Policy**: realm-scoped and 1:1 mapped access decisions
//! - **Curator**: lifecycle facade tying the above together

pub mod config;
pub mod contract;
pub mod curator;
pub mod discovery;
pub mod heartbeat;
pub mod identity;
pub mod manifest;
pub mod policy;
pub mod registry;
pub mod types;

pub use config::Args;
pub use contract::{Contract, ParamKind, ProtocolVariant, RpcContract, ToolContract, ToolParam};
pub use curator::{Curator, CuratorConfig, LifecycleState, RegistryStatus};
pub use discovery::ProviderHandle;
pub use heartbeat::{HeartbeatConfig, SweepReport};
pub use identity::{ConsumerIdentity, ServiceIdentity, ServiceKind};
pub use policy::{AccessGrant, AccessMap, GrantBasis};
pub use registry::{CapabilityRecord, CapabilityState, HealthStatus, RegisterOutcome};
pub use types::{CuratorError, Result};
