//! Access policy
//!
//! Decides which capabilities a consumer may use. Two policies apply,
//! chosen by the consumer's identity:
//!
//! - **Realm-scoped** consumers get every capability owned by their own realm
//!   plus everything in the shared realm, and nothing else.
//! - **Mapped** consumers get exactly the capabilities listed for them in the
//!   static access map. No entry means no capabilities.
//!
//! Grants are recomputed on every call, so registrations and evictions are
//! reflected immediately.

pub mod access_map;
pub mod engine;

pub use access_map::AccessMap;
pub use engine::{AccessGrant, AccessPolicy, GrantBasis, DEFAULT_SHARED_REALM};
