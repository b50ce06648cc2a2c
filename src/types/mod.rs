//! Shared types for the curator

pub mod error;

pub use error::{CuratorError, Result};
