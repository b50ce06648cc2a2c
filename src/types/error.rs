//! Error types for the curator
//!
//! Every failure in the registry is a typed value returned from the call.
//! Nothing here is fatal to the process.

/// Main error type for curator operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CuratorError {
    #[error("Invalid contract: field '{field}' {reason}")]
    InvalidContract { field: String, reason: String },

    #[error("Conflict: capability '{capability}' is owned by '{existing_owner}', not '{requested_by}'")]
    Conflict {
        capability: String,
        existing_owner: String,
        requested_by: String,
    },

    #[error("Not owner: capability '{capability}' is owned by '{owner}', not '{requested_by}'")]
    NotOwner {
        capability: String,
        owner: String,
        requested_by: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Capability not found: {0}")]
    CapabilityNotFound(String),

    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Access denied: '{consumer}' may not use '{capability}'")]
    AccessDenied { consumer: String, capability: String },

    #[error("Curator has not been started")]
    NotInitialized,

    #[error("Curator is shutting down")]
    ShuttingDown,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CuratorError {
    /// Build an `InvalidContract` error for a field
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidContract {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller may retry the same call later with a different outcome.
    ///
    /// Only discovery misses are transient (the provider may be restarting).
    /// Policy denials need a mapping-table change, contract and ownership
    /// errors need a caller fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CapabilityNotFound(_) | Self::CapabilityUnavailable(_)
        )
    }

    /// Stable label for callers that map errors onto a transport
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidContract { .. } => "invalid_contract",
            Self::Conflict { .. } => "conflict",
            Self::NotOwner { .. } => "not_owner",
            Self::NotFound(_) => "not_found",
            Self::CapabilityNotFound(_) => "capability_not_found",
            Self::CapabilityUnavailable(_) => "capability_unavailable",
            Self::AccessDenied { .. } => "access_denied",
            Self::NotInitialized => "not_initialized",
            Self::ShuttingDown => "shutting_down",
            Self::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for CuratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for CuratorError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("TOML error: {}", err))
    }
}

impl From<std::io::Error> for CuratorError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for curator operations
pub type Result<T> = std::result::Result<T, CuratorError>;
