//! Capability contracts
//!
//! A capability is described by exactly one contract variant:
//!
//! - **Rpc**: an HTTP-style endpoint (`POST /soa/librarian/search`)
//! - **Tool**: a named tool invocation with a typed parameter schema
//!
//! Contracts are checked for structural completeness before a capability is
//! accepted into the registry. Adding a contract kind means adding a variant
//! here; every match over `Contract` then has to handle it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::types::{CuratorError, Result};

/// HTTP methods an RPC contract may declare
pub const ALLOWED_HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Contract kind tag, used for catalog queries and stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    RpcContract,
    ToolContract,
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVariant::RpcContract => write!(f, "rpc_contract"),
            ProtocolVariant::ToolContract => write!(f, "tool_contract"),
        }
    }
}

/// Endpoint-style contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcContract {
    /// Endpoint path (e.g., "/soa/librarian/search")
    pub endpoint_path: String,
    /// One of GET/POST/PUT/DELETE/PATCH
    pub http_method: String,
    #[serde(default)]
    pub description: String,
}

/// Tool-style invocation contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContract {
    /// Tool name as exposed to agents (e.g., "librarian_search")
    pub tool_name: String,
    #[serde(default)]
    pub description: String,
    /// Parameter name -> parameter type
    #[serde(default)]
    pub input_schema: BTreeMap<String, ToolParam>,
}

/// One parameter of a tool's input schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParam {
    #[serde(flatten)]
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
}

/// Primitive or enum parameter type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Enum { values: Vec<String> },
}

impl ToolParam {
    /// A required parameter
    pub fn required(kind: ParamKind) -> Self {
        Self {
            kind,
            required: true,
        }
    }

    /// An optional parameter
    pub fn optional(kind: ParamKind) -> Self {
        Self {
            kind,
            required: false,
        }
    }
}

/// The closed set of contract variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum Contract {
    Rpc(RpcContract),
    Tool(ToolContract),
}

impl Contract {
    /// Build an RPC contract
    pub fn rpc(endpoint_path: &str, http_method: &str, description: &str) -> Self {
        Contract::Rpc(RpcContract {
            endpoint_path: endpoint_path.to_string(),
            http_method: http_method.to_string(),
            description: description.to_string(),
        })
    }

    /// Build a tool contract
    pub fn tool(
        tool_name: &str,
        description: &str,
        input_schema: impl IntoIterator<Item = (String, ToolParam)>,
    ) -> Self {
        Contract::Tool(ToolContract {
            tool_name: tool_name.to_string(),
            description: description.to_string(),
            input_schema: input_schema.into_iter().collect(),
        })
    }

    /// Which variant this contract is
    pub fn variant(&self) -> ProtocolVariant {
        match self {
            Contract::Rpc(_) => ProtocolVariant::RpcContract,
            Contract::Tool(_) => ProtocolVariant::ToolContract,
        }
    }

    /// Human-readable description, whichever variant
    pub fn description(&self) -> &str {
        match self {
            Contract::Rpc(rpc) => &rpc.description,
            Contract::Tool(tool) => &tool.description,
        }
    }

    /// Check structural completeness.
    ///
    /// Returns `InvalidContract` naming the first field that failed.
    pub fn validate(&self) -> Result<()> {
        match self {
            Contract::Rpc(rpc) => validate_rpc(rpc),
            Contract::Tool(tool) => validate_tool(tool),
        }
    }
}

fn validate_rpc(rpc: &RpcContract) -> Result<()> {
    if rpc.endpoint_path.trim().is_empty() {
        return Err(CuratorError::invalid(
            "contract.endpoint_path",
            "must not be empty",
        ));
    }

    if !ALLOWED_HTTP_METHODS.contains(&rpc.http_method.as_str()) {
        return Err(CuratorError::invalid(
            "contract.http_method",
            format!(
                "must be one of {}, got '{}'",
                ALLOWED_HTTP_METHODS.join("/"),
                rpc.http_method
            ),
        ));
    }

    Ok(())
}

fn validate_tool(tool: &ToolContract) -> Result<()> {
    if tool.tool_name.trim().is_empty() {
        return Err(CuratorError::invalid("contract.tool_name", "must not be empty"));
    }

    for (param, param_type) in &tool.input_schema {
        if param.trim().is_empty() {
            return Err(CuratorError::invalid(
                "contract.input_schema",
                "parameter names must not be empty",
            ));
        }

        if let ParamKind::Enum { values } = &param_type.kind {
            let field = format!("contract.input_schema.{}", param);
            if values.is_empty() {
                return Err(CuratorError::invalid(field, "enum must list at least one value"));
            }
            let mut seen = HashSet::new();
            for value in values {
                if value.is_empty() {
                    return Err(CuratorError::invalid(field, "enum values must not be empty"));
                }
                if !seen.insert(value.as_str()) {
                    return Err(CuratorError::invalid(
                        field,
                        format!("duplicate enum value '{}'", value),
                    ));
                }
            }
        }
    }

    Ok(())
}
