// crates/fleet-mcp-contract/src/types.rs
// ============================================================================
// Module: Contract Types
// Description: Shared data models for the Fleet MCP tool surface.
// Purpose: Provide canonical tool identifiers and definition shapes.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Canonical tool identifiers and the shapes used to advertise them over MCP.
//! Tool names are part of the external contract surface; renaming one is a
//! breaking change for every agent that calls it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Canonical tool names for the Fleet MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Fetch the authenticated account.
    Whoami,
    /// List clusters filtered by state.
    GetClusters,
    /// Fetch a single cluster by identifier.
    GetCluster,
    /// Provision a ROSA cluster with hosted control planes.
    CreateRosaHcpCluster,
    /// Create an htpasswd identity provider on a cluster.
    SetupHtpasswdIdentityProvider,
}

impl ToolName {
    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Whoami => "whoami",
            Self::GetClusters => "get_clusters",
            Self::GetCluster => "get_cluster",
            Self::CreateRosaHcpCluster => "create_rosa_hcp_cluster",
            Self::SetupHtpasswdIdentityProvider => "setup_htpasswd_identity_provider",
        }
    }

    /// Returns all tool names in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Whoami,
            Self::GetClusters,
            Self::GetCluster,
            Self::CreateRosaHcpCluster,
            Self::SetupHtpasswdIdentityProvider,
        ]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tooling Contracts
// ============================================================================

/// Tool definition used by MCP tool listing.
///
/// # Invariants
/// - `name` is a stable MCP tool identifier.
/// - `input_schema` is a JSON Schema payload for the tool input shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// MCP tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool input.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool contract with input schema and usage notes.
///
/// # Invariants
/// - `input_schema` is a JSON Schema object with `additionalProperties: false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContract {
    /// Tool name.
    pub name: ToolName,
    /// Tool description.
    pub description: String,
    /// JSON schema for tool input payload.
    pub input_schema: Value,
    /// Notes describing tool usage and failure behavior.
    pub notes: Vec<String>,
}

impl ToolContract {
    /// Returns the listing definition for this contract.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name,
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}
