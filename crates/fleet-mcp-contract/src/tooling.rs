// crates/fleet-mcp-contract/src/tooling.rs
// ============================================================================
// Module: MCP Tool Contracts
// Description: Canonical MCP tool definitions and schemas for Fleet MCP.
// Purpose: Provide tool contracts for MCP listing and argument documentation.
// Dependencies: serde_json, crate::types
// ============================================================================

//! ## Overview
//! This module defines the canonical MCP tool surface. Every input schema is
//! a closed JSON Schema object; argument types are limited to string, boolean,
//! and array-of-string so the server-side argument bag can validate them
//! without a schema engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::types::ToolContract;
use crate::types::ToolDefinition;
use crate::types::ToolName;

// ============================================================================
// SECTION: Tool Contracts
// ============================================================================

/// Returns the canonical MCP tool contracts.
///
/// The order is preserved in `tools/list` responses. Append new tools at the
/// end.
#[must_use]
pub fn tool_contracts() -> Vec<ToolContract> {
    ToolName::all().iter().map(|name| tool_contract(*name)).collect()
}

/// Returns the contract for a single tool.
#[must_use]
pub fn tool_contract(name: ToolName) -> ToolContract {
    match name {
        ToolName::Whoami => whoami_contract(),
        ToolName::GetClusters => get_clusters_contract(),
        ToolName::GetCluster => get_cluster_contract(),
        ToolName::CreateRosaHcpCluster => create_rosa_hcp_cluster_contract(),
        ToolName::SetupHtpasswdIdentityProvider => setup_htpasswd_identity_provider_contract(),
    }
}

/// Returns tool definitions for MCP tool listing.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    tool_contracts().iter().map(ToolContract::definition).collect()
}

/// Builds the tool contract for `whoami`.
fn whoami_contract() -> ToolContract {
    build_tool_contract(
        ToolName::Whoami,
        "Get the authenticated account",
        tool_input_schema(&json!({}), &[]),
        vec![
            "Useful as a credential check before other calls.".to_string(),
            "Returns username, email, and organization of the token owner.".to_string(),
        ],
    )
}

/// Builds the tool contract for `get_clusters`.
fn get_clusters_contract() -> ToolContract {
    build_tool_contract(
        ToolName::GetClusters,
        "Retrieves the list of clusters",
        tool_input_schema(
            &json!({
                "state": schema_for_string(
                    "Filter clusters by state (e.g., ready, installing, error)"
                )
            }),
            &["state"],
        ),
        vec!["The state is passed to the backend search filter verbatim.".to_string()],
    )
}

/// Builds the tool contract for `get_cluster`.
fn get_cluster_contract() -> ToolContract {
    build_tool_contract(
        ToolName::GetCluster,
        "Retrieves the details of the cluster",
        tool_input_schema(
            &json!({
                "cluster_id": schema_for_string("Unique cluster identifier")
            }),
            &["cluster_id"],
        ),
        vec!["Unknown identifiers surface the backend's own not-found code.".to_string()],
    )
}

/// Builds the tool contract for `create_rosa_hcp_cluster`.
fn create_rosa_hcp_cluster_contract() -> ToolContract {
    build_tool_contract(
        ToolName::CreateRosaHcpCluster,
        "Provision a new ROSA cluster with hosted control planes. Account roles, operator \
         roles, an OIDC configuration, and VPC subnets must already exist; see the \
         rosa_hcp_prerequisites_guide prompt.",
        tool_input_schema(
            &json!({
                "cluster_name": schema_for_string("Name of the cluster (lowercase, max 54 characters)"),
                "aws_account_id": schema_for_string("AWS account identifier"),
                "billing_account_id": schema_for_string("AWS billing account identifier"),
                "role_arn": schema_for_string("ARN of the installer account role"),
                "operator_role_prefix": schema_for_string("Prefix of the operator roles"),
                "oidc_config_id": schema_for_string("Identifier of the OIDC configuration"),
                "supporting_role_arn": schema_for_string("ARN of the support account role"),
                "worker_role_arn": schema_for_string("ARN of the worker instance role"),
                "rosa_creator_arn": schema_for_string("ARN of the identity creating the cluster"),
                "subnet_ids": schema_for_string_array("VPC subnet identifiers"),
                "availability_zones": schema_for_string_array(
                    "Availability zones (optional; derived from subnets when omitted)"
                ),
                "region": schema_for_string("AWS region (default: us-east-1)"),
                "multi_arch_enabled": schema_for_boolean(
                    "Enable multi-architecture compute (default: false)"
                )
            }),
            &[
                "cluster_name",
                "aws_account_id",
                "billing_account_id",
                "role_arn",
                "operator_role_prefix",
                "oidc_config_id",
                "supporting_role_arn",
                "worker_role_arn",
                "rosa_creator_arn",
                "subnet_ids",
            ],
        ),
        vec![
            "The backend validates the role and subnet topology; rejections are returned \
             verbatim."
                .to_string(),
            "Creation is asynchronous; poll get_cluster for the state.".to_string(),
        ],
    )
}

/// Builds the tool contract for `setup_htpasswd_identity_provider`.
fn setup_htpasswd_identity_provider_contract() -> ToolContract {
    build_tool_contract(
        ToolName::SetupHtpasswdIdentityProvider,
        "Create an htpasswd identity provider on a cluster. Provide users as \
         'username:password' entries, a single username and password, or a base64 encoded \
         htpasswd file.",
        tool_input_schema(
            &json!({
                "cluster_id": schema_for_string("Unique cluster identifier"),
                "name": schema_for_string("Identity provider name (default: htpasswd)"),
                "mapping_method": schema_for_enum(
                    "User mapping method (default: claim)",
                    &["add", "claim", "generate", "lookup"]
                ),
                "users": schema_for_string_array("Users in 'username:password' form"),
                "username": schema_for_string("Single username"),
                "password": schema_for_string("Password for the single username"),
                "htpasswd_file_content": schema_for_string(
                    "Base64 encoded htpasswd file with pre-hashed passwords"
                ),
                "overwrite_existing": schema_for_boolean(
                    "Replace an identity provider with the same name (default: false)"
                )
            }),
            &["cluster_id"],
        ),
        vec![
            "Passwords need 14+ ASCII characters with upper and lower case letters and a \
             digit or symbol."
                .to_string(),
            "The cluster-admin username and identity provider name are reserved.".to_string(),
        ],
    )
}

// ============================================================================
// SECTION: Schema Helpers
// ============================================================================

/// Builds a tool contract.
fn build_tool_contract(
    name: ToolName,
    description: &str,
    input_schema: Value,
    notes: Vec<String>,
) -> ToolContract {
    ToolContract {
        name,
        description: description.to_string(),
        input_schema,
        notes,
    }
}

/// Builds a standard tool input schema wrapper.
#[must_use]
fn tool_input_schema(properties: &Value, required: &[&str]) -> Value {
    with_schema(object_schema(properties, required))
}

/// Builds a closed object schema.
#[must_use]
fn object_schema(properties: &Value, required: &[&str]) -> Value {
    let required_values: Vec<Value> =
        required.iter().map(|value| Value::String((*value).to_string())).collect();
    json!({
        "type": "object",
        "required": required_values,
        "properties": properties,
        "additionalProperties": false
    })
}

/// Adds a `$schema` header to a top-level JSON schema.
#[must_use]
fn with_schema(schema: Value) -> Value {
    let Value::Object(mut map) = schema else {
        return schema;
    };
    map.insert(
        String::from("$schema"),
        Value::String(String::from("https://json-schema.org/draft/2020-12/schema")),
    );
    Value::Object(map)
}

/// Returns a JSON schema for strings.
#[must_use]
fn schema_for_string(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

/// Returns a JSON schema for a closed set of strings.
#[must_use]
fn schema_for_enum(description: &str, values: &[&str]) -> Value {
    json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}

/// Returns a JSON schema for string arrays.
#[must_use]
fn schema_for_string_array(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": description
    })
}

/// Returns a JSON schema for booleans.
#[must_use]
fn schema_for_boolean(description: &str) -> Value {
    json!({
        "type": "boolean",
        "description": description
    })
}
