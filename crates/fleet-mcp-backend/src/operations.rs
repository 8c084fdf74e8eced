// crates/fleet-mcp-backend/src/operations.rs
// ============================================================================
// Module: Fleet Operations
// Description: Multi-step business operations over a backend session.
// Purpose: Build request bodies and sequence calls for mutating tools.
// Dependencies: serde_json, crate::htpasswd, crate::session
// ============================================================================

//! ## Overview
//! Read-only tools call [`FleetBackend`] directly. The two mutating tools
//! need request bodies and, for identity providers, a short sequence of
//! checks; those live here so they can be tested against an in-memory
//! backend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::error::BackendError;
use crate::htpasswd::HtpasswdUserInput;
use crate::htpasswd::validate_provider_name;
use crate::session::FleetBackend;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default AWS region for new clusters.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Default identity provider name.
pub const DEFAULT_PROVIDER_NAME: &str = "htpasswd";
/// Default identity provider mapping method.
pub const DEFAULT_MAPPING_METHOD: &str = "claim";

// ============================================================================
// SECTION: Cluster Creation
// ============================================================================

/// Parameters for a hosted-control-plane cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    /// Cluster name.
    pub name: String,
    /// AWS account hosting the cluster.
    pub aws_account_id: String,
    /// AWS account billed for the cluster.
    pub billing_account_id: String,
    /// Installer role ARN.
    pub role_arn: String,
    /// Support role ARN.
    pub support_role_arn: String,
    /// Worker instance role ARN.
    pub worker_role_arn: String,
    /// Operator role prefix.
    pub operator_role_prefix: String,
    /// OIDC configuration identifier.
    pub oidc_config_id: String,
    /// ARN of the creating identity.
    pub creator_arn: String,
    /// VPC subnet identifiers.
    pub subnet_ids: Vec<String>,
    /// Availability zones; empty lets the backend derive them.
    pub availability_zones: Vec<String>,
    /// AWS region.
    pub region: String,
    /// Multi-architecture compute toggle.
    pub multi_arch_enabled: bool,
}

impl ClusterSpec {
    /// Renders the cluster creation body.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "name": self.name,
            "product": { "id": "rosa" },
            "region": { "id": self.region },
            "cloud_provider": { "id": "aws" },
            "hypershift": { "enabled": true },
            "ccs": { "enabled": true },
            "billing_model": "marketplace-aws",
            "multi_arch_enabled": self.multi_arch_enabled,
            "aws": {
                "account_id": self.aws_account_id,
                "billing_account_id": self.billing_account_id,
                "subnet_ids": self.subnet_ids,
                "sts": {
                    "role_arn": self.role_arn,
                    "support_role_arn": self.support_role_arn,
                    "instance_iam_roles": { "worker_role_arn": self.worker_role_arn },
                    "operator_role_prefix": self.operator_role_prefix,
                    "oidc_config": { "id": self.oidc_config_id }
                }
            },
            "properties": { "rosa_creator_arn": self.creator_arn }
        });
        if let Some(map) = body.as_object_mut().filter(|_| !self.availability_zones.is_empty()) {
            map.insert(
                "nodes".to_string(),
                json!({ "availability_zones": self.availability_zones }),
            );
        }
        body
    }
}

// ============================================================================
// SECTION: Htpasswd Identity Provider
// ============================================================================

/// Parameters for htpasswd identity provider setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtpasswdSetup {
    /// Target cluster.
    pub cluster_id: String,
    /// Provider name.
    pub name: String,
    /// User mapping method.
    pub mapping_method: String,
    /// User input forms.
    pub input: HtpasswdUserInput,
    /// Replace a provider with the same name.
    pub overwrite_existing: bool,
}

/// Creates an htpasswd identity provider on a cluster.
///
/// Steps: confirm the cluster is reachable, validate the name, check for an
/// existing provider, resolve and validate users, replace the old provider
/// when asked, then create the new one. Nothing is deleted until every
/// validation has passed.
///
/// # Errors
///
/// Returns [`BackendError::Invalid`] for rejected input and passes backend
/// API errors through unchanged. A failed create after the old provider was
/// deleted is annotated to say so.
pub fn setup_htpasswd_identity_provider(
    backend: &mut dyn FleetBackend,
    setup: &HtpasswdSetup,
) -> Result<Value, BackendError> {
    backend.get_cluster(&setup.cluster_id).map_err(|err| err.context("cluster not accessible"))?;
    validate_provider_name(&setup.name)
        .map_err(|err| BackendError::Invalid(format!("invalid identity provider name: {err}")))?;

    let providers = backend
        .list_identity_providers(&setup.cluster_id)
        .map_err(|err| err.context("failed to list identity providers"))?;
    let existing = find_provider_id(&providers, &setup.name);
    if existing.is_some() && !setup.overwrite_existing {
        return Err(BackendError::Invalid(format!(
            "identity provider with name '{}' already exists",
            setup.name
        )));
    }

    let users = setup
        .input
        .process()
        .map_err(|err| BackendError::Invalid(format!("failed to process user input: {err}")))?;
    users.validate().map_err(|(username, err)| {
        BackendError::Invalid(format!("invalid user credentials for '{username}': {err}"))
    })?;

    let entries = users.hashed_entries().map_err(|(username, err)| {
        BackendError::Invalid(format!("failed to hash password for user '{username}': {err}"))
    })?;
    let items: Vec<Value> = entries
        .into_iter()
        .map(|(username, hash)| json!({ "username": username, "hashed_password": hash }))
        .collect();
    let body = json!({
        "type": "HTPasswdIdentityProvider",
        "name": setup.name,
        "mapping_method": setup.mapping_method,
        "htpasswd": { "users": { "items": items } }
    });

    let Some(provider_id) = existing else {
        return backend.create_identity_provider(&setup.cluster_id, &body);
    };
    backend
        .delete_identity_provider(&setup.cluster_id, &provider_id)
        .map_err(|err| err.context("failed to delete existing identity provider"))?;
    backend.create_identity_provider(&setup.cluster_id, &body).map_err(|err| {
        err.annotate(format!(
            "existing identity provider '{}' was removed but its replacement was not created",
            setup.name
        ))
    })
}

/// Returns the id of the provider with the given name, if listed.
fn find_provider_id(providers: &Value, name: &str) -> Option<String> {
    providers
        .get("items")
        .and_then(Value::as_array)?
        .iter()
        .find(|item| item.get("name").and_then(Value::as_str) == Some(name))
        .and_then(|item| item.get("id").and_then(Value::as_str))
        .map(str::to_string)
}
