// crates/fleet-mcp/src/tools.rs
// ============================================================================
// Module: MCP Tool Routing
// Description: Tool registry, dispatch shim, and tool handlers.
// Purpose: Run each tool call through one validate/authenticate/call sequence.
// Dependencies: fleet-mcp-backend, fleet-mcp-contract, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The [`ToolRegistry`] is built once from a named profile and never changes.
//! Every handler funnels through [`ToolShim::invoke`], which validates the
//! arguments, resolves a credential, opens a session scoped to the call, runs
//! the backend operation, closes the session, and formats or classifies the
//! outcome. Business and backend failures always come back as a
//! [`ToolResult`] with `is_error` set; only protocol faults surface as
//! [`ToolError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use fleet_mcp_backend::BackendError;
use fleet_mcp_backend::ClusterSpec;
use fleet_mcp_backend::FleetBackend;
use fleet_mcp_backend::HtpasswdSetup;
use fleet_mcp_backend::HtpasswdUserInput;
use fleet_mcp_backend::SessionFactory;
use fleet_mcp_backend::SessionScope;
use fleet_mcp_backend::operations::DEFAULT_MAPPING_METHOD;
use fleet_mcp_backend::operations::DEFAULT_PROVIDER_NAME;
use fleet_mcp_backend::operations::DEFAULT_REGION;
use fleet_mcp_backend::setup_htpasswd_identity_provider;
use fleet_mcp_contract::ToolDefinition;
use fleet_mcp_contract::ToolName;
use fleet_mcp_contract::ToolProfile;
use fleet_mcp_contract::tooling::tool_contract;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::arguments::ArgumentError;
use crate::arguments::ToolArguments;
use crate::auth::CredentialResolver;
use crate::auth::RequestContext;
use crate::classify::ErrorClassifier;
use crate::format::format_account;
use crate::format::format_cluster;
use crate::format::format_cluster_created;
use crate::format::format_clusters;
use crate::format::format_identity_provider;

// ============================================================================
// SECTION: Failure Taxonomy
// ============================================================================

/// Stable failure codes carried by failed tool results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCode {
    /// No credential could be resolved.
    MissingCredential,
    /// A credential header was present but unusable.
    MalformedCredentialHeader,
    /// Transport label not recognized.
    UnsupportedTransport,
    /// Backend session construction failed.
    SessionBuildFailed,
    /// Tool arguments failed validation.
    InvalidArgument,
    /// Backend rejected the request.
    BackendRejected,
    /// Backend reported an expired or invalid credential.
    CredentialExpired,
    /// Any other failure.
    Internal,
}

impl FailureCode {
    /// Returns the stable label for the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::MalformedCredentialHeader => "MALFORMED_CREDENTIAL_HEADER",
            Self::UnsupportedTransport => "UNSUPPORTED_TRANSPORT",
            Self::SessionBuildFailed => "SESSION_BUILD_FAILED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::BackendRejected => "BACKEND_REJECTED",
            Self::CredentialExpired => "CREDENTIAL_EXPIRED",
            Self::Internal => "INTERNAL",
        }
    }
}

// ============================================================================
// SECTION: Tool Result
// ============================================================================

/// Outcome of a tool call as seen by the agent.
///
/// # Invariants
/// - `failure` is `Some` exactly when `is_error` is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Text content returned to the agent.
    pub text: String,
    /// True when the call failed.
    pub is_error: bool,
    /// Failure code when the call failed.
    pub failure: Option<FailureCode>,
}

impl ToolResult {
    /// Builds a successful result.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
            failure: None,
        }
    }

    /// Builds a failed result.
    #[must_use]
    pub fn failure(code: FailureCode, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
            failure: Some(code),
        }
    }

    /// Renders the MCP `tools/call` result payload.
    #[must_use]
    pub fn to_mcp_value(&self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error,
        })
    }
}

// ============================================================================
// SECTION: Dispatch Shim
// ============================================================================

/// Shared per-call sequence for every tool handler.
#[derive(Clone)]
pub struct ToolShim {
    /// Credential resolver.
    resolver: CredentialResolver,
    /// Backend session factory.
    sessions: Arc<dyn SessionFactory>,
    /// Backend error classifier.
    classifier: ErrorClassifier,
}

impl ToolShim {
    /// Creates a shim.
    #[must_use]
    pub fn new(
        resolver: CredentialResolver,
        sessions: Arc<dyn SessionFactory>,
        classifier: ErrorClassifier,
    ) -> Self {
        Self {
            resolver,
            sessions,
            classifier,
        }
    }

    /// Runs one tool invocation.
    ///
    /// `parsed` carries the already-validated arguments; a validation error
    /// short-circuits before any credential or session work. The session is
    /// closed before the outcome is formatted, and again by the scope guard
    /// if `call` unwinds.
    pub fn invoke<T>(
        &self,
        context: &RequestContext,
        operation: &str,
        parsed: Result<T, ArgumentError>,
        call: impl FnOnce(&mut dyn FleetBackend, &T) -> Result<Value, BackendError>,
        format: fn(&Value) -> String,
    ) -> ToolResult {
        let input = match parsed {
            Ok(input) => input,
            Err(err) => return ToolResult::failure(FailureCode::InvalidArgument, err.to_string()),
        };
        let credential = match self.resolver.resolve(context) {
            Ok(credential) => credential,
            Err(err) => {
                return ToolResult::failure(err.code(), format!("authentication failed: {err}"));
            }
        };
        let mut scope = match SessionScope::open(self.sessions.as_ref(), &credential) {
            Ok(scope) => scope,
            Err(err) => {
                return ToolResult::failure(
                    FailureCode::SessionBuildFailed,
                    format!("{operation} failed: {err}"),
                );
            }
        };
        let outcome = scope.backend().and_then(|backend| call(backend, &input));
        scope.close();
        match outcome {
            Ok(value) => ToolResult::success(format(&value)),
            Err(err) => self.classifier.classify(&err, operation),
        }
    }
}

// ============================================================================
// SECTION: Tool Registry
// ============================================================================

/// Handler signature shared by every tool.
pub type ToolHandler = fn(&ToolShim, &RequestContext, &ToolArguments) -> ToolResult;

/// Registered tool.
#[derive(Clone)]
pub struct ToolSpec {
    /// Tool name.
    pub name: ToolName,
    /// Listing definition.
    pub definition: ToolDefinition,
    /// Handler function.
    pub handler: ToolHandler,
}

/// Immutable tool registry.
///
/// # Invariants
/// - Tool names are unique and ordered canonically.
#[derive(Clone)]
pub struct ToolRegistry {
    /// Registered tools.
    tools: Vec<ToolSpec>,
}

impl ToolRegistry {
    /// Builds the registry from a profile.
    #[must_use]
    pub fn from_profile(profile: &ToolProfile) -> Self {
        let tools = ToolName::all()
            .iter()
            .copied()
            .filter(|name| profile.contains(*name))
            .map(|name| ToolSpec {
                name,
                definition: tool_contract(name).definition(),
                handler: handler_for(name),
            })
            .collect();
        Self {
            tools,
        }
    }

    /// Lists registered tool definitions.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition.clone()).collect()
    }

    /// Returns a registered tool.
    #[must_use]
    pub fn get(&self, name: ToolName) -> Option<&ToolSpec> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Dispatches a tool call; `None` when the tool is not registered.
    #[must_use]
    pub fn dispatch(
        &self,
        name: ToolName,
        shim: &ToolShim,
        context: &RequestContext,
        arguments: Value,
    ) -> Option<ToolResult> {
        let spec = self.get(name)?;
        let result = match ToolArguments::from_value(arguments) {
            Ok(arguments) => (spec.handler)(shim, context, &arguments),
            Err(err) => ToolResult::failure(FailureCode::InvalidArgument, err.to_string()),
        };
        Some(result)
    }
}

/// Returns the handler for a tool.
fn handler_for(name: ToolName) -> ToolHandler {
    match name {
        ToolName::Whoami => handle_whoami,
        ToolName::GetClusters => handle_get_clusters,
        ToolName::GetCluster => handle_get_cluster,
        ToolName::CreateRosaHcpCluster => handle_create_rosa_hcp_cluster,
        ToolName::SetupHtpasswdIdentityProvider => handle_setup_htpasswd_identity_provider,
    }
}

// ============================================================================
// SECTION: Tool Router
// ============================================================================

/// Shared router state.
struct RouterInner {
    /// Tool registry.
    registry: ToolRegistry,
    /// Dispatch shim.
    shim: ToolShim,
}

/// Tool router for MCP requests.
#[derive(Clone)]
pub struct ToolRouter {
    /// Immutable router state.
    inner: Arc<RouterInner>,
}

impl ToolRouter {
    /// Creates a new tool router.
    #[must_use]
    pub fn new(registry: ToolRegistry, shim: ToolShim) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                registry,
                shim,
            }),
        }
    }

    /// Lists the MCP tools supported by this server.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.inner.registry.list()
    }

    /// Handles a tool call by name with JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when the name is not registered.
    pub fn handle_tool_call(
        &self,
        context: &RequestContext,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult, ToolError> {
        ToolName::parse(name)
            .and_then(|tool| {
                self.inner.registry.dispatch(tool, &self.inner.shim, context, arguments)
            })
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }
}

// ============================================================================
// SECTION: Tool Handlers
// ============================================================================

/// Handles `whoami`.
fn handle_whoami(shim: &ToolShim, context: &RequestContext, _: &ToolArguments) -> ToolResult {
    shim.invoke(
        context,
        "get account",
        Ok(()),
        |backend, _| backend.current_account(),
        format_account,
    )
}

/// Handles `get_clusters`.
fn handle_get_clusters(
    shim: &ToolShim,
    context: &RequestContext,
    arguments: &ToolArguments,
) -> ToolResult {
    shim.invoke(
        context,
        "get clusters",
        arguments.require_string("state"),
        |backend, state| backend.list_clusters(state),
        format_clusters,
    )
}

/// Handles `get_cluster`.
fn handle_get_cluster(
    shim: &ToolShim,
    context: &RequestContext,
    arguments: &ToolArguments,
) -> ToolResult {
    shim.invoke(
        context,
        "get cluster",
        arguments.require_string("cluster_id"),
        |backend, cluster_id| backend.get_cluster(cluster_id),
        format_cluster,
    )
}

/// Handles `create_rosa_hcp_cluster`.
fn handle_create_rosa_hcp_cluster(
    shim: &ToolShim,
    context: &RequestContext,
    arguments: &ToolArguments,
) -> ToolResult {
    shim.invoke(
        context,
        "create cluster",
        parse_cluster_spec(arguments),
        |backend, spec| backend.create_cluster(&spec.to_body()),
        format_cluster_created,
    )
}

/// Handles `setup_htpasswd_identity_provider`.
fn handle_setup_htpasswd_identity_provider(
    shim: &ToolShim,
    context: &RequestContext,
    arguments: &ToolArguments,
) -> ToolResult {
    shim.invoke(
        context,
        "setup htpasswd identity provider",
        parse_htpasswd_setup(arguments),
        |backend, setup| setup_htpasswd_identity_provider(backend, setup),
        format_identity_provider,
    )
}

/// Reads cluster creation arguments.
fn parse_cluster_spec(arguments: &ToolArguments) -> Result<ClusterSpec, ArgumentError> {
    Ok(ClusterSpec {
        name: arguments.require_string("cluster_name")?,
        aws_account_id: arguments.require_string("aws_account_id")?,
        billing_account_id: arguments.require_string("billing_account_id")?,
        role_arn: arguments.require_string("role_arn")?,
        operator_role_prefix: arguments.require_string("operator_role_prefix")?,
        oidc_config_id: arguments.require_string("oidc_config_id")?,
        support_role_arn: arguments.require_string("supporting_role_arn")?,
        worker_role_arn: arguments.require_string("worker_role_arn")?,
        creator_arn: arguments.require_string("rosa_creator_arn")?,
        subnet_ids: arguments.require_string_array("subnet_ids")?,
        availability_zones: arguments.get_string_array("availability_zones"),
        region: arguments.get_string("region", DEFAULT_REGION),
        multi_arch_enabled: arguments.get_bool("multi_arch_enabled", false),
    })
}

/// Reads htpasswd setup arguments.
fn parse_htpasswd_setup(arguments: &ToolArguments) -> Result<HtpasswdSetup, ArgumentError> {
    Ok(HtpasswdSetup {
        cluster_id: arguments.require_string("cluster_id")?,
        name: arguments.get_string("name", DEFAULT_PROVIDER_NAME),
        mapping_method: arguments.get_string("mapping_method", DEFAULT_MAPPING_METHOD),
        input: HtpasswdUserInput {
            users: arguments.get_string_array("users"),
            username: arguments.optional_string("username"),
            password: arguments.optional_string("password"),
            file_content: arguments.optional_string("htpasswd_file_content"),
        },
        overwrite_existing: arguments.get_bool("overwrite_existing", false),
    })
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Hosting-layer tool routing errors, reported as JSON-RPC errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Tool call parameters malformed.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// Tool payload serialization failed.
    #[error("serialization failure")]
    Serialization,
}

#[cfg(test)]
mod tests;
