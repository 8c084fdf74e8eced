// crates/fleet-mcp/src/lib.rs
// ============================================================================
// Module: Fleet MCP
// Description: MCP server exposing fleet-management tools.
// Purpose: Adapt the fleet backend to MCP tools with per-request credentials.
// Dependencies: fleet-mcp-backend, fleet-mcp-config, fleet-mcp-contract, axum, tokio
// ============================================================================

//! ## Overview
//! Fleet MCP exposes cluster-management operations as MCP tools. Each tool
//! call resolves its own credential from the request context, opens a backend
//! session scoped to that call, and returns a text result. Backend failures
//! are classified so agents can tell an expired credential from any other
//! rejection.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod arguments;
pub mod audit;
pub mod auth;
pub mod classify;
pub mod format;
pub mod server;
pub mod telemetry;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use arguments::ArgumentError;
pub use arguments::ToolArguments;
pub use audit::McpAuditEvent;
pub use audit::McpAuditSink;
pub use audit::McpFileAuditSink;
pub use audit::McpNoopAuditSink;
pub use audit::McpStderrAuditSink;
pub use auth::CredentialAuditEvent;
pub use auth::CredentialError;
pub use auth::CredentialHeaders;
pub use auth::CredentialResolver;
pub use auth::CredentialSource;
pub use auth::EnvSource;
pub use auth::ProcessEnv;
pub use auth::RequestContext;
pub use auth::StaticEnv;
pub use classify::ErrorClassifier;
pub use classify::ExpirySignals;
pub use server::McpServer;
pub use server::McpServerError;
pub use telemetry::McpMethod;
pub use telemetry::McpOutcome;
pub use tools::FailureCode;
pub use tools::ToolError;
pub use tools::ToolRegistry;
pub use tools::ToolResult;
pub use tools::ToolRouter;
pub use tools::ToolShim;
