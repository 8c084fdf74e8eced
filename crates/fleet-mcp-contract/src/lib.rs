// crates/fleet-mcp-contract/src/lib.rs
// ============================================================================
// Module: Fleet MCP Contract Library
// Description: Canonical MCP tool surface for the Fleet MCP server.
// Purpose: Single source of truth for tool names, schemas, profiles, prompts.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! `fleet-mcp-contract` defines the externally visible MCP surface: the
//! canonical [`ToolName`] set, the JSON schema and description of each tool,
//! the named tool profiles used to assemble the registry, and the prompt
//! definitions served alongside the tools. Nothing here performs I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod profiles;
pub mod prompts;
pub mod tooling;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use profiles::ToolProfile;
pub use prompts::PromptContent;
pub use prompts::PromptDefinition;
pub use prompts::PromptMessage;
pub use prompts::PromptResult;
pub use prompts::get_prompt;
pub use prompts::prompt_definitions;
pub use tooling::tool_contracts;
pub use tooling::tool_definitions;
pub use types::ToolContract;
pub use types::ToolDefinition;
pub use types::ToolName;
