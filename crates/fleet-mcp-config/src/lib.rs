// crates/fleet-mcp-config/src/lib.rs
// ============================================================================
// Module: Fleet MCP Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for fleet-mcp.toml semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `fleet-mcp-config` defines the configuration model for the Fleet MCP
//! server: transport selection, backend endpoints, credential expiry signals,
//! and the tool profile. Configuration is loaded once at startup, validated
//! fail-closed, and treated as immutable afterwards.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
