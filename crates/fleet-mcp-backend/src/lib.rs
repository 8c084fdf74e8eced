// crates/fleet-mcp-backend/src/lib.rs
// ============================================================================
// Module: Fleet MCP Backend Library
// Description: Backend sessions and operations for the fleet-management API.
// Purpose: Own every connection to the backend behind a small trait seam.
// Dependencies: base64, reqwest, serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! The backend crate turns a resolved [`Credential`] into a short-lived,
//! closeable session ([`FleetBackend`]) and implements the business
//! operations that run against it. [`SessionFactory`] is the only way to
//! obtain a session; the MCP layer never opens connections itself.
//!
//! Errors keep the backend's structured detail (code, reason, operation id)
//! intact in [`ApiError`] so callers can classify them without string
//! matching.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod credential;
pub mod error;
pub mod htpasswd;
pub mod operations;
pub mod session;
mod token;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use credential::Credential;
pub use credential::CredentialKind;
pub use error::ApiError;
pub use error::BackendError;
pub use error::SessionError;
pub use htpasswd::HtpasswdError;
pub use htpasswd::HtpasswdUserInput;
pub use htpasswd::HtpasswdUsers;
pub use operations::ClusterSpec;
pub use operations::HtpasswdSetup;
pub use operations::setup_htpasswd_identity_provider;
pub use session::FleetBackend;
pub use session::HttpSessionFactory;
pub use session::SessionFactory;
pub use session::SessionScope;
pub use session::SessionSettings;
