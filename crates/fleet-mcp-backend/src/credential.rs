// crates/fleet-mcp-backend/src/credential.rs
// ============================================================================
// Module: Backend Credentials
// Description: Resolved bearer credential and its kind.
// Purpose: Carry authentication material for exactly one tool invocation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A [`Credential`] is immutable once resolved and lives only for the
//! duration of one request. Its `Debug` output never includes the token.

use std::fmt;

/// Kind of bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// Short-lived access token used directly as a bearer.
    Access,
    /// Long-lived refresh token exchanged by the session for access tokens.
    Offline,
}

impl CredentialKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Offline => "offline",
        }
    }
}

/// Resolved bearer credential.
///
/// # Invariants
/// - `value` is non-empty and already trimmed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Token value.
    value: String,
    /// Token kind.
    kind: CredentialKind,
}

impl Credential {
    /// Builds an access credential.
    #[must_use]
    pub fn access(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: CredentialKind::Access,
        }
    }

    /// Builds an offline credential.
    #[must_use]
    pub fn offline(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: CredentialKind::Offline,
        }
    }

    /// Returns the token value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the token kind.
    #[must_use]
    pub const fn kind(&self) -> CredentialKind {
        self.kind
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("kind", &self.kind)
            .finish()
    }
}
