// crates/fleet-mcp-backend/src/error.rs
// ============================================================================
// Module: Backend Errors
// Description: Error model for backend sessions and API calls.
// Purpose: Preserve structured backend detail for downstream classification.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`ApiError`] mirrors the fleet-management API error body (`code`,
//! `reason`, `operation_id`). OAuth token endpoint errors (`error`,
//! `error_description`) are normalized into the same shape so an expired
//! offline token is classified like any other authentication rejection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: API Error
// ============================================================================

/// Structured backend rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status when the error came from a response.
    pub status: Option<u16>,
    /// Backend error code (for example `CLUSTERS-MGMT-404`).
    pub code: String,
    /// Backend-provided reason, verbatim.
    pub reason: String,
    /// Backend operation identifier for support correlation.
    pub operation_id: Option<String>,
}

impl ApiError {
    /// Builds an API error without HTTP metadata.
    #[must_use]
    pub fn new(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: None,
            code: code.into(),
            reason: reason.into(),
            operation_id: None,
        }
    }

    /// Returns a copy with the operation identifier set.
    #[must_use]
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Returns a copy with the HTTP status set.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Parses a backend error body, returning `None` when it is unstructured.
    #[must_use]
    pub fn from_body(status: u16, body: &[u8]) -> Option<Self> {
        let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
        let (code, reason) = match (parsed.code, parsed.reason, parsed.error) {
            (Some(code), reason, _) if !code.trim().is_empty() => {
                (code, reason.unwrap_or_default())
            }
            (_, _, Some(error)) if !error.trim().is_empty() => {
                (error, parsed.error_description.unwrap_or_default())
            }
            _ => return None,
        };
        Some(Self {
            status: Some(status),
            code,
            reason,
            operation_id: parsed.operation_id.filter(|id| !id.trim().is_empty()),
        })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[{}]: {}", self.code, self.reason)
    }
}

/// Union of the API error body and the OAuth error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    /// API error code.
    #[serde(default)]
    code: Option<String>,
    /// API error reason.
    #[serde(default)]
    reason: Option<String>,
    /// API operation identifier.
    #[serde(default)]
    operation_id: Option<String>,
    /// OAuth error code.
    #[serde(default)]
    error: Option<String>,
    /// OAuth error description.
    #[serde(default)]
    error_description: Option<String>,
}

// ============================================================================
// SECTION: Backend Errors
// ============================================================================

/// Errors raised by backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Structured backend rejection.
    #[error("{0}")]
    Api(ApiError),
    /// Non-success response without a structured body.
    #[error("backend returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response text.
        message: String,
    },
    /// Network or protocol failure.
    #[error("backend request failed: {0}")]
    Transport(String),
    /// Response body could not be decoded.
    #[error("backend response invalid: {0}")]
    Decode(String),
    /// Input rejected before reaching the backend.
    #[error("{0}")]
    Invalid(String),
    /// Session misuse or other internal fault.
    #[error("{0}")]
    Internal(String),
    /// Failure carrying a note about side effects already applied.
    #[error("{error} ({note})")]
    Annotated {
        /// Underlying failure.
        error: Box<BackendError>,
        /// Note for the caller.
        note: String,
    },
}

impl BackendError {
    /// Returns structured backend detail when present.
    #[must_use]
    pub const fn api_detail(&self) -> Option<&ApiError> {
        match self {
            Self::Api(detail) => Some(detail),
            _ => None,
        }
    }

    /// Prefixes unstructured errors with context, leaving API detail and the
    /// HTTP status intact.
    #[must_use]
    pub fn context(self, context: &str) -> Self {
        match self {
            Self::Api(_) | Self::Annotated {
                ..
            } => self,
            Self::Status {
                status,
                message,
            } => Self::Status {
                status,
                message: format!("{context}: {message}"),
            },
            Self::Invalid(message) => Self::Invalid(format!("{context}: {message}")),
            other => Self::Internal(format!("{context}: {other}")),
        }
    }
}

impl BackendError {
    /// Attaches a note that survives classification.
    #[must_use]
    pub fn annotate(self, note: impl Into<String>) -> Self {
        Self::Annotated {
            error: Box::new(self),
            note: note.into(),
        }
    }
}

impl From<ApiError> for BackendError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

/// Errors raised while building a backend session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Client construction failed; carries the underlying error text.
    #[error("session build failed: {0}")]
    Build(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
