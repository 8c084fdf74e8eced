// crates/fleet-mcp/src/classify.rs
// ============================================================================
// Module: Backend Error Classification
// Description: Maps backend failures onto agent-actionable tool results.
// Purpose: Flag expired credentials distinctly from other backend rejections.
// Dependencies: fleet-mcp-backend, fleet-mcp-config
// ============================================================================

//! ## Overview
//! A structured backend error whose code or reason matches an expiry signal
//! (or whose HTTP status is 401) is rendered with an `AUTHENTICATION_FAILED:`
//! prefix and a reauthentication hint, so an agent can refresh its token
//! instead of retrying blindly. Other structured errors keep the backend's
//! code and reason verbatim. Unstructured failures name the operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fleet_mcp_backend::ApiError;
use fleet_mcp_backend::BackendError;
use fleet_mcp_config::DEFAULT_ERROR_LABEL;
use fleet_mcp_config::ExpiryConfig;

use crate::tools::FailureCode;
use crate::tools::ToolResult;

// ============================================================================
// SECTION: Expiry Signals
// ============================================================================

/// HTTP status that always signals an unusable credential.
const UNAUTHORIZED: u16 = 401;

/// Codes and reason markers that indicate credential expiry.
///
/// # Invariants
/// - Entries are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirySignals {
    /// Codes matched exactly, ignoring case.
    codes: Vec<String>,
    /// Reason substrings matched ignoring case.
    reason_markers: Vec<String>,
}

impl ExpirySignals {
    /// Builds signals from configuration.
    #[must_use]
    pub fn from_config(config: &ExpiryConfig) -> Self {
        Self {
            codes: lowercase_all(&config.codes),
            reason_markers: lowercase_all(&config.reason_markers),
        }
    }

    /// Returns true when the error indicates an expired or invalid credential.
    #[must_use]
    pub fn matches(&self, error: &ApiError) -> bool {
        if error.status == Some(UNAUTHORIZED) {
            return true;
        }
        let code = error.code.to_ascii_lowercase();
        if self.codes.iter().any(|candidate| *candidate == code) {
            return true;
        }
        let reason = error.reason.to_ascii_lowercase();
        self.reason_markers.iter().any(|marker| reason.contains(marker.as_str()))
    }
}

impl Default for ExpirySignals {
    fn default() -> Self {
        Self::from_config(&ExpiryConfig::default())
    }
}

/// Lowercases and trims every entry.
fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|value| value.trim().to_ascii_lowercase()).collect()
}

// ============================================================================
// SECTION: Classifier
// ============================================================================

/// Converts backend failures into tool results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassifier {
    /// Backend label used in structured messages (for example `OCM API`).
    label: String,
    /// Expiry signals.
    signals: ExpirySignals,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LABEL, ExpirySignals::default())
    }
}

impl ErrorClassifier {
    /// Creates a classifier.
    #[must_use]
    pub fn new(label: impl Into<String>, signals: ExpirySignals) -> Self {
        Self {
            label: label.into(),
            signals,
        }
    }

    /// Classifies a backend failure for the named operation.
    #[must_use]
    pub fn classify(&self, error: &BackendError, operation: &str) -> ToolResult {
        if let BackendError::Annotated {
            error,
            note,
        } = error
        {
            let mut result = self.classify(error, operation);
            result.text = format!("{} ({note})", result.text);
            return result;
        }
        if let Some(detail) = error.api_detail() {
            return self.classify_structured(detail);
        }
        let message = format!("{operation} failed: {error}");
        match error {
            BackendError::Status {
                status: UNAUTHORIZED,
                ..
            } => ToolResult::failure(
                FailureCode::CredentialExpired,
                format!("AUTHENTICATION_FAILED: {message}. Reauthenticate and retry."),
            ),
            BackendError::Status {
                ..
            } => ToolResult::failure(FailureCode::BackendRejected, message),
            BackendError::Invalid(_) => ToolResult::failure(FailureCode::InvalidArgument, message),
            _ => ToolResult::failure(FailureCode::Internal, message),
        }
    }

    /// Renders structured backend detail.
    fn classify_structured(&self, detail: &ApiError) -> ToolResult {
        let mut text = format!("{} Error [{}]: {}", self.label, detail.code, detail.reason);
        if let Some(operation_id) = &detail.operation_id {
            text.push_str(" (operation id: ");
            text.push_str(operation_id);
            text.push(')');
        }
        if self.signals.matches(detail) {
            return ToolResult::failure(
                FailureCode::CredentialExpired,
                format!("AUTHENTICATION_FAILED: {text}. Reauthenticate and retry."),
            );
        }
        ToolResult::failure(FailureCode::BackendRejected, text)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
