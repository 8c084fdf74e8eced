// crates/fleet-mcp/src/auth.rs
// ============================================================================
// Module: Credential Resolution
// Description: Per-request bearer credential resolution for MCP transports.
// Purpose: Decide which credential a tool call uses, and what kind it is.
// Dependencies: fleet-mcp-backend, fleet-mcp-config, thiserror
// ============================================================================

//! ## Overview
//! Every tool call resolves its own credential from an explicit
//! [`RequestContext`]. Stdio reads the offline token from the process
//! environment on every call. HTTP and SSE read a per-request header
//! snapshot, preferring an `Authorization: Bearer` access token over an
//! `X-OCM-OFFLINE-TOKEN` offline token.
//!
//! Security posture: when neither header is usable on a multi-connection
//! transport, the resolver falls back to the process environment. That
//! fallback lets every caller share the operator's token, so each use is
//! recorded as an `environment_fallback` audit event. Token values are never
//! logged; only header names are.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use fleet_mcp_backend::Credential;
use fleet_mcp_config::ServerTransport;
use fleet_mcp_config::UnsupportedTransport;
use serde::Serialize;
use thiserror::Error;

use crate::audit::McpAuditSink;
use crate::tools::FailureCode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the offline token.
pub const OFFLINE_TOKEN_ENV: &str = "OCM_OFFLINE_TOKEN";
/// Header carrying an offline token on HTTP transports (lowercase form).
pub const OFFLINE_TOKEN_HEADER: &str = "x-ocm-offline-token";
/// Maximum accepted `Authorization` header length.
pub const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;
/// Bearer scheme prefix, compared case-insensitively.
const BEARER_PREFIX: &str = "Bearer ";

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Credential-bearing headers captured from one HTTP request.
///
/// # Invariants
/// - Owned by a single request; never shared or mutated after capture.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialHeaders {
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Raw offline token header value.
    pub offline_token: Option<String>,
    /// Lowercase names of every header on the request, for audit.
    pub header_names: Vec<String>,
}

impl fmt::Debug for CredentialHeaders {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CredentialHeaders")
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("offline_token", &self.offline_token.as_ref().map(|_| "<redacted>"))
            .field("header_names", &self.header_names)
            .finish()
    }
}

/// Per-request metadata passed explicitly through dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Transport that received the request.
    pub transport: ServerTransport,
    /// Peer IP address when known.
    pub peer_ip: Option<IpAddr>,
    /// Header snapshot (empty for stdio).
    pub headers: CredentialHeaders,
    /// JSON-RPC request identifier when known.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Builds a context for stdio requests.
    #[must_use]
    pub fn stdio() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            peer_ip: None,
            headers: CredentialHeaders::default(),
            request_id: None,
        }
    }

    /// Builds a context for HTTP or SSE requests.
    #[must_use]
    pub const fn http(
        transport: ServerTransport,
        peer_ip: Option<IpAddr>,
        headers: CredentialHeaders,
    ) -> Self {
        Self {
            transport,
            peer_ip,
            headers,
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

// ============================================================================
// SECTION: Environment
// ============================================================================

/// Source of environment variables.
pub trait EnvSource: Send + Sync {
    /// Returns the variable value when set.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the live process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed environment map, used for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// Variables by name.
    vars: BTreeMap<String, String>,
}

impl StaticEnv {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with the variable set.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// No usable credential was found.
    #[error("{0}")]
    Missing(String),
    /// A credential header was present but unusable.
    #[error("{0}")]
    Malformed(String),
    /// The transport label is not supported.
    #[error(transparent)]
    UnsupportedTransport(#[from] UnsupportedTransport),
}

impl CredentialError {
    /// Returns the failure taxonomy code.
    #[must_use]
    pub const fn code(&self) -> FailureCode {
        match self {
            Self::Missing(_) => FailureCode::MissingCredential,
            Self::Malformed(_) => FailureCode::MalformedCredentialHeader,
            Self::UnsupportedTransport(_) => FailureCode::UnsupportedTransport,
        }
    }
}

// ============================================================================
// SECTION: Bearer Parsing
// ============================================================================

/// Extracts the token from an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively and must be followed by a single
/// space; surrounding whitespace on the token is trimmed.
///
/// # Errors
///
/// Returns [`CredentialError::Malformed`] describing the defect.
pub fn parse_bearer_token(value: &str) -> Result<String, CredentialError> {
    if value.len() > MAX_AUTH_HEADER_BYTES {
        return Err(CredentialError::Malformed(format!(
            "Authorization header exceeds {MAX_AUTH_HEADER_BYTES} bytes"
        )));
    }
    if value.len() <= BEARER_PREFIX.len() {
        return Err(CredentialError::Malformed("invalid Authorization header format".to_string()));
    }
    let scheme_matches = value
        .get(..BEARER_PREFIX.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(BEARER_PREFIX));
    if !scheme_matches {
        return Err(CredentialError::Malformed(
            "Authorization header must use Bearer scheme".to_string(),
        ));
    }
    let token = value.get(BEARER_PREFIX.len()..).unwrap_or_default().trim();
    if token.is_empty() {
        return Err(CredentialError::Malformed("empty Bearer token".to_string()));
    }
    Ok(token.to_string())
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// `Authorization: Bearer` header.
    AuthorizationHeader,
    /// `X-OCM-OFFLINE-TOKEN` header.
    OfflineTokenHeader,
    /// Process environment on the stdio transport.
    Environment,
    /// Process environment used because no header was usable.
    EnvironmentFallback,
}

impl CredentialSource {
    /// Returns a stable label for the source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationHeader => "authorization_header",
            Self::OfflineTokenHeader => "offline_token_header",
            Self::Environment => "environment",
            Self::EnvironmentFallback => "environment_fallback",
        }
    }
}

/// Credential audit event payload.
///
/// # Invariants
/// - Never carries token values.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// Credential source on success.
    pub source: Option<CredentialSource>,
    /// Credential kind label on success.
    pub kind: Option<&'static str>,
    /// Failure code label on failure.
    pub failure: Option<&'static str>,
    /// True when an `Authorization` header was present but rejected.
    pub malformed_authorization: bool,
    /// Names of headers present on the request.
    pub header_names: Vec<String>,
}

/// Outcome of a resolution attempt, before it is audited.
struct Resolution {
    /// Credential and its source, or the failure.
    result: Result<(Credential, CredentialSource), CredentialError>,
    /// True when an `Authorization` header was rejected.
    malformed_authorization: bool,
}

/// Resolves credentials for tool calls.
#[derive(Clone)]
pub struct CredentialResolver {
    /// Environment lookup.
    env: Arc<dyn EnvSource>,
    /// Audit sink for resolution events.
    audit: Arc<dyn McpAuditSink>,
}

impl CredentialResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(env: Arc<dyn EnvSource>, audit: Arc<dyn McpAuditSink>) -> Self {
        Self {
            env,
            audit,
        }
    }

    /// Resolves the credential for a request and records an audit event.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Missing`] when no source yields a token.
    pub fn resolve(&self, context: &RequestContext) -> Result<Credential, CredentialError> {
        let resolution = match context.transport {
            ServerTransport::Stdio => self.resolve_stdio(),
            ServerTransport::Http | ServerTransport::Sse => self.resolve_headers(context),
        };
        self.record(context, &resolution);
        resolution.result.map(|(credential, _)| credential)
    }

    /// Returns true when the environment offline token is set, so requests
    /// without credential headers would fall back to it.
    #[must_use]
    pub fn has_env_fallback(&self) -> bool {
        self.env_token().is_some()
    }

    /// Reads the offline token from the environment.
    fn env_token(&self) -> Option<String> {
        self.env
            .var(OFFLINE_TOKEN_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Stdio resolution: environment only.
    fn resolve_stdio(&self) -> Resolution {
        let result = self
            .env_token()
            .map(|token| (Credential::offline(token), CredentialSource::Environment))
            .ok_or_else(|| {
                CredentialError::Missing(format!(
                    "missing or empty {OFFLINE_TOKEN_ENV} environment variable"
                ))
            });
        Resolution {
            result,
            malformed_authorization: false,
        }
    }

    /// Multi-connection resolution: headers, then the environment fallback.
    fn resolve_headers(&self, context: &RequestContext) -> Resolution {
        let headers = &context.headers;
        let mut malformed = None;
        if let Some(value) = &headers.authorization {
            match parse_bearer_token(value) {
                Ok(token) => {
                    let credential = Credential::access(token);
                    return Resolution {
                        result: Ok((credential, CredentialSource::AuthorizationHeader)),
                        malformed_authorization: false,
                    };
                }
                Err(err) => malformed = Some(err),
            }
        }
        let malformed_authorization = malformed.is_some();
        let header_token =
            headers.offline_token.as_deref().map(str::trim).filter(|token| !token.is_empty());
        if let Some(token) = header_token {
            return Resolution {
                result: Ok((Credential::offline(token), CredentialSource::OfflineTokenHeader)),
                malformed_authorization,
            };
        }
        if let Some(token) = self.env_token() {
            return Resolution {
                result: Ok((Credential::offline(token), CredentialSource::EnvironmentFallback)),
                malformed_authorization,
            };
        }
        let mut detail = format!(
            "{} transport requires Authorization or X-OCM-OFFLINE-TOKEN header or \
             {OFFLINE_TOKEN_ENV} environment variable",
            context.transport
        );
        if let Some(err) = malformed {
            detail.push_str(&format!(" (Authorization header ignored: {err})"));
        }
        Resolution {
            result: Err(CredentialError::Missing(detail)),
            malformed_authorization,
        }
    }

    /// Emits the credential audit event.
    fn record(&self, context: &RequestContext, resolution: &Resolution) {
        let (source, kind, failure) = match &resolution.result {
            Ok((credential, source)) => (Some(*source), Some(credential.kind().as_str()), None),
            Err(err) => (None, None, Some(err.code().as_str())),
        };
        let event = CredentialAuditEvent {
            event: "credential_resolution",
            timestamp_ms: now_millis(),
            request_id: context.request_id.clone(),
            transport: context.transport,
            source,
            kind,
            failure,
            malformed_authorization: resolution.malformed_authorization,
            header_names: context.headers.header_names.clone(),
        };
        self.audit.record_credential(&event);
    }
}

/// Returns the current time in milliseconds since the epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
