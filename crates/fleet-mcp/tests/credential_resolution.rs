// crates/fleet-mcp/tests/credential_resolution.rs
// ============================================================================
// Module: Credential Resolution Tests
// Description: Source precedence and audit behavior of the resolver.
// Purpose: Pin per-transport credential rules, including the env fallback.
// ============================================================================

//! Credential precedence and audit tests for the resolver.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;

use fleet_mcp::CredentialError;
use fleet_mcp::CredentialHeaders;
use fleet_mcp::CredentialResolver;
use fleet_mcp::CredentialSource;
use fleet_mcp::FailureCode;
use fleet_mcp::McpAuditSink;
use fleet_mcp::RequestContext;
use fleet_mcp::StaticEnv;
use fleet_mcp_backend::CredentialKind;
use fleet_mcp_config::ServerTransport;
use proptest::prelude::*;

use crate::common::RecordingAudit;
use crate::common::env_with_token;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn resolver(env: StaticEnv) -> (CredentialResolver, Arc<RecordingAudit>) {
    let audit = Arc::new(RecordingAudit::default());
    let resolver =
        CredentialResolver::new(Arc::new(env), Arc::clone(&audit) as Arc<dyn McpAuditSink>);
    (resolver, audit)
}

fn http_context(authorization: Option<&str>, offline: Option<&str>) -> RequestContext {
    let mut header_names = Vec::new();
    if authorization.is_some() {
        header_names.push("authorization".to_string());
    }
    if offline.is_some() {
        header_names.push("x-ocm-offline-token".to_string());
    }
    let headers = CredentialHeaders {
        authorization: authorization.map(str::to_string),
        offline_token: offline.map(str::to_string),
        header_names,
    };
    RequestContext::http(ServerTransport::Http, None, headers)
}

// ============================================================================
// SECTION: Stdio
// ============================================================================

#[test]
fn stdio_without_env_is_missing_credential() {
    let (resolver, audit) = resolver(StaticEnv::new());
    let err = resolver.resolve(&RequestContext::stdio()).unwrap_err();
    assert_eq!(err.code(), FailureCode::MissingCredential);
    assert_eq!(err.to_string(), "missing or empty OCM_OFFLINE_TOKEN environment variable");
    let events = audit.credentials.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].failure, Some("MISSING_CREDENTIAL"));
}

#[test]
fn stdio_with_blank_env_is_missing_credential() {
    let (resolver, _) = resolver(env_with_token("   "));
    let err = resolver.resolve(&RequestContext::stdio()).unwrap_err();
    assert!(matches!(err, CredentialError::Missing(_)));
}

#[test]
fn stdio_ignores_headers() {
    let (resolver, _) = resolver(env_with_token("env-off"));
    let mut context = http_context(Some("Bearer abc123"), Some("off-1"));
    context.transport = ServerTransport::Stdio;
    let credential = resolver.resolve(&context).unwrap();
    assert_eq!(credential.value(), "env-off");
    assert_eq!(credential.kind(), CredentialKind::Offline);
}

// ============================================================================
// SECTION: Multi-Connection
// ============================================================================

#[test]
fn bearer_header_yields_access_credential() {
    let (resolver, audit) = resolver(StaticEnv::new());
    let credential = resolver.resolve(&http_context(Some("Bearer abc123"), None)).unwrap();
    assert_eq!(credential.value(), "abc123");
    assert_eq!(credential.kind(), CredentialKind::Access);
    let events = audit.credentials.lock().unwrap();
    assert_eq!(events[0].source, Some(CredentialSource::AuthorizationHeader));
    assert_eq!(events[0].kind, Some("access"));
}

#[test]
fn offline_header_yields_offline_credential() {
    let (resolver, _) = resolver(StaticEnv::new());
    let credential = resolver.resolve(&http_context(None, Some("off-1"))).unwrap();
    assert_eq!(credential.value(), "off-1");
    assert_eq!(credential.kind(), CredentialKind::Offline);
}

#[test]
fn malformed_authorization_falls_through_to_offline_header() {
    let (resolver, audit) = resolver(StaticEnv::new());
    let credential = resolver.resolve(&http_context(Some("Basic abc"), Some("off"))).unwrap();
    assert_eq!(credential.value(), "off");
    assert_eq!(credential.kind(), CredentialKind::Offline);
    let events = audit.credentials.lock().unwrap();
    assert!(events[0].malformed_authorization);
    assert_eq!(events[0].source, Some(CredentialSource::OfflineTokenHeader));
}

#[test]
fn env_fallback_is_used_and_audited() {
    let (resolver, audit) = resolver(env_with_token("operator"));
    let credential = resolver.resolve(&http_context(None, None)).unwrap();
    assert_eq!(credential.value(), "operator");
    let events = audit.credentials.lock().unwrap();
    assert_eq!(events[0].source, Some(CredentialSource::EnvironmentFallback));
    assert_eq!(events[0].transport, ServerTransport::Http);
}

#[test]
fn missing_everything_names_all_sources() {
    let (resolver, _) = resolver(StaticEnv::new());
    let err = resolver.resolve(&http_context(Some("Bearer "), None)).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("http transport requires Authorization or X-OCM-OFFLINE-TOKEN"));
    assert!(text.contains("OCM_OFFLINE_TOKEN environment variable"));
    assert!(text.contains("Authorization header ignored"));
}

#[test]
fn env_fallback_reflects_the_injected_environment() {
    assert!(!resolver(StaticEnv::new()).0.has_env_fallback());
    assert!(!resolver(env_with_token("  ")).0.has_env_fallback());
    assert!(resolver(env_with_token("env-secret")).0.has_env_fallback());
}

#[test]
fn unsupported_transport_label_is_rejected() {
    let err = CredentialError::from("websocket".parse::<ServerTransport>().unwrap_err());
    assert_eq!(err.code(), FailureCode::UnsupportedTransport);
    assert_eq!(err.to_string(), "unsupported transport mode: websocket");
}

#[test]
fn audit_events_never_carry_token_values() {
    let (resolver, audit) = resolver(env_with_token("env-secret"));
    resolver.resolve(&http_context(Some("Bearer header-secret"), Some("off-secret"))).unwrap();
    let line = serde_json::to_string(&audit.credentials.lock().unwrap()[0]).unwrap();
    assert!(!line.contains("secret"));
    assert!(line.contains("x-ocm-offline-token"));
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn well_formed_bearer_always_wins(
        token in "[A-Za-z0-9._-]{1,64}",
        offline in proptest::option::of("[A-Za-z0-9]{1,32}"),
        env_token in proptest::option::of("[A-Za-z0-9]{1,32}"),
    ) {
        let env = env_token.map_or_else(StaticEnv::new, |value| env_with_token(&value));
        let (resolver, _) = resolver(env);
        let header = format!("Bearer {token}");
        let credential = resolver.resolve(&http_context(Some(&header), offline.as_deref())).unwrap();
        prop_assert_eq!(credential.value(), token.as_str());
        prop_assert_eq!(credential.kind(), CredentialKind::Access);
    }

    #[test]
    fn offline_header_beats_environment(
        offline in "[A-Za-z0-9]{1,32}",
        env_token in "[A-Za-z0-9]{1,32}",
    ) {
        let (resolver, _) = resolver(env_with_token(&env_token));
        let credential = resolver.resolve(&http_context(None, Some(&offline))).unwrap();
        prop_assert_eq!(credential.value(), offline.as_str());
        prop_assert_eq!(credential.kind(), CredentialKind::Offline);
    }
}
