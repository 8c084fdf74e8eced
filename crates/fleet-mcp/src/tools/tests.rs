// crates/fleet-mcp/src/tools/tests.rs
// ============================================================================
// Module: MCP Tool Router Unit Tests
// Description: Unit tests for the dispatch shim and tool registry.
// Purpose: Validate call sequencing, session lifecycle, and failure mapping.
// Dependencies: fleet-mcp, fleet-mcp-backend
// ============================================================================

//! ## Overview
//! Drives the shim with a recording session factory so each test can assert
//! how many sessions were opened and closed and which backend calls ran.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use fleet_mcp_backend::ApiError;
use fleet_mcp_backend::BackendError;
use fleet_mcp_backend::Credential;
use fleet_mcp_backend::CredentialKind;
use fleet_mcp_backend::FleetBackend;
use fleet_mcp_backend::SessionError;
use fleet_mcp_backend::SessionFactory;
use fleet_mcp_config::ServerTransport;
use fleet_mcp_contract::ToolName;
use fleet_mcp_contract::ToolProfile;
use serde_json::Value;
use serde_json::json;

use super::*;
use crate::audit::McpNoopAuditSink;
use crate::auth::CredentialHeaders;
use crate::auth::StaticEnv;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Shared observations from the recording factory.
#[derive(Default)]
struct Journal {
    opens: usize,
    closes: usize,
    credentials: Vec<(String, CredentialKind)>,
    calls: Vec<String>,
}

/// Factory producing sessions that answer from a canned result.
struct RecordingFactory {
    journal: Arc<Mutex<Journal>>,
    reply: Result<Value, BackendError>,
    fail_open: bool,
}

impl RecordingFactory {
    fn replying(reply: Result<Value, BackendError>) -> (Arc<Self>, Arc<Mutex<Journal>>) {
        let journal = Arc::new(Mutex::new(Journal::default()));
        let factory = Arc::new(Self {
            journal: Arc::clone(&journal),
            reply,
            fail_open: false,
        });
        (factory, journal)
    }
}

impl SessionFactory for RecordingFactory {
    fn open(&self, credential: &Credential) -> Result<Box<dyn FleetBackend>, SessionError> {
        if self.fail_open {
            return Err(SessionError::Build("invalid url ::: relative URL without a base".into()));
        }
        let mut journal = self.journal.lock().unwrap();
        journal.opens += 1;
        journal.credentials.push((credential.value().to_string(), credential.kind()));
        Ok(Box::new(RecordingSession {
            journal: Arc::clone(&self.journal),
            reply: self.reply.clone(),
            closed: false,
        }))
    }
}

struct RecordingSession {
    journal: Arc<Mutex<Journal>>,
    reply: Result<Value, BackendError>,
    closed: bool,
}

impl RecordingSession {
    fn answer(&mut self, call: String) -> Result<Value, BackendError> {
        self.journal.lock().unwrap().calls.push(call);
        self.reply.clone()
    }
}

impl FleetBackend for RecordingSession {
    fn current_account(&mut self) -> Result<Value, BackendError> {
        self.answer("current_account".to_string())
    }

    fn list_clusters(&mut self, state: &str) -> Result<Value, BackendError> {
        self.answer(format!("list_clusters:{state}"))
    }

    fn get_cluster(&mut self, cluster_id: &str) -> Result<Value, BackendError> {
        self.answer(format!("get_cluster:{cluster_id}"))
    }

    fn create_cluster(&mut self, body: &Value) -> Result<Value, BackendError> {
        self.answer(format!("create_cluster:{body}"))
    }

    fn list_identity_providers(&mut self, cluster_id: &str) -> Result<Value, BackendError> {
        self.answer(format!("list_identity_providers:{cluster_id}"))
    }

    fn create_identity_provider(
        &mut self,
        cluster_id: &str,
        _body: &Value,
    ) -> Result<Value, BackendError> {
        self.answer(format!("create_identity_provider:{cluster_id}"))
    }

    fn delete_identity_provider(
        &mut self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<(), BackendError> {
        self.answer(format!("delete_identity_provider:{cluster_id}:{provider_id}")).map(|_| ())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.journal.lock().unwrap().closes += 1;
        }
    }
}

fn router_with(factory: Arc<RecordingFactory>, env: StaticEnv) -> ToolRouter {
    let resolver = CredentialResolver::new(Arc::new(env), Arc::new(McpNoopAuditSink));
    let shim = ToolShim::new(resolver, factory, ErrorClassifier::default());
    ToolRouter::new(ToolRegistry::from_profile(&ToolProfile::default_profile()), shim)
}

fn offline_env() -> StaticEnv {
    StaticEnv::new().with("OCM_OFFLINE_TOKEN", "env-offline")
}

// ============================================================================
// SECTION: Registry
// ============================================================================

#[test]
fn default_profile_registers_every_tool_in_order() {
    let registry = ToolRegistry::from_profile(&ToolProfile::default_profile());
    let names: Vec<ToolName> = registry.list().iter().map(|tool| tool.name).collect();
    assert_eq!(names, ToolName::all().to_vec());
}

#[test]
fn unknown_tool_is_a_routing_error() {
    let (factory, journal) = RecordingFactory::replying(Ok(json!({})));
    let router = router_with(factory, offline_env());
    let err = router.handle_tool_call(&RequestContext::stdio(), "nope", json!({})).unwrap_err();
    assert!(matches!(err, ToolError::UnknownTool(name) if name == "nope"));
    assert_eq!(journal.lock().unwrap().opens, 0);
}

// ============================================================================
// SECTION: Shim Sequencing
// ============================================================================

#[test]
fn missing_required_argument_opens_no_session() {
    let (factory, journal) = RecordingFactory::replying(Ok(json!({})));
    let router = router_with(factory, offline_env());
    let result =
        router.handle_tool_call(&RequestContext::stdio(), "get_clusters", json!({})).unwrap();
    assert!(result.is_error);
    assert_eq!(result.failure, Some(FailureCode::InvalidArgument));
    assert!(result.text.contains("state"));
    let journal = journal.lock().unwrap();
    assert_eq!(journal.opens, 0);
    assert!(journal.calls.is_empty());
}

#[test]
fn non_object_arguments_are_invalid() {
    let (factory, journal) = RecordingFactory::replying(Ok(json!({})));
    let router = router_with(factory, offline_env());
    let result =
        router.handle_tool_call(&RequestContext::stdio(), "whoami", json!([1, 2])).unwrap();
    assert_eq!(result.failure, Some(FailureCode::InvalidArgument));
    assert_eq!(journal.lock().unwrap().opens, 0);
}

#[test]
fn missing_credential_opens_no_session() {
    let (factory, journal) = RecordingFactory::replying(Ok(json!({})));
    let router = router_with(factory, StaticEnv::new());
    let result = router.handle_tool_call(&RequestContext::stdio(), "whoami", Value::Null).unwrap();
    assert_eq!(result.failure, Some(FailureCode::MissingCredential));
    assert!(result.text.starts_with("authentication failed: "));
    assert_eq!(journal.lock().unwrap().opens, 0);
}

#[test]
fn successful_call_opens_and_closes_once() {
    let reply = json!({"items": [{"id": "c1", "name": "prod", "state": "ready"}], "total": 1});
    let (factory, journal) = RecordingFactory::replying(Ok(reply));
    let router = router_with(factory, offline_env());
    let result = router
        .handle_tool_call(&RequestContext::stdio(), "get_clusters", json!({"state": "ready"}))
        .unwrap();
    assert!(!result.is_error, "{}", result.text);
    assert!(result.text.contains("prod (c1)"));
    let journal = journal.lock().unwrap();
    assert_eq!((journal.opens, journal.closes), (1, 1));
    assert_eq!(journal.calls, vec!["list_clusters:ready".to_string()]);
    assert_eq!(journal.credentials, vec![("env-offline".to_string(), CredentialKind::Offline)]);
}

#[test]
fn backend_failure_is_classified_and_session_closed() {
    let error = BackendError::Api(ApiError::new("CLUSTERS-MGMT-401", "access token expired"));
    let (factory, journal) = RecordingFactory::replying(Err(error));
    let router = router_with(factory, offline_env());
    let result = router
        .handle_tool_call(&RequestContext::stdio(), "get_cluster", json!({"cluster_id": "c1"}))
        .unwrap();
    assert_eq!(result.failure, Some(FailureCode::CredentialExpired));
    assert!(result.text.starts_with("AUTHENTICATION_FAILED:"));
    let journal = journal.lock().unwrap();
    assert_eq!((journal.opens, journal.closes), (1, 1));
}

#[test]
fn session_build_failure_is_reported_verbatim() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let factory = Arc::new(RecordingFactory {
        journal: Arc::clone(&journal),
        reply: Ok(json!({})),
        fail_open: true,
    });
    let router = router_with(factory, offline_env());
    let result = router.handle_tool_call(&RequestContext::stdio(), "whoami", json!({})).unwrap();
    assert_eq!(result.failure, Some(FailureCode::SessionBuildFailed));
    assert_eq!(
        result.text,
        "get account failed: session build failed: invalid url ::: relative URL without a base"
    );
    assert_eq!(journal.lock().unwrap().closes, 0);
}

#[test]
fn bearer_header_reaches_the_factory_as_access() {
    let (factory, journal) = RecordingFactory::replying(Ok(json!({"username": "alice"})));
    let router = router_with(factory, offline_env());
    let headers = CredentialHeaders {
        authorization: Some("Bearer abc123".to_string()),
        offline_token: Some("off-1".to_string()),
        header_names: vec!["authorization".to_string(), "x-ocm-offline-token".to_string()],
    };
    let context = RequestContext::http(ServerTransport::Http, None, headers);
    let result = router.handle_tool_call(&context, "whoami", json!({})).unwrap();
    assert!(result.text.contains("Username: alice"));
    assert_eq!(
        journal.lock().unwrap().credentials,
        vec![("abc123".to_string(), CredentialKind::Access)]
    );
}

fn cluster_arguments() -> Value {
    json!({
        "cluster_name": "demo",
        "aws_account_id": "123456789012",
        "billing_account_id": "123456789012",
        "role_arn": "arn:aws:iam::123456789012:role/Installer",
        "operator_role_prefix": "demo-ops",
        "oidc_config_id": "oidc-1",
        "supporting_role_arn": "arn:aws:iam::123456789012:role/Support",
        "worker_role_arn": "arn:aws:iam::123456789012:role/Worker",
        "rosa_creator_arn": "arn:aws:iam::123456789012:user/admin",
        "subnet_ids": ["subnet-a", "subnet-b"]
    })
}

#[test]
fn cluster_arguments_pass_through_with_defaults() {
    let (factory, journal) = RecordingFactory::replying(Ok(json!({"id": "c9", "name": "demo"})));
    let router = router_with(factory, offline_env());
    let result = router
        .handle_tool_call(&RequestContext::stdio(), "create_rosa_hcp_cluster", cluster_arguments())
        .unwrap();
    assert!(!result.is_error, "{}", result.text);
    assert!(result.text.starts_with("Cluster creation initiated."));
    let journal = journal.lock().unwrap();
    let call = journal.calls.first().unwrap();
    assert!(call.contains("\"us-east-1\""));
    assert!(call.contains("subnet-a"));
}

#[test]
fn mistyped_optional_arguments_use_defaults() {
    let (factory, journal) = RecordingFactory::replying(Ok(json!({"id": "c9", "name": "demo"})));
    let router = router_with(factory, offline_env());
    let mut arguments = cluster_arguments();
    arguments["region"] = json!(5);
    arguments["multi_arch_enabled"] = json!("yes");
    arguments["availability_zones"] = json!("us-east-1a");
    let result = router
        .handle_tool_call(&RequestContext::stdio(), "create_rosa_hcp_cluster", arguments)
        .unwrap();
    assert!(!result.is_error, "{}", result.text);
    let journal = journal.lock().unwrap();
    assert_eq!(journal.opens, 1);
    let call = journal.calls.first().unwrap();
    assert!(call.contains("\"us-east-1\""));
    assert!(!call.contains("us-east-1a"));
}

#[test]
fn unauthorized_status_during_htpasswd_setup_is_credential_expired() {
    let error = BackendError::Status {
        status: 401,
        message: "Unauthorized".to_string(),
    };
    let (factory, journal) = RecordingFactory::replying(Err(error));
    let router = router_with(factory, offline_env());
    let arguments = json!({"cluster_id": "c1", "users": ["alice:Correct-Horse-42"]});
    let result = router
        .handle_tool_call(&RequestContext::stdio(), "setup_htpasswd_identity_provider", arguments)
        .unwrap();
    assert_eq!(result.failure, Some(FailureCode::CredentialExpired));
    assert!(result.text.starts_with("AUTHENTICATION_FAILED:"), "{}", result.text);
    assert!(result.text.contains("cluster not accessible"));
    let journal = journal.lock().unwrap();
    assert_eq!((journal.opens, journal.closes), (1, 1));
    assert_eq!(journal.calls, vec!["get_cluster:c1".to_string()]);
}

#[test]
fn tool_result_renders_mcp_shape() {
    let value = ToolResult::failure(FailureCode::Internal, "boom").to_mcp_value();
    assert_eq!(value, json!({"content": [{"type": "text", "text": "boom"}], "isError": true}));
    let value = ToolResult::success("ok").to_mcp_value();
    assert_eq!(value["isError"], json!(false));
}
