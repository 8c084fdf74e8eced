// crates/fleet-mcp/tests/common/mod.rs
// ============================================================================
// Module: Fleet MCP Test Helpers
// Description: Recording audit sink, counting session factory, server setup.
// Purpose: Observe credential flow and session lifecycle without a live API.
// ============================================================================

//! Shared fixtures for fleet-mcp integration tests.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared helpers; not every test binary uses every helper."
)]

use std::sync::Arc;
use std::sync::Mutex;

use fleet_mcp::CredentialAuditEvent;
use fleet_mcp::McpAuditEvent;
use fleet_mcp::McpAuditSink;
use fleet_mcp::McpServer;
use fleet_mcp::StaticEnv;
use fleet_mcp_backend::BackendError;
use fleet_mcp_backend::Credential;
use fleet_mcp_backend::CredentialKind;
use fleet_mcp_backend::FleetBackend;
use fleet_mcp_backend::SessionError;
use fleet_mcp_backend::SessionFactory;
use fleet_mcp_config::FleetMcpConfig;
use serde_json::Value;

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAudit {
    pub requests: Mutex<Vec<McpAuditEvent>>,
    pub credentials: Mutex<Vec<CredentialAuditEvent>>,
}

impl McpAuditSink for RecordingAudit {
    fn record(&self, event: &McpAuditEvent) {
        self.requests.lock().unwrap().push(event.clone());
    }

    fn record_credential(&self, event: &CredentialAuditEvent) {
        self.credentials.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Session Factory
// ============================================================================

/// Lifecycle counters shared by the factory and its sessions.
#[derive(Default)]
pub struct Counters {
    pub opens: usize,
    pub closes: usize,
    pub credentials: Vec<(String, CredentialKind)>,
    pub calls: Vec<String>,
}

/// Factory whose sessions answer every call with one scripted result.
pub struct CountingFactory {
    pub counters: Arc<Mutex<Counters>>,
    reply: Result<Value, BackendError>,
}

impl CountingFactory {
    pub fn new(reply: Result<Value, BackendError>) -> Arc<Self> {
        Arc::new(Self {
            counters: Arc::new(Mutex::new(Counters::default())),
            reply,
        })
    }

    pub fn opens(&self) -> usize {
        self.counters.lock().unwrap().opens
    }

    pub fn closes(&self) -> usize {
        self.counters.lock().unwrap().closes
    }

    pub fn credentials(&self) -> Vec<(String, CredentialKind)> {
        self.counters.lock().unwrap().credentials.clone()
    }
}

impl SessionFactory for CountingFactory {
    fn open(&self, credential: &Credential) -> Result<Box<dyn FleetBackend>, SessionError> {
        let mut counters = self.counters.lock().unwrap();
        counters.opens += 1;
        counters.credentials.push((credential.value().to_string(), credential.kind()));
        Ok(Box::new(CountingSession {
            counters: Arc::clone(&self.counters),
            reply: self.reply.clone(),
            closed: false,
        }))
    }
}

struct CountingSession {
    counters: Arc<Mutex<Counters>>,
    reply: Result<Value, BackendError>,
    closed: bool,
}

impl CountingSession {
    fn answer(&self, call: &str) -> Result<Value, BackendError> {
        self.counters.lock().unwrap().calls.push(call.to_string());
        self.reply.clone()
    }
}

impl FleetBackend for CountingSession {
    fn current_account(&mut self) -> Result<Value, BackendError> {
        self.answer("current_account")
    }

    fn list_clusters(&mut self, _state: &str) -> Result<Value, BackendError> {
        self.answer("list_clusters")
    }

    fn get_cluster(&mut self, _cluster_id: &str) -> Result<Value, BackendError> {
        self.answer("get_cluster")
    }

    fn create_cluster(&mut self, _body: &Value) -> Result<Value, BackendError> {
        self.answer("create_cluster")
    }

    fn list_identity_providers(&mut self, _cluster_id: &str) -> Result<Value, BackendError> {
        self.answer("list_identity_providers")
    }

    fn create_identity_provider(
        &mut self,
        _cluster_id: &str,
        _body: &Value,
    ) -> Result<Value, BackendError> {
        self.answer("create_identity_provider")
    }

    fn delete_identity_provider(
        &mut self,
        _cluster_id: &str,
        _provider_id: &str,
    ) -> Result<(), BackendError> {
        self.answer("delete_identity_provider").map(|_| ())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.lock().unwrap().closes += 1;
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Test fixture bundling a server with its observers.
pub struct Harness {
    pub server: McpServer,
    pub factory: Arc<CountingFactory>,
    pub audit: Arc<RecordingAudit>,
}

/// Builds a server over the counting factory.
pub fn harness(
    config: FleetMcpConfig,
    env: StaticEnv,
    reply: Result<Value, BackendError>,
) -> Harness {
    let factory = CountingFactory::new(reply);
    let audit = Arc::new(RecordingAudit::default());
    let server = McpServer::with_components(
        config,
        Arc::clone(&factory) as Arc<dyn SessionFactory>,
        Arc::new(env),
        Arc::clone(&audit) as Arc<dyn McpAuditSink>,
    )
    .expect("server builds");
    Harness {
        server,
        factory,
        audit,
    }
}

/// Environment carrying an offline token.
pub fn env_with_token(token: &str) -> StaticEnv {
    StaticEnv::new().with("OCM_OFFLINE_TOKEN", token)
}

/// Encodes a JSON-RPC request.
pub fn rpc(id: u64, method: &str, params: &Value) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    }))
    .unwrap()
}

/// Decodes a response payload.
pub fn decode(payload: &[u8]) -> Value {
    serde_json::from_slice(payload).unwrap()
}
