// crates/fleet-mcp-backend/tests/common/mod.rs
// ============================================================================
// Module: Backend Test Helpers
// Description: Scripted HTTP stub server and in-memory backend.
// Purpose: Exercise sessions and operations without a live API.
// ============================================================================

//! Shared stub-server helpers for backend tests.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared helpers; not every test binary uses every helper."
)]

use std::thread;
use std::time::Duration;

use fleet_mcp_backend::BackendError;
use fleet_mcp_backend::FleetBackend;
use serde_json::Value;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Stub Server
// ============================================================================

/// Request observed by the stub server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// Scripted response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// Serves scripted responses in order and returns what it saw.
pub fn spawn_stub(responses: Vec<StubResponse>) -> (String, thread::JoinHandle<Vec<RecordedRequest>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for scripted in responses {
            let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(5)) else {
                break;
            };
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let header = |name: &'static str| {
                request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv(name))
                    .map(|header| header.value.as_str().to_string())
            };
            seen.push(RecordedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                authorization: header("Authorization"),
                content_type: header("Content-Type"),
                body,
            });
            let content_type =
                Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
            let response = Response::from_string(scripted.body)
                .with_status_code(scripted.status)
                .with_header(content_type);
            let _ = request.respond(response);
        }
        seen
    });
    (format!("http://{addr}"), handle)
}

// ============================================================================
// SECTION: In-Memory Backend
// ============================================================================

/// Backend that serves canned values and records mutating calls.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    pub cluster: Option<Value>,
    pub providers: Vec<Value>,
    pub created: Vec<(String, Value)>,
    pub deleted: Vec<(String, String)>,
    pub create_error: Option<BackendError>,
    pub closed: usize,
}

impl FleetBackend for MemoryBackend {
    fn current_account(&mut self) -> Result<Value, BackendError> {
        Ok(Value::Null)
    }

    fn list_clusters(&mut self, _state: &str) -> Result<Value, BackendError> {
        Ok(Value::Null)
    }

    fn get_cluster(&mut self, cluster_id: &str) -> Result<Value, BackendError> {
        self.cluster.clone().ok_or_else(|| {
            BackendError::Api(fleet_mcp_backend::ApiError::new(
                "CLUSTERS-MGMT-404",
                format!("Cluster '{cluster_id}' not found"),
            ))
        })
    }

    fn create_cluster(&mut self, body: &Value) -> Result<Value, BackendError> {
        Ok(body.clone())
    }

    fn list_identity_providers(&mut self, _cluster_id: &str) -> Result<Value, BackendError> {
        Ok(serde_json::json!({ "items": self.providers }))
    }

    fn create_identity_provider(
        &mut self,
        cluster_id: &str,
        body: &Value,
    ) -> Result<Value, BackendError> {
        self.created.push((cluster_id.to_string(), body.clone()));
        if let Some(error) = self.create_error.clone() {
            return Err(error);
        }
        let mut created = body.clone();
        if let Some(map) = created.as_object_mut() {
            map.insert("id".to_string(), Value::String("idp-new".to_string()));
        }
        Ok(created)
    }

    fn delete_identity_provider(
        &mut self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<(), BackendError> {
        self.deleted.push((cluster_id.to_string(), provider_id.to_string()));
        Ok(())
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}
