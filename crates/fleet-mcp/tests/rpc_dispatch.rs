// crates/fleet-mcp/tests/rpc_dispatch.rs
// ============================================================================
// Module: JSON-RPC Dispatch Tests
// Description: End-to-end message handling through the server pipeline.
// Purpose: Validate protocol methods, tool results, and audit records.
// ============================================================================

//! JSON-RPC dispatch tests through the in-memory pipeline.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use fleet_mcp::McpMethod;
use fleet_mcp::McpOutcome;
use fleet_mcp::RequestContext;
use fleet_mcp::StaticEnv;
use fleet_mcp_backend::ApiError;
use fleet_mcp_backend::BackendError;
use fleet_mcp_config::FleetMcpConfig;
use fleet_mcp_contract::ToolName;
use serde_json::Value;
use serde_json::json;

use crate::common::Harness;
use crate::common::decode;
use crate::common::env_with_token;
use crate::common::harness;
use crate::common::rpc;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn stdio_harness(env: StaticEnv, reply: Result<Value, BackendError>) -> Harness {
    harness(FleetMcpConfig::default(), env, reply)
}

fn call(harness: &Harness, payload: &[u8]) -> Value {
    let response = harness.server.handle_payload(&RequestContext::stdio(), payload).unwrap();
    decode(&response)
}

fn tool_call(harness: &Harness, name: &str, arguments: Value) -> Value {
    call(harness, &rpc(7, "tools/call", &json!({ "name": name, "arguments": arguments })))
}

// ============================================================================
// SECTION: Protocol Methods
// ============================================================================

#[test]
fn initialize_reports_server_info_and_capabilities() {
    let harness = stdio_harness(StaticEnv::new(), Ok(json!({})));
    let response = call(&harness, &rpc(1, "initialize", &json!({"protocolVersion": "2025-03-26"})));
    assert_eq!(response["id"], json!(1));
    let result = &response["result"];
    assert_eq!(result["protocolVersion"], "2025-03-26");
    assert_eq!(result["serverInfo"]["name"], "fleet-mcp");
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["prompts"].is_object());
}

#[test]
fn initialize_defaults_protocol_version() {
    let harness = stdio_harness(StaticEnv::new(), Ok(json!({})));
    let response = call(&harness, &rpc(1, "initialize", &json!({})));
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
}

#[test]
fn ping_returns_empty_result() {
    let harness = stdio_harness(StaticEnv::new(), Ok(json!({})));
    assert_eq!(call(&harness, &rpc(2, "ping", &Value::Null))["result"], json!({}));
}

#[test]
fn tools_list_returns_every_tool_with_schema() {
    let harness = stdio_harness(StaticEnv::new(), Ok(json!({})));
    let response = call(&harness, &rpc(3, "tools/list", &json!({})));
    let tools = response["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|tool| tool["name"].as_str().unwrap()).collect();
    let expected: Vec<&str> = ToolName::all().iter().map(|name| name.as_str()).collect();
    assert_eq!(names, expected);
    assert!(tools.iter().all(|tool| tool["inputSchema"]["type"] == "object"));
}

#[test]
fn prompts_are_listed_and_rendered() {
    let harness = stdio_harness(StaticEnv::new(), Ok(json!({})));
    let listed = call(&harness, &rpc(4, "prompts/list", &json!({})));
    assert_eq!(listed["result"]["prompts"][0]["name"], "rosa_hcp_prerequisites_guide");
    let prompt = call(
        &harness,
        &rpc(5, "prompts/get", &json!({"name": "rosa_hcp_prerequisites_guide"})),
    );
    let messages = prompt["result"]["messages"].as_array().unwrap();
    assert_eq!(messages[0]["content"]["type"], "text");
    assert_eq!(messages[1]["content"]["type"], "resource_link");
    let missing = call(&harness, &rpc(6, "prompts/get", &json!({"name": "nope"})));
    assert_eq!(missing["error"]["code"], -32602);
}

#[test]
fn notifications_get_no_response() {
    let harness = stdio_harness(StaticEnv::new(), Ok(json!({})));
    let payload = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
    assert!(harness.server.handle_payload(&RequestContext::stdio(), payload).is_none());
    let events = harness.audit.requests.lock().unwrap();
    assert_eq!(events[0].method, McpMethod::Notification);
}

#[test]
fn protocol_faults_are_json_rpc_errors() {
    let harness = stdio_harness(StaticEnv::new(), Ok(json!({})));
    assert_eq!(call(&harness, b"{not json")["error"]["code"], -32600);
    assert_eq!(call(&harness, &rpc(8, "resources/list", &json!({})))["error"]["code"], -32601);
    let wrong_version = br#"{"jsonrpc":"1.0","id":9,"method":"ping"}"#;
    assert_eq!(call(&harness, wrong_version)["error"]["code"], -32600);
    let bad_params = call(&harness, &rpc(10, "tools/call", &json!({"arguments": {}})));
    assert_eq!(bad_params["error"]["code"], -32602);
}

#[test]
fn unknown_tool_is_invalid_params_and_reaches_no_handler() {
    let harness = stdio_harness(env_with_token("off"), Ok(json!({})));
    let response = tool_call(&harness, "delete_everything", json!({}));
    assert_eq!(response["error"]["code"], -32602);
    assert!(response["error"]["message"].as_str().unwrap().contains("delete_everything"));
    assert_eq!(harness.factory.opens(), 0);
}

#[test]
fn oversize_payload_is_rejected() {
    let mut config = FleetMcpConfig::default();
    config.server.max_body_bytes = 32;
    let harness = harness(config, StaticEnv::new(), Ok(json!({})));
    let response = call(&harness, &rpc(11, "tools/list", &json!({"padding": "x".repeat(64)})));
    assert_eq!(response["error"]["code"], -32070);
    assert_eq!(response["error"]["message"], "request body too large");
}

// ============================================================================
// SECTION: Tool Calls
// ============================================================================

#[test]
fn missing_env_on_stdio_is_a_tool_error() {
    let harness = stdio_harness(StaticEnv::new(), Ok(json!({})));
    let response = tool_call(&harness, "whoami", json!({}));
    let result = &response["result"];
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("authentication failed: missing or empty OCM_OFFLINE_TOKEN"));
    assert_eq!(harness.factory.opens(), 0);
}

#[test]
fn expired_token_is_flagged_for_reauthentication() {
    let error = BackendError::Api(ApiError::new("CLUSTERS-MGMT-401", "access token expired"));
    let harness = stdio_harness(env_with_token("off"), Err(error));
    let response = tool_call(&harness, "get_clusters", json!({"state": "ready"}));
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("AUTHENTICATION_FAILED:"));
    assert!(text.contains("expired"));
    assert_eq!(response["result"]["isError"], true);
    assert_eq!((harness.factory.opens(), harness.factory.closes()), (1, 1));
    let events = harness.audit.requests.lock().unwrap();
    let event = events.last().unwrap();
    assert_eq!(event.outcome, McpOutcome::ToolError);
    assert_eq!(event.error_kind, Some("CREDENTIAL_EXPIRED"));
    assert_eq!(event.tool, Some(ToolName::GetClusters));
}

#[test]
fn missing_required_string_names_it_and_opens_no_session() {
    let harness = stdio_harness(env_with_token("off"), Ok(json!({})));
    let response = tool_call(&harness, "get_cluster", json!({}));
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert_eq!(text, "missing required argument: cluster_id");
    assert_eq!(harness.factory.opens(), 0);
    assert!(harness.audit.credentials.lock().unwrap().is_empty());
}

#[test]
fn successful_call_formats_backend_json() {
    let account = json!({"username": "alice", "email": "alice@example.com"});
    let harness = stdio_harness(env_with_token("off"), Ok(account));
    let response = tool_call(&harness, "whoami", Value::Null);
    assert_eq!(response["result"]["isError"], false);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Username: alice"));
    assert_eq!(harness.factory.credentials()[0].0, "off");
    let events = harness.audit.requests.lock().unwrap();
    assert_eq!(events.last().unwrap().outcome, McpOutcome::Ok);
    assert_eq!(events.last().unwrap().request_id.as_deref(), Some("7"));
}

#[test]
fn unknown_profile_fails_initialization() {
    let mut config = FleetMcpConfig::default();
    config.tools.profile = "readonly".to_string();
    let result = fleet_mcp::McpServer::with_components(
        config,
        common::CountingFactory::new(Ok(json!({}))),
        std::sync::Arc::new(StaticEnv::new()),
        std::sync::Arc::new(fleet_mcp::McpNoopAuditSink),
    );
    let Err(err) = result else {
        panic!("unknown profile accepted");
    };
    assert_eq!(err.to_string(), "init error: unknown tool profile: readonly");
}
