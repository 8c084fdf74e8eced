// crates/fleet-mcp-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for Fleet MCP configuration. The output is deterministic
//! and must always load through [`crate::FleetMcpConfig::from_toml_str`].

/// Returns a canonical example `fleet-mcp.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
transport = "http"
host = "127.0.0.1"
port = 8080
# public_base_url = "https://mcp.example.com"
max_body_bytes = 1048576

[server.audit]
enabled = true
# path = "/var/log/fleet-mcp/audit.jsonl"

[backend]
base_url = "https://api.openshift.com"
client_id = "cloud-services"
token_url = "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token"
request_timeout_ms = 30000
error_label = "OCM API"

[backend.expiry]
codes = ["CLUSTERS-MGMT-401", "ACCOUNTS-MGMT-401", "AUTHORIZATIONS-MGMT-401", "invalid_grant", "invalid_token"]
reason_markers = ["token expired", "token is expired", "invalid token", "not authenticated", "offline session not found"]

[tools]
profile = "default"
"#,
    )
}
