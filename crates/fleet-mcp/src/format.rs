// crates/fleet-mcp/src/format.rs
// ============================================================================
// Module: Response Formatting
// Description: Plain-text summaries of backend resources.
// Purpose: Give agents compact, stable text instead of raw API payloads.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Formatters read backend JSON through lookups and skip absent fields, so a
//! partial payload never fails formatting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the string at a `/`-separated path when present and non-empty.
fn text_at<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    let pointer = format!("/{path}");
    value.pointer(&pointer).and_then(Value::as_str).filter(|text| !text.is_empty())
}

/// Appends `label: value` when the value exists.
fn push_field(out: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push(format!("{label}: {value}"));
    }
}

/// Returns the best available OpenShift version string.
fn cluster_version(cluster: &Value) -> Option<&str> {
    text_at(cluster, "openshift_version").or_else(|| text_at(cluster, "version/raw_id"))
}

// ============================================================================
// SECTION: Formatters
// ============================================================================

/// Formats the authenticated account.
#[must_use]
pub fn format_account(account: &Value) -> String {
    let mut lines = vec!["Account Information:".to_string()];
    push_field(&mut lines, "Username", text_at(account, "username"));
    push_field(&mut lines, "Email", text_at(account, "email"));
    let name = [text_at(account, "first_name"), text_at(account, "last_name")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    push_field(&mut lines, "Name", Some(name.as_str()).filter(|name| !name.is_empty()));
    push_field(&mut lines, "Account ID", text_at(account, "id"));
    let organization_name = text_at(account, "organization/name");
    let organization = match (organization_name, text_at(account, "organization/id")) {
        (Some(name), Some(id)) => Some(format!("{name} ({id})")),
        (Some(name), None) => Some(name.to_string()),
        (None, Some(id)) => Some(id.to_string()),
        (None, None) => None,
    };
    push_field(&mut lines, "Organization", organization.as_deref());
    lines.join("\n")
}

/// Formats a cluster list response.
#[must_use]
pub fn format_clusters(clusters: &Value) -> String {
    let items =
        clusters.get("items").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
    if items.is_empty() {
        return "No clusters found.".to_string();
    }
    let total = clusters
        .get("total")
        .and_then(Value::as_u64)
        .unwrap_or_else(|| u64::try_from(items.len()).unwrap_or(u64::MAX));
    let mut lines = vec![format!("Found {total} cluster(s):")];
    for cluster in items {
        let name = text_at(cluster, "name").unwrap_or("<unnamed>");
        let id = text_at(cluster, "id").unwrap_or("<unknown>");
        let mut details = Vec::new();
        if let Some(state) = text_at(cluster, "state") {
            details.push(format!("state={state}"));
        }
        if let Some(version) = cluster_version(cluster) {
            details.push(format!("version={version}"));
        }
        if let Some(region) = text_at(cluster, "region/id") {
            details.push(format!("region={region}"));
        }
        if details.is_empty() {
            lines.push(format!("- {name} ({id})"));
        } else {
            lines.push(format!("- {name} ({id}) {}", details.join(", ")));
        }
    }
    lines.join("\n")
}

/// Formats a single cluster.
#[must_use]
pub fn format_cluster(cluster: &Value) -> String {
    let mut lines = Vec::new();
    push_field(&mut lines, "Cluster", text_at(cluster, "name"));
    push_field(&mut lines, "ID", text_at(cluster, "id"));
    push_field(&mut lines, "External ID", text_at(cluster, "external_id"));
    push_field(&mut lines, "State", text_at(cluster, "state"));
    push_field(&mut lines, "Version", cluster_version(cluster));
    push_field(&mut lines, "Cloud Provider", text_at(cluster, "cloud_provider/id"));
    push_field(&mut lines, "Region", text_at(cluster, "region/id"));
    if cluster.pointer("/hypershift/enabled").and_then(Value::as_bool) == Some(true) {
        lines.push("Hosted Control Plane: yes".to_string());
    }
    push_field(&mut lines, "API URL", text_at(cluster, "api/url"));
    push_field(&mut lines, "Console URL", text_at(cluster, "console/url"));
    push_field(&mut lines, "Created", text_at(cluster, "creation_timestamp"));
    if lines.is_empty() {
        return "Cluster details unavailable.".to_string();
    }
    lines.join("\n")
}

/// Formats a cluster creation response.
#[must_use]
pub fn format_cluster_created(cluster: &Value) -> String {
    let mut lines = vec!["Cluster creation initiated.".to_string()];
    lines.push(format_cluster(cluster));
    if let Some(id) = text_at(cluster, "id") {
        lines.push(format!("Use get_cluster with cluster_id '{id}' to monitor installation."));
    }
    lines.join("\n")
}

/// Formats a created identity provider.
#[must_use]
pub fn format_identity_provider(provider: &Value) -> String {
    let name = text_at(provider, "name").unwrap_or("<unnamed>");
    let mut lines = vec![format!("Identity provider '{name}' created.")];
    push_field(&mut lines, "ID", text_at(provider, "id"));
    push_field(&mut lines, "Type", text_at(provider, "type"));
    push_field(&mut lines, "Mapping Method", text_at(provider, "mapping_method"));
    let users = provider
        .pointer("/htpasswd/users/items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| text_at(item, "username"))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|users| !users.is_empty());
    push_field(&mut lines, "Users", users.as_deref());
    lines.join("\n")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
