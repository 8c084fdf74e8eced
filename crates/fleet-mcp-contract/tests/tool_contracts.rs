// crates/fleet-mcp-contract/tests/tool_contracts.rs
// ============================================================================
// Module: Tool Contract Tests
// Description: Validate tool contracts, schemas, profiles, and prompts.
// Purpose: Ensure the advertised MCP surface is consistent and well-formed.
// Dependencies: fleet-mcp-contract, jsonschema, serde_json
// ============================================================================

//! Tool contract tests for the canonical MCP surface.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only validation helpers use panic-based assertions for clarity."
)]

use std::collections::BTreeSet;

use fleet_mcp_contract::PromptContent;
use fleet_mcp_contract::ToolName;
use fleet_mcp_contract::ToolProfile;
use fleet_mcp_contract::get_prompt;
use fleet_mcp_contract::prompt_definitions;
use fleet_mcp_contract::tool_contracts;
use fleet_mcp_contract::tool_definitions;
use serde_json::Value;
use serde_json::json;

fn input_schema(name: ToolName) -> Value {
    tool_contracts()
        .into_iter()
        .find(|contract| contract.name == name)
        .map(|contract| contract.input_schema)
        .expect("contract exists")
}

#[test]
fn every_tool_has_exactly_one_contract_in_canonical_order() {
    let names: Vec<ToolName> = tool_contracts().iter().map(|contract| contract.name).collect();
    assert_eq!(names, ToolName::all().to_vec());
    let unique: BTreeSet<&str> = names.iter().map(|name| name.as_str()).collect();
    assert_eq!(unique.len(), names.len());
}

#[test]
fn tool_names_round_trip_through_parse() {
    for name in ToolName::all() {
        assert_eq!(ToolName::parse(name.as_str()), Some(*name));
    }
    assert_eq!(ToolName::parse("delete_cluster"), None);
}

#[test]
fn input_schemas_compile_and_are_closed() {
    for contract in tool_contracts() {
        jsonschema::validator_for(&contract.input_schema)
            .unwrap_or_else(|err| panic!("{} schema failed to compile: {err}", contract.name));
        assert_eq!(contract.input_schema["type"], "object");
        assert_eq!(contract.input_schema["additionalProperties"], false);
        let properties = contract.input_schema["properties"].as_object().unwrap();
        for required in contract.input_schema["required"].as_array().unwrap() {
            let key = required.as_str().unwrap();
            assert!(properties.contains_key(key), "{} requires undeclared {key}", contract.name);
        }
    }
}

#[test]
fn argument_types_are_limited_to_string_boolean_and_string_array() {
    for contract in tool_contracts() {
        for (key, schema) in contract.input_schema["properties"].as_object().unwrap() {
            let kind = schema["type"].as_str().unwrap();
            match kind {
                "string" | "boolean" => {}
                "array" => assert_eq!(schema["items"]["type"], "string", "{key}"),
                other => panic!("{} argument {key} has unsupported type {other}", contract.name),
            }
        }
    }
}

#[test]
fn get_clusters_schema_requires_state() {
    let validator = jsonschema::validator_for(&input_schema(ToolName::GetClusters)).unwrap();
    assert!(validator.is_valid(&json!({"state": "ready"})));
    assert!(!validator.is_valid(&json!({})));
    assert!(!validator.is_valid(&json!({"state": "ready", "extra": 1})));
}

#[test]
fn htpasswd_schema_accepts_each_user_input_form() {
    let validator =
        jsonschema::validator_for(&input_schema(ToolName::SetupHtpasswdIdentityProvider)).unwrap();
    assert!(validator.is_valid(&json!({"cluster_id": "c1", "users": ["alice:Secret"]})));
    assert!(validator.is_valid(&json!({"cluster_id": "c1", "username": "a", "password": "b"})));
    assert!(validator.is_valid(&json!({"cluster_id": "c1", "htpasswd_file_content": "YQ=="})));
    assert!(!validator.is_valid(&json!({"cluster_id": "c1", "mapping_method": "merge"})));
}

#[test]
fn definitions_serialize_with_mcp_field_names() {
    let definitions = serde_json::to_value(tool_definitions()).unwrap();
    let first = &definitions[0];
    assert_eq!(first["name"], "whoami");
    assert!(first.get("inputSchema").is_some());
    assert!(first.get("input_schema").is_none());
}

#[test]
fn default_profile_exposes_every_contract() {
    let profile = ToolProfile::default_profile();
    for contract in tool_contracts() {
        assert!(profile.contains(contract.name));
    }
}

#[test]
fn prerequisites_prompt_renders_text_and_link() {
    let definitions = prompt_definitions();
    assert_eq!(definitions.len(), 1);
    let prompt = get_prompt(definitions[0].name).unwrap();
    assert_eq!(prompt.messages.len(), 2);
    assert!(matches!(prompt.messages[0].content, PromptContent::Text { .. }));
    let link = serde_json::to_value(&prompt.messages[1]).unwrap();
    assert_eq!(link["content"]["type"], "resource_link");
    assert_eq!(link["content"]["mimeType"], "text/html");
    assert!(get_prompt("unknown").is_none());
}
