// crates/fleet-mcp-contract/src/prompts.rs
// ============================================================================
// Module: MCP Prompts
// Description: Static prompt definitions served over prompts/list and get.
// Purpose: Ship operator guidance alongside the tool surface.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Prompts are static text assets. The prerequisites guide walks an agent
//! through the AWS-side resources `create_rosa_hcp_cluster` expects to exist.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prerequisites guide prompt name.
pub const PREREQUISITES_PROMPT: &str = "rosa_hcp_prerequisites_guide";

/// Documentation link attached to the prerequisites guide.
const PREREQUISITES_DOC_URL: &str = "https://cloud.redhat.com/learning/learn:getting-started-red-hat-openshift-service-aws-rosa/resource/resources:creating-rosa-hcp-clusters-using-default-options#page-title";

/// Prerequisites guide body.
const PREREQUISITES_GUIDE: &str = "\
# ROSA HCP Prerequisites

Complete these steps in the target AWS account before calling create_rosa_hcp_cluster.

## 1. Enable ROSA and verify quotas
- Enable the ROSA service in the AWS console and link the AWS account to your Red Hat account.
- Run `rosa verify quota` and `rosa verify permissions`.
- Make sure the ELB service-linked role exists (`aws iam create-service-linked-role \
--aws-service-name elasticloadbalancing.amazonaws.com`).

## 2. Account roles
- Run `rosa create account-roles --hosted-cp --mode auto`.
- Record the installer role ARN (role_arn), support role ARN (supporting_role_arn), and \
worker role ARN (worker_role_arn).

## 3. OIDC configuration
- Run `rosa create oidc-config --mode auto` and record the identifier (oidc_config_id).

## 4. Operator roles
- Run `rosa create operator-roles --hosted-cp --prefix <prefix> --oidc-config-id <id> \
--installer-role-arn <role_arn>` and pass the prefix as operator_role_prefix.

## 5. Networking
- Create a VPC with at least one private subnet (and a public subnet for public clusters).
- `rosa create network` can provision a suitable VPC; pass the subnet identifiers as subnet_ids.

## 6. Identifiers
- aws_account_id and billing_account_id are usually the same 12 digit account.
- rosa_creator_arn is the ARN of the IAM identity running the setup (`aws sts get-caller-identity`).

After the cluster reaches the ready state, use setup_htpasswd_identity_provider to add users.
";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Prompt listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptDefinition {
    /// Prompt name.
    pub name: &'static str,
    /// Prompt description.
    pub description: &'static str,
}

/// Rendered prompt payload for `prompts/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptResult {
    /// Short prompt description.
    pub description: &'static str,
    /// Prompt messages.
    pub messages: Vec<PromptMessage>,
}

/// Single prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    /// Message role.
    pub role: &'static str,
    /// Message content.
    pub content: PromptContent,
}

/// Prompt message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptContent {
    /// Inline text.
    Text {
        /// Text body.
        text: &'static str,
    },
    /// Link to an external resource.
    ResourceLink {
        /// Resource URI.
        uri: &'static str,
        /// Resource name.
        name: &'static str,
        /// Resource description.
        description: &'static str,
        /// Resource MIME type.
        #[serde(rename = "mimeType")]
        mime_type: &'static str,
    },
}

// ============================================================================
// SECTION: Prompts
// ============================================================================

/// Returns all prompt definitions.
#[must_use]
pub fn prompt_definitions() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: PREREQUISITES_PROMPT,
        description: "Comprehensive guidance on ROSA HCP cluster creation prerequisites and \
                      setup steps",
    }]
}

/// Renders a prompt by name.
#[must_use]
pub fn get_prompt(name: &str) -> Option<PromptResult> {
    match name {
        PREREQUISITES_PROMPT => Some(PromptResult {
            description: "ROSA HCP Prerequisites Guide",
            messages: vec![
                PromptMessage {
                    role: "user",
                    content: PromptContent::Text {
                        text: PREREQUISITES_GUIDE,
                    },
                },
                PromptMessage {
                    role: "user",
                    content: PromptContent::ResourceLink {
                        uri: PREREQUISITES_DOC_URL,
                        name: "ROSA HCP Documentation",
                        description: "Official Red Hat documentation for creating ROSA HCP \
                                      clusters using default options",
                        mime_type: "text/html",
                    },
                },
            ],
        }),
        _ => None,
    }
}
