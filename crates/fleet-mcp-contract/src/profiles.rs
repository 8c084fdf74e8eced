// crates/fleet-mcp-contract/src/profiles.rs
// ============================================================================
// Module: Tool Profiles
// Description: Named sets of tools exposed by the server.
// Purpose: Allow curated tool subsets without a polymorphic profile layer.
// Dependencies: crate::types
// ============================================================================

//! ## Overview
//! A profile is a named set of [`ToolName`]s. Only the `default` profile
//! exists today and it contains every defined tool; the registry builds from a
//! profile so future subsets (for example a read-only profile) only need a new
//! entry here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::types::ToolName;

// ============================================================================
// SECTION: Profiles
// ============================================================================

/// Name of the profile that exposes every tool.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Named tool subset.
///
/// # Invariants
/// - The default profile contains every [`ToolName`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolProfile {
    /// Profile name.
    name: &'static str,
    /// Human-readable description.
    description: &'static str,
    /// Tools enabled by the profile.
    tools: BTreeSet<ToolName>,
}

impl ToolProfile {
    /// Returns the default profile with every tool enabled.
    #[must_use]
    pub fn default_profile() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME,
            description: "Default profile with all ROSA HCP tools enabled",
            tools: ToolName::all().iter().copied().collect(),
        }
    }

    /// Looks up a profile by name.
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim() {
            DEFAULT_PROFILE_NAME => Some(Self::default_profile()),
            _ => None,
        }
    }

    /// Returns the profile name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the profile description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Returns true when the profile enables the tool.
    #[must_use]
    pub fn contains(&self, tool: ToolName) -> bool {
        self.tools.contains(&tool)
    }

    /// Returns enabled tools in canonical order.
    #[must_use]
    pub fn tools(&self) -> Vec<ToolName> {
        ToolName::all().iter().copied().filter(|tool| self.tools.contains(tool)).collect()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
