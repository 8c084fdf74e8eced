// crates/fleet-mcp/src/arguments.rs
// ============================================================================
// Module: Tool Arguments
// Description: Typed accessors over a tool call's JSON argument object.
// Purpose: Validate argument presence and type before any backend work.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`ToolArguments`] wraps the `arguments` object of a `tools/call` request.
//! Handlers pull each field through a typed accessor; a failure becomes an
//! `INVALID_ARGUMENT` tool result before a credential is resolved or a
//! session is opened.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Argument validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// Required argument absent or empty.
    #[error("missing required argument: {0}")]
    Missing(String),
    /// Argument present with the wrong JSON type.
    #[error("invalid argument '{name}': expected {expected}")]
    WrongType {
        /// Argument name.
        name: String,
        /// Expected type label.
        expected: &'static str,
    },
}

// ============================================================================
// SECTION: Argument Bag
// ============================================================================

/// Argument object for a single tool call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    /// Raw argument values by name.
    values: Map<String, Value>,
}

impl ToolArguments {
    /// Wraps a JSON value; `null` is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::WrongType`] when the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, ArgumentError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(values) => Ok(Self {
                values,
            }),
            _ => Err(ArgumentError::WrongType {
                name: "arguments".to_string(),
                expected: "object",
            }),
        }
    }

    /// Returns the raw value when present and not `null`.
    fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    /// Returns a string argument when present.
    fn string(&self, name: &str) -> Result<Option<&str>, ArgumentError> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(wrong_type(name, "string")),
        }
    }

    /// Returns a required, non-empty string argument.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] when absent, empty, or not a string.
    pub fn require_string(&self, name: &str) -> Result<String, ArgumentError> {
        match self.string(name)? {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(ArgumentError::Missing(name.to_string())),
        }
    }

    /// Returns an optional string argument; empty or mistyped values read as
    /// absent.
    #[must_use]
    pub fn optional_string(&self, name: &str) -> Option<String> {
        self.raw(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Returns a string argument, or the default when absent, empty, or not a
    /// string.
    #[must_use]
    pub fn get_string(&self, name: &str, default: &str) -> String {
        self.optional_string(name).unwrap_or_else(|| default.to_string())
    }

    /// Returns a boolean argument, or the default when absent or not a boolean.
    #[must_use]
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.raw(name).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Returns a string array argument.
    ///
    /// An absent or non-array value yields an empty list; non-string items are
    /// skipped.
    #[must_use]
    pub fn get_string_array(&self, name: &str) -> Vec<String> {
        self.raw(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Returns a required, non-empty string array argument.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] when absent, empty, or not an array of
    /// strings.
    pub fn require_string_array(&self, name: &str) -> Result<Vec<String>, ArgumentError> {
        let Some(value) = self.raw(name) else {
            return Err(ArgumentError::Missing(name.to_string()));
        };
        let items = value.as_array().ok_or_else(|| wrong_type(name, "array of strings"))?;
        let values = items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| wrong_type(name, "array of strings"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() {
            return Err(ArgumentError::Missing(name.to_string()));
        }
        Ok(values)
    }
}

/// Builds a type mismatch error.
fn wrong_type(name: &str, expected: &'static str) -> ArgumentError {
    ArgumentError::WrongType {
        name: name.to_string(),
        expected,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
