// crates/fleet-mcp-backend/src/htpasswd.rs
// ============================================================================
// Module: Htpasswd Users
// Description: User input parsing and validation for htpasswd providers.
// Purpose: Reject weak or reserved credentials before they reach a cluster.
// Dependencies: base64, bcrypt, thiserror
// ============================================================================

//! ## Overview
//! Users can arrive in three forms, checked in this order:
//! 1. `users`: a list of `username:password` entries,
//! 2. `username` plus `password`,
//! 3. `htpasswd_file_content`: a base64 encoded htpasswd file whose
//!    passwords are already hashed.
//!
//! Plaintext passwords must satisfy the cluster password policy and are
//! bcrypt hashed before they leave the process. Entries from an htpasswd file
//! are already hashed and pass through; only their usernames are checked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bcrypt::Version;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Username and identity provider name reserved for the admin user.
pub const CLUSTER_ADMIN_NAME: &str = "cluster-admin";
/// Minimum plaintext password length.
pub const MIN_PASSWORD_LENGTH: usize = 14;
/// bcrypt work factor for plaintext passwords.
pub const HASH_COST: u32 = 10;
/// Characters forbidden in usernames.
const FORBIDDEN_USERNAME_CHARS: [char; 3] = ['/', ':', '%'];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Htpasswd validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HtpasswdError {
    /// Username contains a forbidden character.
    #[error("invalid username '{0}': username must not contain /, :, or %")]
    InvalidUsername(String),
    /// Username is reserved.
    #[error("username '{0}' is not allowed. It is preserved for cluster admin creation")]
    ReservedUsername(String),
    /// Identity provider name has an invalid shape.
    #[error("invalid identifier '{0}' for 'name'")]
    InvalidProviderName(String),
    /// Identity provider name is reserved.
    #[error("the name \"cluster-admin\" is reserved for admin user IDP")]
    ReservedProviderName,
    /// Password violates the policy.
    #[error("{0}")]
    WeakPassword(&'static str),
    /// Htpasswd file line is not `user:password`.
    #[error("malformed line, expected validUsername:validPassword, got: {0}")]
    MalformedFileLine(String),
    /// `users` entry is not `user:password`.
    #[error("users should be provided in format username:password")]
    MalformedUserEntry,
    /// Username was supplied without a password.
    #[error("password required when username is provided")]
    MissingPassword,
    /// Htpasswd file content could not be decoded.
    #[error("failed to decode htpasswd file content: {0}")]
    InvalidFileEncoding(String),
    /// Htpasswd file contained no users.
    #[error("htpasswd file content contains no users")]
    EmptyFile,
    /// Password hashing failed.
    #[error("failed to hash password: {0}")]
    Hash(String),
    /// No input form was supplied.
    #[error(
        "no user input provided: specify 'users', 'username'+'password', or 'htpasswd_file_content'"
    )]
    NoUserInput,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a username.
///
/// # Errors
///
/// Returns [`HtpasswdError`] for forbidden characters or the reserved name.
pub fn validate_username(username: &str) -> Result<(), HtpasswdError> {
    if username.contains(FORBIDDEN_USERNAME_CHARS) {
        return Err(HtpasswdError::InvalidUsername(username.to_string()));
    }
    if username == CLUSTER_ADMIN_NAME {
        return Err(HtpasswdError::ReservedUsername(username.to_string()));
    }
    Ok(())
}

/// Validates a plaintext password against the cluster policy.
///
/// # Errors
///
/// Returns [`HtpasswdError::WeakPassword`] naming the first violated rule.
pub fn validate_password(password: &str) -> Result<(), HtpasswdError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(HtpasswdError::WeakPassword("password must be at least 14 characters"));
    }
    if !password.bytes().all(|byte| (b' '..=b'~').contains(&byte)) {
        return Err(HtpasswdError::WeakPassword(
            "password should use ASCII-standard characters only",
        ));
    }
    if password.starts_with(' ') || password.ends_with(' ') {
        return Err(HtpasswdError::WeakPassword(
            "password must not start or end with whitespace",
        ));
    }
    if !password.chars().any(|ch| ch.is_ascii_uppercase()) {
        return Err(HtpasswdError::WeakPassword("password must include uppercase letters"));
    }
    if !password.chars().any(|ch| ch.is_ascii_lowercase()) {
        return Err(HtpasswdError::WeakPassword("password must include lowercase letters"));
    }
    if !password.chars().any(|ch| ch.is_ascii_digit() || ch.is_ascii_punctuation()) {
        return Err(HtpasswdError::WeakPassword("password must include numbers or symbols"));
    }
    Ok(())
}

/// Hashes a plaintext password in the `$2y$` htpasswd bcrypt format.
///
/// # Errors
///
/// Returns [`HtpasswdError::Hash`] when bcrypt rejects the input.
pub fn hash_password(password: &str) -> Result<String, HtpasswdError> {
    bcrypt::hash_with_result(password, HASH_COST)
        .map(|parts| parts.format_for_version(Version::TwoY))
        .map_err(|err| HtpasswdError::Hash(err.to_string()))
}

/// Validates a plaintext user entry.
///
/// # Errors
///
/// Returns the first username or password violation.
pub fn validate_user_credentials(username: &str, password: &str) -> Result<(), HtpasswdError> {
    validate_username(username)?;
    validate_password(password)
}

/// Validates an identity provider name.
///
/// Names are alphanumeric runs joined by single `-` or `_` separators.
///
/// # Errors
///
/// Returns [`HtpasswdError`] for malformed or reserved names.
pub fn validate_provider_name(name: &str) -> Result<(), HtpasswdError> {
    let well_formed = !name.is_empty()
        && name.split(['-', '_']).all(|segment| {
            !segment.is_empty() && segment.chars().all(|ch| ch.is_ascii_alphanumeric())
        });
    if !well_formed {
        return Err(HtpasswdError::InvalidProviderName(name.to_string()));
    }
    if name.eq_ignore_ascii_case(CLUSTER_ADMIN_NAME) {
        return Err(HtpasswdError::ReservedProviderName);
    }
    Ok(())
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses htpasswd file text into a username to hash map.
///
/// Blank lines are skipped; later duplicates replace earlier ones.
///
/// # Errors
///
/// Returns [`HtpasswdError::MalformedFileLine`] for lines without a user and
/// hash separated by `:`.
pub fn parse_htpasswd_file(content: &str) -> Result<BTreeMap<String, String>, HtpasswdError> {
    let mut users = BTreeMap::new();
    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let (username, hash) = split_user_entry(line)
            .ok_or_else(|| HtpasswdError::MalformedFileLine(line.to_string()))?;
        users.insert(username.to_string(), hash.to_string());
    }
    Ok(users)
}

/// Splits `user:secret` at the first colon, requiring both halves.
fn split_user_entry(entry: &str) -> Option<(&str, &str)> {
    let (username, secret) = entry.split_once(':')?;
    if username.is_empty() || secret.is_empty() {
        return None;
    }
    Some((username, secret))
}

// ============================================================================
// SECTION: Input Processing
// ============================================================================

/// Raw user input for an htpasswd provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtpasswdUserInput {
    /// `username:password` entries.
    pub users: Vec<String>,
    /// Single username.
    pub username: Option<String>,
    /// Password for the single username.
    pub password: Option<String>,
    /// Base64 encoded htpasswd file.
    pub file_content: Option<String>,
}

/// Normalized users ready for the provider body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtpasswdUsers {
    /// Username to password (or hash) map.
    pub users: BTreeMap<String, String>,
    /// True when the values are pre-hashed.
    pub hashed: bool,
}

impl HtpasswdUserInput {
    /// Resolves the input into users, honoring form precedence.
    ///
    /// # Errors
    ///
    /// Returns [`HtpasswdError`] for malformed entries or missing input.
    pub fn process(&self) -> Result<HtpasswdUsers, HtpasswdError> {
        if !self.users.is_empty() {
            let mut users = BTreeMap::new();
            for entry in &self.users {
                let (username, password) =
                    split_user_entry(entry).ok_or(HtpasswdError::MalformedUserEntry)?;
                users.insert(username.to_string(), password.to_string());
            }
            return Ok(HtpasswdUsers {
                users,
                hashed: false,
            });
        }
        if let Some(username) = non_empty(self.username.as_deref()) {
            let password =
                non_empty(self.password.as_deref()).ok_or(HtpasswdError::MissingPassword)?;
            return Ok(HtpasswdUsers {
                users: BTreeMap::from([(username.to_string(), password.to_string())]),
                hashed: false,
            });
        }
        if let Some(encoded) = non_empty(self.file_content.as_deref()) {
            let decoded = STANDARD
                .decode(encoded.trim())
                .map_err(|err| HtpasswdError::InvalidFileEncoding(err.to_string()))?;
            let text = String::from_utf8(decoded)
                .map_err(|err| HtpasswdError::InvalidFileEncoding(err.to_string()))?;
            let users = parse_htpasswd_file(&text)?;
            if users.is_empty() {
                return Err(HtpasswdError::EmptyFile);
            }
            return Ok(HtpasswdUsers {
                users,
                hashed: true,
            });
        }
        Err(HtpasswdError::NoUserInput)
    }
}

impl HtpasswdUsers {
    /// Validates every user; passwords are checked only when plaintext.
    ///
    /// # Errors
    ///
    /// Returns the username and the first violation found.
    pub fn validate(&self) -> Result<(), (String, HtpasswdError)> {
        for (username, password) in &self.users {
            let outcome = if self.hashed {
                validate_username(username)
            } else {
                validate_user_credentials(username, password)
            };
            outcome.map_err(|err| (username.clone(), err))?;
        }
        Ok(())
    }

    /// Returns `(username, hash)` pairs, hashing plaintext passwords.
    ///
    /// # Errors
    ///
    /// Returns the username whose password could not be hashed.
    pub fn hashed_entries(&self) -> Result<Vec<(String, String)>, (String, HtpasswdError)> {
        self.users
            .iter()
            .map(|(username, secret)| {
                let hash = if self.hashed {
                    secret.clone()
                } else {
                    hash_password(secret).map_err(|err| (username.clone(), err))?
                };
                Ok((username.clone(), hash))
            })
            .collect()
    }
}

/// Returns the value when present and non-empty.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
