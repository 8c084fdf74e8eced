// crates/fleet-mcp-config/src/config.rs
// ============================================================================
// Module: Fleet MCP Configuration
// Description: Configuration loading and validation for the Fleet MCP server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then adjusted by command-line overrides and validated once. The resulting
//! value is read-only for the lifetime of the process.
//!
//! When no explicit path is given and the default file is absent, built-in
//! defaults are used so the stdio transport works with zero configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "fleet-mcp.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "FLEET_MCP_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Upper bound for `server.max_body_bytes`.
const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Default backend request timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Upper bound for `backend.request_timeout_ms`.
const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;
/// Maximum number of entries per expiry signal list.
const MAX_EXPIRY_ENTRIES: usize = 64;

/// Default backend API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openshift.com";
/// Default OAuth client identifier used for offline token exchange.
pub const DEFAULT_CLIENT_ID: &str = "cloud-services";
/// Default OAuth token endpoint used for offline token exchange.
pub const DEFAULT_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";
/// Default label used when rendering backend errors.
pub const DEFAULT_ERROR_LABEL: &str = "OCM API";
/// Default tool profile name.
pub const DEFAULT_PROFILE: &str = "default";
/// Default bind host for HTTP/SSE transports.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port for HTTP/SSE transports.
pub const DEFAULT_PORT: u16 = 8080;

/// Backend error codes treated as credential expiry by default.
const DEFAULT_EXPIRY_CODES: &[&str] = &[
    "CLUSTERS-MGMT-401",
    "ACCOUNTS-MGMT-401",
    "AUTHORIZATIONS-MGMT-401",
    "invalid_grant",
    "invalid_token",
];

/// Reason substrings treated as credential expiry by default.
const DEFAULT_EXPIRY_REASON_MARKERS: &[&str] = &[
    "token expired",
    "token is expired",
    "invalid token",
    "not authenticated",
    "offline session not found",
];

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Fleet MCP server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetMcpConfig {
    /// Server transport configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Backend API configuration.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Tool exposure configuration.
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl FleetMcpConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order is the explicit path, then [`CONFIG_ENV_VAR`], then
    /// `fleet-mcp.toml` in the working directory. A missing default file
    /// yields the built-in defaults; a missing explicit file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line overrides and re-validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the overridden configuration is invalid.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(transport) = overrides.transport {
            self.server.transport = transport;
        }
        if let Some(host) = &overrides.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(public_base_url) = &overrides.public_base_url {
            self.server.public_base_url = Some(public_base_url.clone());
        }
        if let Some(base_url) = &overrides.base_url {
            self.backend.base_url.clone_from(base_url);
        }
        if let Some(client_id) = &overrides.client_id {
            self.backend.client_id.clone_from(client_id);
        }
        self.validate()?;
        Ok(self)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.backend.validate()?;
        self.tools.validate()
    }
}

/// Command-line overrides applied on top of file configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Transport override.
    pub transport: Option<ServerTransport>,
    /// Bind host override.
    pub host: Option<String>,
    /// Bind port override.
    pub port: Option<u16>,
    /// Public base URL override.
    pub public_base_url: Option<String>,
    /// Backend base URL override.
    pub base_url: Option<String>,
    /// OAuth client identifier override.
    pub client_id: Option<String>,
}

// ============================================================================
// SECTION: Server Config
// ============================================================================

/// Server configuration for MCP transports.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport type for MCP.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind host (IP literal) for HTTP or SSE transports.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port for HTTP or SSE transports.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL advertised for HTTP or SSE endpoints.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            host: default_host(),
            port: default_port(),
            public_base_url: None,
            max_body_bytes: default_max_body_bytes(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be between 1 and {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        if let Some(url) = &self.public_base_url {
            validate_http_url("server.public_base_url", url)?;
        }
        self.audit.validate()?;
        match self.transport {
            ServerTransport::Http | ServerTransport::Sse => {
                if self.port == 0 {
                    return Err(ConfigError::Invalid(
                        "server.port must be greater than zero".to_string(),
                    ));
                }
                self.bind_addr()?;
            }
            ServerTransport::Stdio => {}
        }
        Ok(())
    }

    /// Returns the socket address for HTTP or SSE listeners.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the host is not an IP literal.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("server.host must be an ip address".to_string()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Returns the externally visible base URL without a trailing slash.
    #[must_use]
    pub fn public_url(&self) -> String {
        self.public_base_url.as_deref().map_or_else(
            || match self.bind_addr() {
                Ok(addr) => format!("http://{addr}"),
                Err(_) => format!("http://{}:{}", self.host.trim(), self.port),
            },
            |url| url.trim().trim_end_matches('/').to_string(),
        )
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional JSON-lines file path (stderr when unset).
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

/// Supported MCP transport types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ServerTransport {
    /// Single-connection stdin/stdout transport.
    #[default]
    Stdio,
    /// Multi-connection HTTP JSON-RPC transport.
    Http,
    /// Multi-connection HTTP transport answering with SSE events.
    Sse,
}

impl ServerTransport {
    /// Returns the stable label for the transport.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
        }
    }

    /// Returns true for transports that carry one caller per request.
    #[must_use]
    pub const fn is_multi_connection(self) -> bool {
        matches!(self, Self::Http | Self::Sse)
    }
}

impl fmt::Display for ServerTransport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ServerTransport {
    type Err = UnsupportedTransport;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "sse" => Ok(Self::Sse),
            _ => Err(UnsupportedTransport(value.to_string())),
        }
    }
}

impl TryFrom<String> for ServerTransport {
    type Error = UnsupportedTransport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Transport label that does not name a supported transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported transport mode: {0}")]
pub struct UnsupportedTransport(pub String);

// ============================================================================
// SECTION: Backend Config
// ============================================================================

/// Backend fleet-management API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// OAuth client identifier for offline token exchange.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// OAuth token endpoint for offline token exchange.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Per-request timeout applied by the HTTP client.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Label used when rendering structured backend errors.
    #[serde(default = "default_error_label")]
    pub error_label: String,
    /// Codes and reasons that signal credential expiry.
    #[serde(default)]
    pub expiry: ExpiryConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            client_id: default_client_id(),
            token_url: default_token_url(),
            request_timeout_ms: default_request_timeout_ms(),
            error_label: default_error_label(),
            expiry: ExpiryConfig::default(),
        }
    }
}

impl BackendConfig {
    /// Validates backend configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("backend.base_url", &self.base_url)?;
        validate_http_url("backend.token_url", &self.token_url)?;
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.client_id must be non-empty".to_string()));
        }
        if self.error_label.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.error_label must be non-empty".to_string()));
        }
        if self.request_timeout_ms == 0 || self.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "backend.request_timeout_ms must be between 1 and {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        self.expiry.validate()
    }
}

/// Backend error signals treated as credential expiry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpiryConfig {
    /// Error codes matched exactly (case-insensitive).
    #[serde(default = "default_expiry_codes")]
    pub codes: Vec<String>,
    /// Reason substrings matched case-insensitively.
    #[serde(default = "default_expiry_reason_markers")]
    pub reason_markers: Vec<String>,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            codes: default_expiry_codes(),
            reason_markers: default_expiry_reason_markers(),
        }
    }
}

impl ExpiryConfig {
    /// Validates expiry signal lists.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_signal_list("backend.expiry.codes", &self.codes)?;
        validate_signal_list("backend.expiry.reason_markers", &self.reason_markers)
    }
}

// ============================================================================
// SECTION: Tools Config
// ============================================================================

/// Tool exposure configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Tool profile name.
    #[serde(default = "default_profile")]
    pub profile: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
        }
    }
}

impl ToolsConfig {
    /// Validates tool configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.profile.trim().is_empty() {
            return Err(ConfigError::Invalid("tools.profile must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default bind host.
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

/// Default bind port.
const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Default backend base URL.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Default OAuth client identifier.
fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

/// Default OAuth token endpoint.
fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

/// Default backend request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Default backend error label.
fn default_error_label() -> String {
    DEFAULT_ERROR_LABEL.to_string()
}

/// Default expiry codes.
fn default_expiry_codes() -> Vec<String> {
    DEFAULT_EXPIRY_CODES.iter().map(|code| (*code).to_string()).collect()
}

/// Default expiry reason markers.
fn default_expiry_reason_markers() -> Vec<String> {
    DEFAULT_EXPIRY_REASON_MARKERS.iter().map(|marker| (*marker).to_string()).collect()
}

/// Default tool profile.
fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// Returns the path and whether it was explicitly requested.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates that a value is an absolute http or https URL with a host.
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!("{field} must use http:// or https://")));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Invalid(format!("{field} must include a host")));
    }
    Ok(())
}

/// Validates a bounded list of non-empty signal strings.
fn validate_signal_list(field: &str, values: &[String]) -> Result<(), ConfigError> {
    if values.len() > MAX_EXPIRY_ENTRIES {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds {MAX_EXPIRY_ENTRIES} entries"
        )));
    }
    if values.iter().any(|value| value.trim().is_empty()) {
        return Err(ConfigError::Invalid(format!("{field} entries must be non-empty")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
