// crates/fleet-mcp-backend/src/session.rs
// ============================================================================
// Module: Backend Sessions
// Description: Per-call backend session trait, HTTP factory, and scope guard.
// Purpose: Open one authenticated session per tool call and always close it.
// Dependencies: reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! A [`SessionFactory`] turns a [`Credential`] into a [`FleetBackend`]. The
//! HTTP implementation builds a fresh blocking client per session so no
//! connection or token is ever shared across requests. [`SessionScope`] owns
//! a session and closes it exactly once on every exit path.
//!
//! Security posture: response bodies are read with a hard size limit; no
//! redirects are followed; credential values never appear in errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use serde_json::Value;
use url::Url;

use crate::credential::Credential;
use crate::credential::CredentialKind;
use crate::error::ApiError;
use crate::error::BackendError;
use crate::error::SessionError;
use crate::token::exchange_offline_token;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Clusters management API root.
const CLUSTERS_API: [&str; 3] = ["api", "clusters_mgmt", "v1"];
/// Accounts management API root.
const ACCOUNTS_API: [&str; 3] = ["api", "accounts_mgmt", "v1"];
/// Page size for cluster listings.
const CLUSTER_PAGE_SIZE: &str = "100";
/// Maximum characters of an unstructured error body kept in messages.
const MAX_ERROR_SNIPPET: usize = 512;
/// Default maximum response body size.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Authenticated session against the fleet-management API.
///
/// Sessions are single-use: they are opened for one tool call and closed
/// before the call returns.
pub trait FleetBackend: Send {
    /// Fetches the account that owns the credential.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the request fails.
    fn current_account(&mut self) -> Result<Value, BackendError>;

    /// Lists clusters in the given state.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the request fails.
    fn list_clusters(&mut self, state: &str) -> Result<Value, BackendError>;

    /// Fetches a cluster by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the request fails.
    fn get_cluster(&mut self, cluster_id: &str) -> Result<Value, BackendError>;

    /// Submits a cluster creation request.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the request fails.
    fn create_cluster(&mut self, body: &Value) -> Result<Value, BackendError>;

    /// Lists identity providers configured on a cluster.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the request fails.
    fn list_identity_providers(&mut self, cluster_id: &str) -> Result<Value, BackendError>;

    /// Creates an identity provider on a cluster.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the request fails.
    fn create_identity_provider(
        &mut self,
        cluster_id: &str,
        body: &Value,
    ) -> Result<Value, BackendError>;

    /// Deletes an identity provider from a cluster.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the request fails.
    fn delete_identity_provider(
        &mut self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<(), BackendError>;

    /// Releases session resources. Must be idempotent.
    fn close(&mut self);
}

/// Builds backend sessions from resolved credentials.
pub trait SessionFactory: Send + Sync {
    /// Opens a new session for one tool call.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Build`] when the client cannot be constructed.
    fn open(&self, credential: &Credential) -> Result<Box<dyn FleetBackend>, SessionError>;
}

// ============================================================================
// SECTION: Session Scope
// ============================================================================

/// Owns a backend session and closes it on drop.
///
/// # Invariants
/// - The wrapped session is closed at most once by the scope.
/// - Closing an empty scope is a no-op.
#[derive(Default)]
pub struct SessionScope {
    /// Open session, if any.
    session: Option<Box<dyn FleetBackend>>,
}

impl SessionScope {
    /// Opens a session through the factory.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the factory fails; nothing needs closing.
    pub fn open(
        factory: &dyn SessionFactory,
        credential: &Credential,
    ) -> Result<Self, SessionError> {
        factory.open(credential).map(Self::from_session)
    }

    /// Wraps an already-open session.
    #[must_use]
    pub fn from_session(session: Box<dyn FleetBackend>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Returns the open session.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Internal`] when the scope was already closed.
    pub fn backend(&mut self) -> Result<&mut dyn FleetBackend, BackendError> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(BackendError::Internal("backend session is closed".to_string())),
        }
    }

    /// Returns true while the scope still owns a session.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Closes the session now.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// SECTION: HTTP Factory
// ============================================================================

/// Settings shared by every HTTP session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// API base URL.
    pub base_url: String,
    /// OAuth client identifier for offline token exchange.
    pub client_id: String,
    /// OAuth token endpoint.
    pub token_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum response body size in bytes.
    pub max_response_bytes: usize,
    /// User-Agent header value.
    pub user_agent: String,
}

impl SessionSettings {
    /// Builds settings with default limits and user agent.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        token_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            token_url: token_url.into(),
            timeout,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: format!("fleet-mcp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Session factory backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    /// Shared settings.
    settings: SessionSettings,
}

impl HttpSessionFactory {
    /// Creates a factory from settings.
    #[must_use]
    pub const fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
        }
    }

    /// Returns the factory settings.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open(&self, credential: &Credential) -> Result<Box<dyn FleetBackend>, SessionError> {
        let session = HttpSession::connect(&self.settings, credential)?;
        Ok(Box::new(session))
    }
}

// ============================================================================
// SECTION: HTTP Session
// ============================================================================

/// Blocking HTTP session bound to one credential.
pub struct HttpSession {
    /// HTTP client; `None` once closed.
    client: Option<Client>,
    /// API base URL.
    base_url: Url,
    /// OAuth token endpoint.
    token_url: Url,
    /// OAuth client identifier.
    client_id: String,
    /// Maximum response size.
    max_response_bytes: usize,
    /// Credential supplied by the caller.
    credential: Credential,
    /// Access token in use, exchanged lazily for offline credentials.
    access_token: Option<String>,
}

impl HttpSession {
    /// Builds a session without performing network I/O.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Build`] when a URL or the client is invalid.
    pub fn connect(
        settings: &SessionSettings,
        credential: &Credential,
    ) -> Result<Self, SessionError> {
        let base_url = parse_url(&settings.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(SessionError::Build(format!(
                "base url cannot carry a path: {}",
                settings.base_url
            )));
        }
        let token_url = parse_url(&settings.token_url)?;
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| SessionError::Build(err.to_string()))?;
        let access_token = match credential.kind() {
            CredentialKind::Access => Some(credential.value().to_string()),
            CredentialKind::Offline => None,
        };
        Ok(Self {
            client: Some(client),
            base_url,
            token_url,
            client_id: settings.client_id.clone(),
            max_response_bytes: settings.max_response_bytes,
            credential: credential.clone(),
            access_token,
        })
    }

    /// Returns the client or an error when the session is closed.
    fn client(&self) -> Result<&Client, BackendError> {
        self.client
            .as_ref()
            .ok_or_else(|| BackendError::Internal("backend session is closed".to_string()))
    }

    /// Returns the access token, exchanging the offline token on first use.
    fn bearer(&mut self) -> Result<String, BackendError> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }
        let token = exchange_offline_token(
            self.client()?,
            &self.token_url,
            &self.client_id,
            self.credential.value(),
            self.max_response_bytes,
        )?;
        self.access_token = Some(token.clone());
        Ok(token)
    }

    /// Builds an endpoint URL from path segments and query pairs.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Internal("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Sends a request and decodes the JSON response.
    fn send(
        &mut self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, BackendError> {
        let token = self.bearer()?;
        let url = self.endpoint(segments, query)?;
        let mut request = self
            .client()?
            .request(method, url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().map_err(|err| BackendError::Transport(err.to_string()))?;
        let status = response.status();
        let bytes = read_limited(response, self.max_response_bytes)?;
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &bytes));
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| BackendError::Decode(err.to_string()))
    }

    /// Sends a request that must return a JSON body.
    fn send_json(
        &mut self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        self.send(method, segments, query, body)?
            .ok_or_else(|| BackendError::Decode("empty response body".to_string()))
    }
}

impl FleetBackend for HttpSession {
    fn current_account(&mut self) -> Result<Value, BackendError> {
        let path = api_path(&ACCOUNTS_API, &["current_account"]);
        self.send_json(Method::GET, &path, &[], None)
    }

    fn list_clusters(&mut self, state: &str) -> Result<Value, BackendError> {
        let path = api_path(&CLUSTERS_API, &["clusters"]);
        let search = state_search(state);
        let query = [("search", search.as_str()), ("size", CLUSTER_PAGE_SIZE)];
        self.send_json(Method::GET, &path, &query, None)
    }

    fn get_cluster(&mut self, cluster_id: &str) -> Result<Value, BackendError> {
        let path = api_path(&CLUSTERS_API, &["clusters", cluster_id]);
        self.send_json(Method::GET, &path, &[], None)
    }

    fn create_cluster(&mut self, body: &Value) -> Result<Value, BackendError> {
        let path = api_path(&CLUSTERS_API, &["clusters"]);
        self.send_json(Method::POST, &path, &[], Some(body))
    }

    fn list_identity_providers(&mut self, cluster_id: &str) -> Result<Value, BackendError> {
        let path = api_path(&CLUSTERS_API, &["clusters", cluster_id, "identity_providers"]);
        self.send_json(Method::GET, &path, &[], None)
    }

    fn create_identity_provider(
        &mut self,
        cluster_id: &str,
        body: &Value,
    ) -> Result<Value, BackendError> {
        let path = api_path(&CLUSTERS_API, &["clusters", cluster_id, "identity_providers"]);
        self.send_json(Method::POST, &path, &[], Some(body))
    }

    fn delete_identity_provider(
        &mut self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<(), BackendError> {
        let path = api_path(
            &CLUSTERS_API,
            &["clusters", cluster_id, "identity_providers", provider_id],
        );
        self.send(Method::DELETE, &path, &[], None).map(|_| ())
    }

    fn close(&mut self) {
        self.client = None;
        self.access_token = None;
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a configured URL, keeping the parser error text.
fn parse_url(value: &str) -> Result<Url, SessionError> {
    Url::parse(value).map_err(|err| SessionError::Build(format!("invalid url {value}: {err}")))
}

/// Joins an API root with resource segments.
fn api_path<'a>(root: &[&'a str], resource: &[&'a str]) -> Vec<&'a str> {
    root.iter().chain(resource.iter()).copied().collect()
}

/// Builds the cluster search expression for a state filter.
pub(crate) fn state_search(state: &str) -> String {
    format!("state = '{}'", state.replace('\'', "''"))
}

/// Reads a response body up to `limit` bytes.
pub(crate) fn read_limited(reader: impl Read, limit: usize) -> Result<Vec<u8>, BackendError> {
    let max = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    reader
        .take(max)
        .read_to_end(&mut bytes)
        .map_err(|err| BackendError::Transport(err.to_string()))?;
    if bytes.len() > limit {
        return Err(BackendError::Decode(format!("response exceeds {limit} bytes")));
    }
    Ok(bytes)
}

/// Converts a non-success response into a backend error.
pub(crate) fn error_from_response(status: u16, body: &[u8]) -> BackendError {
    if let Some(detail) = ApiError::from_body(status, body) {
        return BackendError::Api(detail);
    }
    let text = String::from_utf8_lossy(body);
    let message: String = text.trim().chars().take(MAX_ERROR_SNIPPET).collect();
    BackendError::Status {
        status,
        message,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
