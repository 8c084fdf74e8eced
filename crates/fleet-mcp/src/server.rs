// crates/fleet-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: MCP server implementations for stdio, HTTP, and SSE transports.
// Purpose: Expose fleet tools and prompts via JSON-RPC 2.0.
// Dependencies: fleet-mcp-backend, fleet-mcp-config, axum, tokio
// ============================================================================

//! ## Overview
//! The MCP server speaks JSON-RPC 2.0 over newline-delimited stdio or over
//! HTTP (`POST /rpc`, answered as JSON or as a single SSE event). Every
//! message is handled by one synchronous pipeline, [`McpServer::handle_payload`],
//! which runs on a blocking thread because backend sessions use a blocking
//! HTTP client. Each message produces one audit event.
//!
//! Security posture: request bodies are untrusted and size-limited; header
//! values are snapshotted per request and never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;
use std::io;
use std::io::BufRead;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::Sse;
use axum::response::sse::Event;
use axum::routing::get;
use axum::routing::post;
use fleet_mcp_backend::HttpSessionFactory;
use fleet_mcp_backend::SessionFactory;
use fleet_mcp_backend::SessionSettings;
use fleet_mcp_config::FleetMcpConfig;
use fleet_mcp_config::ServerTransport;
use fleet_mcp_contract::ToolName;
use fleet_mcp_contract::ToolProfile;
use fleet_mcp_contract::get_prompt;
use fleet_mcp_contract::prompt_definitions;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_stream::wrappers::ReceiverStream;

use crate::audit::McpAuditEvent;
use crate::audit::McpAuditEventParams;
use crate::audit::McpAuditSink;
use crate::audit::McpFileAuditSink;
use crate::audit::McpNoopAuditSink;
use crate::audit::McpStderrAuditSink;
use crate::auth::CredentialHeaders;
use crate::auth::CredentialResolver;
use crate::auth::EnvSource;
use crate::auth::OFFLINE_TOKEN_ENV;
use crate::auth::OFFLINE_TOKEN_HEADER;
use crate::auth::ProcessEnv;
use crate::auth::RequestContext;
use crate::classify::ErrorClassifier;
use crate::classify::ExpirySignals;
use crate::telemetry::McpMethod;
use crate::telemetry::McpOutcome;
use crate::tools::ToolError;
use crate::tools::ToolRegistry;
use crate::tools::ToolRouter;
use crate::tools::ToolShim;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Server name reported by `initialize` and discovery.
pub const SERVER_NAME: &str = "fleet-mcp";
/// Server version reported by `initialize` and discovery.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
/// MCP protocol version used when the client does not request one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Fallback SSE payload when response serialization fails.
const SERIALIZATION_FAILED_PAYLOAD: &str =
    "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32060,\"message\":\"serialization \
     failed\"}}";

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Server configuration.
    config: FleetMcpConfig,
    /// Shared request-handling state.
    state: Arc<ServerState>,
}

impl McpServer {
    /// Builds a new MCP server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when initialization fails.
    pub fn from_config(config: FleetMcpConfig) -> Result<Self, McpServerError> {
        let backend = &config.backend;
        let settings = SessionSettings::new(
            backend.base_url.clone(),
            backend.client_id.clone(),
            backend.token_url.clone(),
            Duration::from_millis(backend.request_timeout_ms),
        );
        let sessions = Arc::new(HttpSessionFactory::new(settings));
        let audit = build_audit_sink(&config)?;
        Self::with_components(config, sessions, Arc::new(ProcessEnv), audit)
    }

    /// Builds a server with explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when configuration is invalid or the tool
    /// profile is unknown.
    pub fn with_components(
        config: FleetMcpConfig,
        sessions: Arc<dyn SessionFactory>,
        env: Arc<dyn EnvSource>,
        audit: Arc<dyn McpAuditSink>,
    ) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let profile = ToolProfile::by_name(&config.tools.profile).ok_or_else(|| {
            McpServerError::Init(format!("unknown tool profile: {}", config.tools.profile))
        })?;
        let classifier = ErrorClassifier::new(
            config.backend.error_label.clone(),
            ExpirySignals::from_config(&config.backend.expiry),
        );
        let resolver = CredentialResolver::new(env, Arc::clone(&audit));
        let env_fallback = resolver.has_env_fallback();
        let shim = ToolShim::new(resolver, sessions, classifier);
        let router = ToolRouter::new(ToolRegistry::from_profile(&profile), shim);
        let state = Arc::new(ServerState {
            router,
            audit,
            transport: config.server.transport,
            max_body_bytes: config.server.max_body_bytes,
            public_url: config.server.public_url(),
            env_fallback,
        });
        Ok(Self {
            config,
            state,
        })
    }

    /// Returns the tool router.
    #[must_use]
    pub fn router(&self) -> &ToolRouter {
        &self.state.router
    }

    /// Handles one JSON-RPC payload; `None` when no response is due.
    ///
    /// This call may block on backend I/O.
    #[must_use]
    pub fn handle_payload(&self, context: &RequestContext, payload: &[u8]) -> Option<Vec<u8>> {
        process_payload(&self.state, context, payload).1
    }

    /// Serves newline-delimited JSON-RPC until the reader reaches EOF.
    ///
    /// This call blocks.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError::Transport`] on read or write failure.
    pub fn serve_lines(
        &self,
        reader: impl BufRead,
        writer: impl Write,
    ) -> Result<(), McpServerError> {
        serve_lines(&self.state, reader, writer)
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the server fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        match self.config.server.transport {
            ServerTransport::Stdio => {
                emit_banner(&format!("serving stdio (backend {})", self.config.backend.base_url));
                let state = self.state;
                tokio::task::spawn_blocking(move || {
                    serve_lines(&state, io::stdin().lock(), io::stdout().lock())
                })
                .await
                .map_err(|err| McpServerError::Transport(format!("stdio task failed: {err}")))?
            }
            ServerTransport::Http | ServerTransport::Sse => {
                let addr = self
                    .config
                    .server
                    .bind_addr()
                    .map_err(|err| McpServerError::Config(err.to_string()))?;
                let transport = self.state.transport;
                let listener = TcpListener::bind(addr).await.map_err(|err| {
                    McpServerError::Transport(format!("{transport} bind failed: {err}"))
                })?;
                self.serve_listener(listener).await
            }
        }
    }

    /// Serves HTTP or SSE requests on an already-bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the transport is stdio or the server
    /// fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), McpServerError> {
        let transport = self.state.transport;
        if !transport.is_multi_connection() {
            return Err(McpServerError::Config(
                "stdio transport cannot serve a tcp listener".to_string(),
            ));
        }
        let local = listener
            .local_addr()
            .map_err(|err| McpServerError::Transport(format!("{transport} bind failed: {err}")))?;
        emit_banner(&format!(
            "serving {transport} on {local} (public {}, backend {})",
            self.state.public_url, self.config.backend.base_url
        ));
        if self.state.env_fallback {
            let _ = writeln!(io::stderr(), "{}", env_fallback_warning(transport));
        }
        let app = build_app(Arc::clone(&self.state));
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|err| McpServerError::Transport(format!("{transport} server failed: {err}")))
    }
}

/// Selects the audit sink from configuration.
fn build_audit_sink(config: &FleetMcpConfig) -> Result<Arc<dyn McpAuditSink>, McpServerError> {
    let audit = &config.server.audit;
    if !audit.enabled {
        return Ok(Arc::new(McpNoopAuditSink));
    }
    match &audit.path {
        Some(path) => {
            let sink = McpFileAuditSink::new(Path::new(path))
                .map_err(|err| McpServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(McpStderrAuditSink)),
    }
}

/// Writes a startup line to stderr.
fn emit_banner(message: &str) {
    let _ = writeln!(io::stderr(), "{SERVER_NAME} {SERVER_VERSION}: {message}");
}

/// Warning for multi-connection callers that may share the operator token.
fn env_fallback_warning(transport: ServerTransport) -> String {
    format!(
        "{SERVER_NAME}: WARNING: {OFFLINE_TOKEN_ENV} is set; {transport} requests without \
         credential headers will use it"
    )
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// One newline-delimited frame.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// Complete line without its terminator.
    Line(Vec<u8>),
    /// Line longer than the body limit; its remainder was discarded.
    Oversize,
}

/// Serves newline-delimited JSON-RPC messages until EOF.
fn serve_lines(
    state: &ServerState,
    mut reader: impl BufRead,
    mut writer: impl Write,
) -> Result<(), McpServerError> {
    let context = RequestContext::stdio();
    while let Some(frame) = read_line_bounded(&mut reader, state.max_body_bytes)
        .map_err(|err| McpServerError::Transport(format!("stdio read failed: {err}")))?
    {
        let response = match frame {
            Frame::Line(line) => {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                process_payload(state, &context, &line).1
            }
            Frame::Oversize => {
                let request_bytes = state.max_body_bytes.saturating_add(1);
                finish(state, &context, oversize_exchange(), request_bytes).1
            }
        };
        if let Some(bytes) = response {
            write_line(&mut writer, &bytes)?;
        }
    }
    Ok(())
}

/// Reads one line of at most `max` bytes (excluding the terminator).
fn read_line_bounded(reader: &mut impl BufRead, max: usize) -> io::Result<Option<Frame>> {
    let mut line = Vec::new();
    let limit = max.saturating_add(2);
    let read = reader
        .by_ref()
        .take(u64::try_from(limit).unwrap_or(u64::MAX))
        .read_until(b'\n', &mut line)?;
    if read == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    } else if line.len() >= limit {
        discard_line(reader)?;
        return Ok(Some(Frame::Oversize));
    }
    if line.len() > max {
        return Ok(Some(Frame::Oversize));
    }
    Ok(Some(Frame::Line(line)))
}

/// Consumes input up to and including the next newline.
fn discard_line(reader: &mut impl BufRead) -> io::Result<()> {
    loop {
        let buffer = reader.fill_buf()?;
        if buffer.is_empty() {
            return Ok(());
        }
        if let Some(position) = buffer.iter().position(|byte| *byte == b'\n') {
            reader.consume(position + 1);
            return Ok(());
        }
        let length = buffer.len();
        reader.consume(length);
    }
}

/// Writes one response line and flushes.
fn write_line(writer: &mut impl Write, payload: &[u8]) -> Result<(), McpServerError> {
    writer
        .write_all(payload)
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush())
        .map_err(|err| McpServerError::Transport(format!("stdio write failed: {err}")))
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Shared server state for every transport.
struct ServerState {
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Audit sink for request events.
    audit: Arc<dyn McpAuditSink>,
    /// Configured transport.
    transport: ServerTransport,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Externally visible base URL.
    public_url: String,
    /// True when header-less requests fall back to the environment token.
    env_fallback: bool,
}

/// Builds the HTTP router for the configured transport.
fn build_app(state: Arc<ServerState>) -> Router {
    let rpc = match state.transport {
        ServerTransport::Sse => post(handle_sse),
        ServerTransport::Http | ServerTransport::Stdio => post(handle_http),
    };
    Router::new()
        .route("/rpc", rpc)
        .route("/healthz", get(handle_health))
        .route("/", get(handle_discovery))
        .with_state(state)
}

/// Handles HTTP JSON-RPC requests.
async fn handle_http(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let context = http_request_context(ServerTransport::Http, peer, &headers);
    let (status, payload) = process_http_body(state, context, body).await;
    match payload {
        Some(payload) => (status, [(CONTENT_TYPE, "application/json")], payload).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Handles SSE JSON-RPC requests.
async fn handle_sse(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let context = http_request_context(ServerTransport::Sse, peer, &headers);
    let (_, payload) = process_http_body(state, context, body).await;
    let Some(payload) = payload else {
        return StatusCode::ACCEPTED.into_response();
    };
    let data = String::from_utf8(payload)
        .unwrap_or_else(|_| SERIALIZATION_FAILED_PAYLOAD.to_string());
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(1);
    let _ = tx.send(Ok(Event::default().data(data))).await;
    Sse::new(ReceiverStream::new(rx)).into_response()
}

/// Liveness probe.
async fn handle_health() -> impl IntoResponse {
    axum::Json(json!({ "status": "ok" }))
}

/// Discovery document listing endpoint URLs.
async fn handle_discovery(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let base = &state.public_url;
    axum::Json(json!({
        "name": SERVER_NAME,
        "version": SERVER_VERSION,
        "transport": state.transport.as_str(),
        "endpoints": {
            "rpc": format!("{base}/rpc"),
            "health": format!("{base}/healthz"),
        }
    }))
}

/// Reads a bounded body and handles it on a blocking thread.
async fn process_http_body(
    state: Arc<ServerState>,
    context: RequestContext,
    body: Body,
) -> (StatusCode, Option<Vec<u8>>) {
    let Ok(bytes) = axum::body::to_bytes(body, state.max_body_bytes).await else {
        return finish(&state, &context, oversize_exchange(), state.max_body_bytes);
    };
    tokio::task::spawn_blocking(move || process_payload(&state, &context, &bytes))
        .await
        .unwrap_or_else(|err| {
            let message = format!("request task failed: {err}");
            let response = JsonRpcResponse::error(Value::Null, -32050, message);
            (StatusCode::INTERNAL_SERVER_ERROR, serde_json::to_vec(&response).ok())
        })
}

/// Snapshots credential headers into a request context.
fn http_request_context(
    transport: ServerTransport,
    peer: SocketAddr,
    headers: &HeaderMap,
) -> RequestContext {
    let text = |value: Option<&axum::http::HeaderValue>| {
        value.and_then(|value| value.to_str().ok()).map(str::to_string)
    };
    let snapshot = CredentialHeaders {
        authorization: text(headers.get(AUTHORIZATION)),
        offline_token: text(headers.get(OFFLINE_TOKEN_HEADER)),
        header_names: headers.keys().map(|name| name.as_str().to_string()).collect(),
    };
    RequestContext::http(transport, Some(peer.ip()), snapshot)
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier (`null` when absent).
    #[serde(default)]
    id: Value,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    const fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    const fn error(id: Value, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
            }),
        }
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Prompt lookup parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct PromptGetParams {
    /// Prompt name.
    name: String,
}

/// Handled message plus the metadata its audit event needs.
struct Exchange {
    /// HTTP status for HTTP transports.
    status: StatusCode,
    /// Response, or `None` for notifications.
    response: Option<JsonRpcResponse>,
    /// Method classification.
    method: McpMethod,
    /// Tool name for `tools/call`.
    tool: Option<ToolName>,
    /// JSON-RPC request identifier.
    request_id: Option<String>,
    /// Error kind label.
    error_kind: Option<&'static str>,
}

impl Exchange {
    /// Builds a successful exchange.
    const fn ok(method: McpMethod, id: Value, result: Value) -> Self {
        Self {
            status: StatusCode::OK,
            response: Some(JsonRpcResponse::result(id, result)),
            method,
            tool: None,
            request_id: None,
            error_kind: None,
        }
    }

    /// Builds a protocol error exchange.
    const fn fail(
        method: McpMethod,
        id: Value,
        status: StatusCode,
        code: i64,
        message: String,
        kind: &'static str,
    ) -> Self {
        Self {
            status,
            response: Some(JsonRpcResponse::error(id, code, message)),
            method,
            tool: None,
            request_id: None,
            error_kind: Some(kind),
        }
    }
}

/// Exchange for a body over the size limit.
fn oversize_exchange() -> Exchange {
    Exchange::fail(
        McpMethod::Invalid,
        Value::Null,
        StatusCode::PAYLOAD_TOO_LARGE,
        -32070,
        "request body too large".to_string(),
        "payload_too_large",
    )
}

/// Handles a payload end to end: parse, dispatch, serialize, audit.
fn process_payload(
    state: &ServerState,
    context: &RequestContext,
    bytes: &[u8],
) -> (StatusCode, Option<Vec<u8>>) {
    let exchange = if bytes.len() > state.max_body_bytes {
        oversize_exchange()
    } else {
        handle_message(state, context, bytes)
    };
    finish(state, context, exchange, bytes.len())
}

/// Serializes the response and records the audit event.
fn finish(
    state: &ServerState,
    context: &RequestContext,
    exchange: Exchange,
    request_bytes: usize,
) -> (StatusCode, Option<Vec<u8>>) {
    let payload = exchange.response.as_ref().map(|response| {
        serde_json::to_vec(response)
            .unwrap_or_else(|_| SERIALIZATION_FAILED_PAYLOAD.as_bytes().to_vec())
    });
    let error_code =
        exchange.response.as_ref().and_then(|response| response.error.as_ref()).map(|err| err.code);
    let outcome = match (error_code, exchange.error_kind) {
        (Some(_), _) => McpOutcome::Error,
        (None, Some(_)) => McpOutcome::ToolError,
        (None, None) => McpOutcome::Ok,
    };
    state.audit.record(&McpAuditEvent::new(McpAuditEventParams {
        request_id: exchange.request_id,
        transport: context.transport,
        peer_ip: context.peer_ip.map(|ip| ip.to_string()),
        method: exchange.method,
        tool: exchange.tool,
        outcome,
        error_code,
        error_kind: exchange.error_kind,
        request_bytes,
        response_bytes: payload.as_ref().map_or(0, Vec::len),
    }));
    (exchange.status, payload)
}

/// Parses and dispatches one JSON-RPC message.
fn handle_message(state: &ServerState, context: &RequestContext, bytes: &[u8]) -> Exchange {
    let invalid = || {
        Exchange::fail(
            McpMethod::Invalid,
            Value::Null,
            StatusCode::BAD_REQUEST,
            -32600,
            "invalid json-rpc request".to_string(),
            "invalid_request",
        )
    };
    let Ok(value) = serde_json::from_slice::<Value>(bytes) else {
        return invalid();
    };
    let is_notification = value.as_object().is_some_and(|object| !object.contains_key("id"));
    let Ok(request) = serde_json::from_value::<JsonRpcRequest>(value) else {
        return invalid();
    };
    let method = McpMethod::from_method(&request.method);
    let request_id = (!is_notification).then(|| request.id.to_string());
    if is_notification {
        return Exchange {
            status: StatusCode::ACCEPTED,
            response: None,
            method: McpMethod::Notification,
            tool: None,
            request_id: None,
            error_kind: None,
        };
    }
    let context = match &request_id {
        Some(id) => context.clone().with_request_id(id.clone()),
        None => context.clone(),
    };
    let mut exchange = if request.jsonrpc == "2.0" {
        dispatch(state, &context, method, request)
    } else {
        Exchange::fail(
            method,
            request.id,
            StatusCode::BAD_REQUEST,
            -32600,
            "invalid json-rpc version".to_string(),
            "invalid_request",
        )
    };
    exchange.request_id = request_id;
    exchange
}

/// Routes a JSON-RPC request by method.
fn dispatch(
    state: &ServerState,
    context: &RequestContext,
    method: McpMethod,
    request: JsonRpcRequest,
) -> Exchange {
    let id = request.id;
    let params = request.params.unwrap_or(Value::Null);
    match request.method.as_str() {
        "initialize" => {
            let protocol = params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_PROTOCOL_VERSION);
            let result = json!({
                "protocolVersion": protocol,
                "capabilities": {
                    "tools": { "listChanged": false },
                    "prompts": { "listChanged": false },
                },
                "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
            });
            Exchange::ok(method, id, result)
        }
        "ping" => Exchange::ok(method, id, json!({})),
        "tools/list" => match serde_json::to_value(state.router.list_tools()) {
            Ok(tools) => Exchange::ok(method, id, json!({ "tools": tools })),
            Err(_) => tool_error(method, id, ToolError::Serialization),
        },
        "tools/call" => match serde_json::from_value::<ToolCallParams>(params) {
            Ok(call) => {
                let tool = ToolName::parse(&call.name);
                let mut exchange =
                    match state.router.handle_tool_call(context, &call.name, call.arguments) {
                        Ok(result) => {
                            let mut exchange = Exchange::ok(method, id, result.to_mcp_value());
                            exchange.error_kind = result.failure.map(|code| code.as_str());
                            exchange
                        }
                        Err(err) => tool_error(method, id, err),
                    };
                exchange.tool = tool;
                exchange
            }
            Err(_) => {
                let error = ToolError::InvalidParams("invalid tool params".to_string());
                tool_error(method, id, error)
            }
        },
        "prompts/list" => match serde_json::to_value(prompt_definitions()) {
            Ok(prompts) => Exchange::ok(method, id, json!({ "prompts": prompts })),
            Err(_) => tool_error(method, id, ToolError::Serialization),
        },
        "prompts/get" => {
            let Ok(lookup) = serde_json::from_value::<PromptGetParams>(params) else {
                return tool_error(
                    method,
                    id,
                    ToolError::InvalidParams("invalid prompt params".to_string()),
                );
            };
            match get_prompt(&lookup.name).map(serde_json::to_value) {
                Some(Ok(prompt)) => Exchange::ok(method, id, prompt),
                Some(Err(_)) => tool_error(method, id, ToolError::Serialization),
                None => tool_error(
                    method,
                    id,
                    ToolError::InvalidParams(format!("unknown prompt: {}", lookup.name)),
                ),
            }
        }
        _ => Exchange::fail(
            method,
            id,
            StatusCode::BAD_REQUEST,
            -32601,
            "method not found".to_string(),
            "method_not_found",
        ),
    }
}

/// Builds a JSON-RPC error exchange for a routing failure.
fn tool_error(method: McpMethod, id: Value, error: ToolError) -> Exchange {
    let (status, code, kind) = match &error {
        ToolError::UnknownTool(_) => (StatusCode::BAD_REQUEST, -32602, "unknown_tool"),
        ToolError::InvalidParams(_) => (StatusCode::BAD_REQUEST, -32602, "invalid_params"),
        ToolError::Serialization => (StatusCode::OK, -32060, "serialization"),
    };
    let message = match error {
        ToolError::InvalidParams(message) => message,
        other => other.to_string(),
    };
    Exchange::fail(method, id, status, code, message, kind)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
