// crates/fleet-mcp-backend/src/token.rs
// ============================================================================
// Module: Offline Token Exchange
// Description: OAuth refresh-token grant for offline credentials.
// Purpose: Trade a long-lived offline token for a short-lived access token.
// Dependencies: reqwest, serde, url
// ============================================================================

//! ## Overview
//! Offline credentials are refresh tokens. The session exchanges one lazily,
//! on its first API call, using the `refresh_token` grant. The resulting
//! access token lives only inside that session.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use url::Url;
use url::form_urlencoded;

use crate::error::BackendError;
use crate::session::error_from_response;
use crate::session::read_limited;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    /// Issued access token.
    access_token: String,
}

// ============================================================================
// SECTION: Exchange
// ============================================================================

/// Exchanges an offline token for an access token.
///
/// # Errors
///
/// Returns [`BackendError::Api`] when the token endpoint rejects the grant,
/// or a transport/decode error otherwise.
pub(crate) fn exchange_offline_token(
    client: &Client,
    token_url: &Url,
    client_id: &str,
    offline_token: &str,
    max_response_bytes: usize,
) -> Result<String, BackendError> {
    let form = refresh_grant_form(client_id, offline_token);
    let response = client
        .post(token_url.clone())
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT, "application/json")
        .body(form)
        .send()
        .map_err(|err| BackendError::Transport(format!("token exchange: {err}")))?;
    let status = response.status();
    let bytes = read_limited(response, max_response_bytes)?;
    if !status.is_success() {
        return Err(error_from_response(status.as_u16(), &bytes));
    }
    let parsed: TokenResponse = serde_json::from_slice(&bytes)
        .map_err(|err| BackendError::Decode(format!("token response: {err}")))?;
    if parsed.access_token.trim().is_empty() {
        return Err(BackendError::Decode("token response: empty access_token".to_string()));
    }
    Ok(parsed.access_token)
}

/// Encodes the refresh-token grant body.
fn refresh_grant_form(client_id: &str, offline_token: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "refresh_token")
        .append_pair("client_id", client_id)
        .append_pair("refresh_token", offline_token)
        .finish()
}
