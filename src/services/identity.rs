//! Supabase auth service: OAuth/PKCE code exchange.
//!
//! The callback route calls [`SessionExchange::exchange_code`] exactly once
//! per request. The production implementation posts to the Supabase GoTrue
//! token endpoint; tests substitute a scripted exchanger.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::config::SupabaseConfig;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Prefix marking a base64url-encoded session cookie value.
pub const COOKIE_VALUE_PREFIX: &str = "base64-";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("supabase auth not configured")]
    NotConfigured,
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
    #[error("code exchange request failed: {0}")]
    Request(String),
    #[error("code exchange rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected token response: {0}")]
    Parse(String),
}

/// Session returned by a successful code exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user: serde_json::Value,
}

fn default_token_type() -> String {
    "bearer".into()
}

impl AuthSession {
    /// Encode the session for the `sb-auth-token` cookie.
    ///
    /// JSON contains characters that are not valid in a cookie value, so the
    /// payload is base64url-encoded behind [`COOKIE_VALUE_PREFIX`].
    #[must_use]
    pub fn to_cookie_value(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        format!("{COOKIE_VALUE_PREFIX}{}", URL_SAFE_NO_PAD.encode(json))
    }

    /// Inverse of [`AuthSession::to_cookie_value`].
    #[cfg(test)]
    #[must_use]
    pub fn from_cookie_value(raw: &str) -> Option<Self> {
        let encoded = raw.strip_prefix(COOKIE_VALUE_PREFIX)?;
        let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Exchanges a one-time authorization code for a session.
#[async_trait::async_trait]
pub trait SessionExchange: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`AuthError`] when the provider rejects the code or cannot
    /// be reached.
    async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<AuthSession, AuthError>;
}

// =============================================================================
// SUPABASE CLIENT
// =============================================================================

pub struct SupabaseAuthClient {
    http: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseAuthClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: SupabaseConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn token_url(&self) -> String {
        format!("{}/auth/v1/token?grant_type=pkce", self.config.url)
    }
}

#[derive(Serialize)]
struct PkceGrant<'a> {
    auth_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_verifier: Option<&'a str>,
}

#[derive(Deserialize)]
struct GoTrueError {
    #[serde(alias = "error_description", alias = "msg")]
    message: Option<String>,
}

#[async_trait::async_trait]
impl SessionExchange for SupabaseAuthClient {
    async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<AuthSession, AuthError> {
        if !self.config.is_configured() {
            return Err(AuthError::NotConfigured);
        }

        let resp = self
            .http
            .post(self.token_url())
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .json(&PkceGrant { auth_code: code, code_verifier })
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| AuthError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Rejected { status: status.as_u16(), message: rejection_message(&body) });
        }

        parse_session(&body)
    }
}

pub(crate) fn parse_session(body: &str) -> Result<AuthSession, AuthError> {
    serde_json::from_str(body).map_err(|e| AuthError::Parse(e.to_string()))
}

pub(crate) fn rejection_message(body: &str) -> String {
    serde_json::from_str::<GoTrueError>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| "unknown error".into())
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
