//! Mobile shell configuration for the native app wrapper.
//!
//! SYSTEM CONTEXT
//! ==============
//! The iOS and Android apps are thin shells that load the hosted web app
//! from `server.url`. The packaging tool reads `capacitor.config.json` at the
//! repository root; the same file is compiled into this binary, checked at
//! startup, and served at `/capacitor.config.json` so the shell settings a
//! deployment ships with can be inspected.
//!
//! TRADE-OFFS
//! ==========
//! The typed model ignores unknown keys, so the served document is the
//! re-serialized model rather than the raw file. Keys only the native
//! build reads (signing credentials) are not modelled.

use serde::{Deserialize, Serialize};
use tracing::warn;

const BUNDLED_CONFIG: &str = include_str!("../capacitor.config.json");

#[derive(Debug, thiserror::Error)]
pub enum ShellConfigError {
    #[error("shell config parse failed: {0}")]
    Parse(String),
    #[error("invalid shell config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellConfig {
    pub app_id: String,
    pub app_name: String,
    pub web_dir: String,
    pub server: ShellServer,
    pub android: AndroidShell,
    pub ios: IosShell,
    #[serde(default)]
    pub plugins: ShellPlugins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellServer {
    /// Remote URL the shell loads instead of bundled assets.
    pub url: String,
    #[serde(default)]
    pub cleartext: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidShell {
    #[serde(default)]
    pub allow_mixed_content: bool,
    pub background_color: String,
    pub build_options: AndroidBuildOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseType {
    #[serde(rename = "AAB")]
    Aab,
    #[serde(rename = "APK")]
    Apk,
}

/// Signing material is supplied by the build environment, never committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidBuildOptions {
    pub release_type: ReleaseType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosShell {
    pub background_color: String,
    pub content_inset: String,
    pub preferred_content_mode: String,
    pub scheme: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellPlugins {
    #[serde(rename = "SplashScreen", default, skip_serializing_if = "Option::is_none")]
    pub splash_screen: Option<SplashScreen>,
    #[serde(rename = "Keyboard", default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<KeyboardPlugin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplashScreen {
    /// Milliseconds the splash stays up before auto-hide.
    pub launch_show_duration: u32,
    pub background_color: String,
    #[serde(default)]
    pub show_spinner: bool,
    #[serde(default)]
    pub launch_auto_hide: bool,
    #[serde(default)]
    pub splash_immersive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardPlugin {
    pub resize: String,
    #[serde(default)]
    pub resize_on_full_screen: bool,
}

impl ShellConfig {
    /// The configuration compiled into this binary, parsed and validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled file is malformed or fails validation.
    pub fn bundled() -> Result<Self, ShellConfigError> {
        Self::parse(BUNDLED_CONFIG)
    }

    /// Parse and validate a shell config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn parse(raw: &str) -> Result<Self, ShellConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ShellConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first rule the config breaks.
    pub fn validate(&self) -> Result<(), ShellConfigError> {
        let invalid = |msg: &str| Err(ShellConfigError::Invalid(msg.to_owned()));

        if self.app_id.trim().is_empty() || self.app_name.trim().is_empty() {
            return invalid("appId and appName must be set");
        }
        if !self.app_id.contains('.') {
            return invalid("appId must be a reverse-domain identifier");
        }
        if self.server.cleartext {
            return invalid("server.cleartext must be false");
        }
        if self.android.allow_mixed_content {
            return invalid("android.allowMixedContent must be false");
        }
        match reqwest::Url::parse(&self.server.url) {
            Ok(url) if url.scheme() == "https" && url.host_str().is_some() => Ok(()),
            Ok(_) => invalid("server.url must be an https URL"),
            Err(_) => invalid("server.url is not a valid URL"),
        }
    }

    /// Host of the remote URL the shell loads.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        reqwest::Url::parse(&self.server.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }

    /// `Some((shell_host, app_host))` when both are known and differ.
    #[must_use]
    pub fn host_mismatch(&self, app_url: &str) -> Option<(String, String)> {
        let shell_host = self.host()?;
        let app_host = reqwest::Url::parse(app_url).ok()?.host_str()?.to_owned();
        (shell_host != app_host).then_some((shell_host, app_host))
    }

    /// Log when the shell points somewhere other than this deployment.
    pub fn warn_on_host_mismatch(&self, app_url: &str) {
        if let Some((shell_host, app_host)) = self.host_mismatch(app_url) {
            warn!(%shell_host, %app_host, "mobile: shell server.url host differs from NEXT_PUBLIC_APP_URL");
        }
    }
}

#[cfg(test)]
#[path = "mobile_test.rs"]
mod tests;
