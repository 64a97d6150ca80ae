use std::time::Duration;

use url::Url;

use super::error::AuthError;
use super::gate::GateConfig;
use crate::backend::{ApiConfig, TokenClient};

/// Shared cookie and routing settings used by both config and runtime state.
#[derive(Debug, Clone)]
pub(crate) struct SessionSettings {
    pub(crate) refresh_cookie_name: String,
    pub(crate) refresh_cookie_path: String,
    pub(crate) access_signal_cookie_name: String,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    pub(crate) gate: GateConfig,
}

impl SessionSettings {
    fn defaults() -> Self {
        Self {
            refresh_cookie_name: "refresh_token".into(),
            refresh_cookie_path: "/".into(),
            access_signal_cookie_name: "accessToken".into(),
            secure_cookies: true,
            auth_path: "/api/auth".into(),
            gate: GateConfig::default(),
        }
    }
}

/// Session lifecycle configuration.
///
/// Required field (`client`) is a constructor parameter.
///
/// Use [`from_env()`](SessionConfig::from_env) for convention-based setup,
/// or [`new()`](SessionConfig::new) with `with_*` methods for full control.
pub struct SessionConfig {
    pub(super) client: TokenClient,
    pub(super) settings: SessionSettings,
}

impl SessionConfig {
    #[must_use]
    pub fn new(client: TokenClient) -> Self {
        Self {
            client,
            settings: SessionSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `SESSION_API_BASE_URL`: backend base URL
    ///
    /// # Optional env vars
    /// - `SESSION_REFRESH_PATH`: token-exchange path
    /// - `SESSION_ME_PATH`: identity path
    /// - `SESSION_TIMEOUT_SECS`: per-call backend timeout
    /// - `SESSION_TRANSIENT_RETRIES`: retries after timeout/connection errors
    /// - `SESSION_PROTECTED_PREFIXES`: comma-separated protected path prefixes
    /// - `SESSION_LOGIN_PATH`: login page path
    /// - `SESSION_LANDING_PATH`: where signed-in visitors of the login page go
    /// - `DEV_AUTH`: `"1"` or `"true"` disables the `Secure` cookie flag
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if required env vars are missing or values are invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        let base_url_str = std::env::var("SESSION_API_BASE_URL")
            .map_err(|_| AuthError::Config("SESSION_API_BASE_URL is required".into()))?;
        let base_url: Url = base_url_str
            .parse()
            .map_err(|e| AuthError::Config(format!("SESSION_API_BASE_URL: {e}")))?;

        let mut api = ApiConfig::new(base_url);

        if let Ok(path) = std::env::var("SESSION_REFRESH_PATH") {
            api = api.with_refresh_path(path);
        }
        if let Ok(path) = std::env::var("SESSION_ME_PATH") {
            api = api.with_me_path(path);
        }
        if let Ok(secs) = std::env::var("SESSION_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| AuthError::Config(format!("SESSION_TIMEOUT_SECS: {e}")))?;
            if secs == 0 {
                return Err(AuthError::Config("SESSION_TIMEOUT_SECS must be positive".into()));
            }
            api = api.with_timeout(Duration::from_secs(secs));
        }
        if let Ok(retries) = std::env::var("SESSION_TRANSIENT_RETRIES") {
            let retries: u32 = retries
                .parse()
                .map_err(|e| AuthError::Config(format!("SESSION_TRANSIENT_RETRIES: {e}")))?;
            api = api.with_transient_retries(retries);
        }

        let mut gate = GateConfig::default();
        if let Ok(prefixes) = std::env::var("SESSION_PROTECTED_PREFIXES") {
            gate = gate.with_protected_prefixes(
                prefixes
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            );
        }
        if let Ok(path) = std::env::var("SESSION_LOGIN_PATH") {
            gate = gate.with_login_path(path);
        }
        if let Ok(path) = std::env::var("SESSION_LANDING_PATH") {
            gate = gate.with_landing_path(path);
        }

        let dev_auth = matches!(
            std::env::var("DEV_AUTH").as_deref(),
            Ok("1") | Ok("true"),
        );

        Ok(Self::new(TokenClient::new(api))
            .with_gate(gate)
            .with_secure_cookies(!dev_auth))
    }

    #[must_use]
    pub fn with_refresh_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.refresh_cookie_name = name.into();
        self
    }

    /// Path scope of the refresh cookie; deletion must use the same path.
    #[must_use]
    pub fn with_refresh_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.settings.refresh_cookie_path = path.into();
        self
    }

    #[must_use]
    pub fn with_access_signal_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.access_signal_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    #[must_use]
    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.settings.gate = gate;
        self
    }

    #[must_use]
    pub fn gate(&self) -> &GateConfig {
        &self.settings.gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_conventions() {
        let config = SessionConfig::new(TokenClient::new(ApiConfig::new(
            "https://api.example.com".parse().unwrap(),
        )));

        assert_eq!(config.settings.refresh_cookie_name, "refresh_token");
        assert_eq!(config.settings.access_signal_cookie_name, "accessToken");
        assert!(config.settings.secure_cookies);
        assert_eq!(config.gate().login_path(), "/login");
    }

    #[test]
    fn overrides_apply() {
        let config = SessionConfig::new(TokenClient::new(ApiConfig::new(
            "https://api.example.com".parse().unwrap(),
        )))
        .with_refresh_cookie_name("rt")
        .with_secure_cookies(false)
        .with_auth_path("/auth");

        assert_eq!(config.settings.refresh_cookie_name, "rt");
        assert!(!config.settings.secure_cookies);
        assert_eq!(config.settings.auth_path, "/auth");
    }
}
