use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::types::{AccessToken, RefreshToken, UserProfile};

/// Backend API configuration.
///
/// The base URL is the only required field.
///
/// ```rust,ignore
/// use sessionkit::ApiConfig;
///
/// let config = ApiConfig::new("https://api.example.com".parse()?)
///     .with_timeout(std::time::Duration::from_secs(3));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
    pub(crate) refresh_path: String,
    pub(crate) me_path: String,
    pub(crate) timeout: Duration,
    pub(crate) transient_retries: u32,
    pub(crate) retry_backoff: Duration,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            refresh_path: "/api/token/refresh/".into(),
            me_path: "/api/me/".into(),
            timeout: Duration::from_secs(5),
            transient_retries: 1,
            retry_backoff: Duration::from_millis(200),
        }
    }

    /// Override the token-exchange path (default: `/api/token/refresh/`).
    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Override the identity path (default: `/api/me/`).
    #[must_use]
    pub fn with_me_path(mut self, path: impl Into<String>) -> Self {
        self.me_path = path.into();
        self
    }

    /// Per-call timeout for every backend request (default: 5 s).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extra attempts after a timeout or connection failure (default: 1).
    #[must_use]
    pub fn with_transient_retries(mut self, retries: u32) -> Self {
        self.transient_retries = retries;
        self
    }

    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn transient_retries(&self) -> u32 {
        self.transient_retries
    }

    /// Join `path` onto the base URL, keeping any path prefix on the base.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: AccessToken,
}

/// Client for the token-exchange and identity endpoints.
#[derive(Debug, Clone)]
pub struct TokenClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl TokenClient {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Exchange a refresh credential for a new access credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure or timeout, or
    /// [`Error::Api`] if the endpoint rejects the refresh token.
    pub async fn exchange_refresh(&self, refresh: &RefreshToken) -> Result<AccessToken, Error> {
        let response = self
            .http
            .post(self.config.endpoint(&self.config.refresh_path))
            .timeout(self.config.timeout)
            .json(&RefreshRequest {
                refresh: refresh.as_str(),
            })
            .send()
            .await?;

        let response = Self::ensure_success(response, "token exchange").await?;
        let body = response.json::<RefreshResponse>().await?;
        Ok(body.access)
    }

    /// Fetch the profile the access credential belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure or timeout, or
    /// [`Error::Api`] if the endpoint rejects the access token.
    pub async fn fetch_profile(&self, access: &AccessToken) -> Result<UserProfile, Error> {
        let response = self
            .http
            .get(self.config.endpoint(&self.config.me_path))
            .timeout(self.config.timeout)
            .bearer_auth(access.as_str())
            .send()
            .await?;

        let response = Self::ensure_success(response, "profile fetch").await?;
        response.json::<UserProfile>().await.map_err(Into::into)
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        Err(Error::Api {
            operation,
            status,
            detail,
        })
    }
}
