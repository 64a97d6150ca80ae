//! HTTP client wrapper that enforces the session on every call.
//!
//! A `401 Unauthorized` from any endpoint is the single signal that the
//! access credential is no longer valid: the [`CredentialStore`] is cleared
//! and the error is still returned to the caller.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::backend::ApiConfig;
use crate::error::Error;
use crate::store::CredentialStore;

/// Authenticated API client bound to a [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    store: CredentialStore,
}

impl ApiClient {
    /// Build a client for `config.base_url()` that forwards cookies and the
    /// store's bearer credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig, store: CredentialStore) -> Result<Self, Error> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: config.base_url().as_str().trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            store,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request against the base endpoint.
    ///
    /// The bearer header reflects the session at the time of the call.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut request = self.http.request(method, url).timeout(self.timeout);

        if let Some(token) = self.store.session().access_token() {
            request = request.bearer_auth(token.as_str());
        }

        request
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    /// Send `request`, returning successful responses unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] on `401`, after the store has been cleared.
    /// - [`Error::Api`] on any other non-success status; the store is untouched.
    /// - [`Error::Http`] on network failure or timeout.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("API call returned 401, clearing session");
            self.store.clear();
            return Err(Error::Unauthorized(detail));
        }

        Err(Error::Api {
            operation: "api request",
            status: status.as_u16(),
            detail,
        })
    }

    /// [`send`](Self::send) and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send), plus [`Error::Http`] if decoding fails.
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(Into::into)
    }
}
