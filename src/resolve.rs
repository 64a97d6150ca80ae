//! Refresh-cookie → session resolution.
//!
//! Internally every attempt ends in a [`Resolution`] that says why it failed.
//! [`SessionResolver::resolve`] collapses that into the fail-closed public
//! contract: a valid [`Session`] (possibly empty) plus whether the refresh
//! credential must be discarded. The resolver never touches cookies itself,
//! so an abandoned attempt leaves no trace.

use std::future::Future;
use std::time::Duration;

use crate::backend::TokenClient;
use crate::error::Error;
use crate::types::{Authenticated, RefreshToken, Session};

/// Why a resolution attempt did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolveFailure {
    /// No refresh credential was presented. The normal signed-out path.
    Unauthenticated,
    /// The backend answered with a non-success status.
    Rejected { operation: &'static str, status: u16 },
    /// Timeout or connection failure, after retries were exhausted.
    Transient { operation: &'static str, detail: String },
    /// The backend answered but the body was unusable.
    Malformed { operation: &'static str, detail: String },
}

impl ResolveFailure {
    fn from_error(operation: &'static str, error: Error) -> Self {
        if error.is_transient() {
            return Self::Transient {
                operation,
                detail: error.to_string(),
            };
        }
        match error {
            Error::Api { status, .. } => Self::Rejected { operation, status },
            other => Self::Malformed {
                operation,
                detail: other.to_string(),
            },
        }
    }

    /// Whether the refresh cookie must be deleted as a result.
    #[must_use]
    pub fn invalidates_refresh(&self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}

pub type Resolution = Result<Authenticated, ResolveFailure>;

/// Public outcome of a resolution.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Resolved {
    pub session: Session,
    /// The caller must delete the refresh cookie.
    pub clear_refresh: bool,
}

/// Exchanges a refresh credential for an access credential and profile.
#[derive(Debug, Clone)]
pub struct SessionResolver {
    client: TokenClient,
    transient_retries: u32,
    retry_backoff: Duration,
}

impl SessionResolver {
    #[must_use]
    pub fn new(client: TokenClient) -> Self {
        let transient_retries = client.config().transient_retries;
        let retry_backoff = client.config().retry_backoff;
        Self {
            client,
            transient_retries,
            retry_backoff,
        }
    }

    #[must_use]
    pub fn client(&self) -> &TokenClient {
        &self.client
    }

    /// Resolve with failure causes preserved.
    pub async fn try_resolve(&self, refresh: Option<&RefreshToken>) -> Resolution {
        let Some(refresh) = refresh else {
            return Err(ResolveFailure::Unauthenticated);
        };

        let access = self
            .attempt("token exchange", || self.client.exchange_refresh(refresh))
            .await?;
        let user = self
            .attempt("profile fetch", || self.client.fetch_profile(&access))
            .await?;

        Ok(Authenticated::new(access, user))
    }

    /// Resolve to a session. Never fails: any error yields the empty session
    /// and `clear_refresh = true`.
    pub async fn resolve(&self, refresh: Option<&RefreshToken>) -> Resolved {
        match self.try_resolve(refresh).await {
            Ok(auth) => {
                tracing::debug!(user_id = %auth.user.id, "Session resolved");
                Resolved {
                    session: auth.into(),
                    clear_refresh: false,
                }
            }
            Err(failure) => {
                if failure.invalidates_refresh() {
                    tracing::warn!(?failure, "Session resolution failed, discarding refresh token");
                }
                Resolved {
                    session: Session::empty(),
                    clear_refresh: failure.invalidates_refresh(),
                }
            }
        }
    }

    /// Run `call`, retrying only transient failures up to the configured bound.
    async fn attempt<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, ResolveFailure>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.transient_retries => {
                    attempt += 1;
                    tracing::warn!(
                        operation,
                        attempt,
                        max_retries = self.transient_retries,
                        error = %e,
                        "Transient backend failure, retrying"
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(ResolveFailure::from_error(operation, e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::backend::ApiConfig;

    fn resolver_for(server: &MockServer) -> SessionResolver {
        SessionResolver::new(TokenClient::new(
            ApiConfig::new(server.uri().parse().unwrap())
                .with_timeout(Duration::from_millis(200))
                .with_retry_backoff(Duration::from_millis(10)),
        ))
    }

    async fn mount_exchange(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/api/token/refresh/"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    async fn mount_profile(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/api/me/"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn valid_refresh_resolves_full_session() {
        let server = MockServer::start().await;
        mount_exchange(&server, ResponseTemplate::new(200).set_body_json(json!({ "access": "A1" })))
            .await;
        mount_profile(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "name": "Ada" })),
        )
        .await;

        let resolved = resolver_for(&server)
            .resolve(Some(&RefreshToken::new("validtok")))
            .await;

        assert!(!resolved.clear_refresh);
        assert_eq!(resolved.session.access_token().unwrap().as_str(), "A1");
        assert_eq!(resolved.session.user().unwrap().id.0, 7);
    }

    #[tokio::test]
    async fn missing_refresh_makes_no_network_call() {
        let server = MockServer::start().await;
        let resolver = resolver_for(&server);

        assert_eq!(
            resolver.try_resolve(None).await,
            Err(ResolveFailure::Unauthenticated)
        );
        let resolved = resolver.resolve(None).await;

        assert_eq!(resolved.session, Session::empty());
        assert!(!resolved.clear_refresh);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_refresh_clears_cookie_every_time() {
        let server = MockServer::start().await;
        mount_exchange(&server, ResponseTemplate::new(401)).await;
        let resolver = resolver_for(&server);
        let refresh = RefreshToken::new("expiredtok");

        for _ in 0..2 {
            let resolved = resolver.resolve(Some(&refresh)).await;
            assert_eq!(resolved.session, Session::empty());
            assert!(resolved.clear_refresh);
        }
        assert_eq!(
            resolver.try_resolve(Some(&refresh)).await,
            Err(ResolveFailure::Rejected {
                operation: "token exchange",
                status: 401
            })
        );
        // Rejections are never retried.
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn profile_failure_after_exchange_is_full_failure() {
        let server = MockServer::start().await;
        mount_exchange(&server, ResponseTemplate::new(200).set_body_json(json!({ "access": "A1" })))
            .await;
        mount_profile(&server, ResponseTemplate::new(500)).await;

        let resolver = resolver_for(&server);
        let refresh = RefreshToken::new("validtok");

        assert_eq!(
            resolver.try_resolve(Some(&refresh)).await,
            Err(ResolveFailure::Rejected {
                operation: "profile fetch",
                status: 500
            })
        );
        let resolved = resolver.resolve(Some(&refresh)).await;
        assert!(resolved.session.access_token().is_none());
        assert!(resolved.session.user().is_none());
        assert!(resolved.clear_refresh);
    }

    #[tokio::test]
    async fn malformed_exchange_body_is_distinguished() {
        let server = MockServer::start().await;
        mount_exchange(&server, ResponseTemplate::new(200).set_body_json(json!({ "token": "x" })))
            .await;

        let failure = resolver_for(&server)
            .try_resolve(Some(&RefreshToken::new("validtok")))
            .await
            .unwrap_err();

        assert!(matches!(
            failure,
            ResolveFailure::Malformed {
                operation: "token exchange",
                ..
            }
        ));
        assert!(failure.invalidates_refresh());
    }

    #[tokio::test]
    async fn timeout_is_retried_once_then_fails_closed() {
        let server = MockServer::start().await;
        mount_exchange(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "A1" }))
                .set_delay(Duration::from_secs(2)),
        )
        .await;

        let resolver = resolver_for(&server);
        let failure = resolver
            .try_resolve(Some(&RefreshToken::new("validtok")))
            .await
            .unwrap_err();

        assert!(matches!(failure, ResolveFailure::Transient { .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);

        let resolved = resolver.resolve(Some(&RefreshToken::new("validtok"))).await;
        assert_eq!(resolved.session, Session::empty());
        assert!(resolved.clear_refresh);
    }

    #[tokio::test]
    async fn timeout_then_success_resolves_full_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access": "A1" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_exchange(&server, ResponseTemplate::new(200).set_body_json(json!({ "access": "A1" })))
            .await;
        mount_profile(&server, ResponseTemplate::new(200).set_body_json(json!({ "id": 7 }))).await;

        let resolved = resolver_for(&server)
            .resolve(Some(&RefreshToken::new("validtok")))
            .await;

        assert!(!resolved.clear_refresh);
        assert_eq!(resolved.session.access_token().unwrap().as_str(), "A1");
        assert_eq!(resolved.session.user().unwrap().id.0, 7);
        // Two exchange attempts, one profile fetch.
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }
}
