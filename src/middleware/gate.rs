//! Edge gate: redirect decisions made before any route content is served.
//!
//! [`decide`] is pure; [`edge_gate`] is the Axum boundary that reads the
//! access-signal cookie and performs the redirect. The signal is a presence
//! marker only. Backend services still authorize every API call.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use super::cookies;

/// Static route classes for the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct GateConfig {
    protected_prefixes: Vec<String>,
    login_path: String,
    landing_path: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: vec!["/dashboard".into()],
            login_path: "/login".into(),
            landing_path: "/dashboard".into(),
        }
    }
}

impl GateConfig {
    /// Replace the protected prefixes (default: `["/dashboard"]`).
    #[must_use]
    pub fn with_protected_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.protected_prefixes = prefixes;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// `/dashboard` covers `/dashboard` and `/dashboard/...`, not `/dashboards`.
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            if prefix.is_empty() {
                return true;
            }
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    #[must_use]
    pub fn is_login(&self, path: &str) -> bool {
        path.trim_end_matches('/') == self.login_path.trim_end_matches('/')
    }
}

/// Request facts the gate decides on.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub has_access_signal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(String),
}

/// Decide whether a request passes or is redirected.
///
/// The login path is never gated as protected, even when a catch-all prefix
/// such as `/` covers it.
#[must_use]
pub fn decide(request: &GateRequest<'_>, config: &GateConfig) -> GateDecision {
    if config.is_login(request.path) {
        return if request.has_access_signal {
            GateDecision::Redirect(config.landing_path.clone())
        } else {
            GateDecision::Pass
        };
    }
    if !request.has_access_signal && config.is_protected(request.path) {
        return GateDecision::Redirect(config.login_path.clone());
    }
    GateDecision::Pass
}

/// State for [`edge_gate`].
#[derive(Debug, Clone)]
pub struct EdgeGate {
    config: Arc<GateConfig>,
    signal_cookie: Arc<str>,
}

impl EdgeGate {
    /// Gate reading the access signal from the `accessToken` cookie.
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        Self::with_signal_cookie(config, "accessToken")
    }

    #[must_use]
    pub fn with_signal_cookie(config: GateConfig, cookie_name: &str) -> Self {
        Self {
            config: Arc::new(config),
            signal_cookie: Arc::from(cookie_name),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

/// Axum middleware applying [`decide`] before the inner service runs.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/dashboard", get(dashboard))
///     .layer(axum::middleware::from_fn_with_state(EdgeGate::new(GateConfig::default()), edge_gate));
/// ```
pub async fn edge_gate(State(gate): State<EdgeGate>, req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let decision = decide(
        &GateRequest {
            path: req.uri().path(),
            has_access_signal: cookies::has_access_signal(&jar, &gate.signal_cookie),
        },
        &gate.config,
    );

    match decision {
        GateDecision::Pass => next.run(req).await,
        GateDecision::Redirect(to) => {
            tracing::debug!(path = %req.uri().path(), to = %to, "Edge gate redirect");
            Redirect::temporary(&to).into_response()
        }
    }
}
