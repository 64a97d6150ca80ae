//! Refresh-cookie session middleware for Axum.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sessionkit::middleware::{SessionConfig, SessionState, edge_gate, session_routes};
//!
//! // 1. Configure from environment
//! let state = SessionState::new(SessionConfig::from_env()?);
//!
//! // 2. Gate pages and mount the session routes
//! let app = axum::Router::new()
//!     .route("/dashboard", get(dashboard))
//!     .layer(axum::middleware::from_fn_with_state(state.edge_gate(), edge_gate))
//!     .merge(session_routes(state.clone()));
//!
//! // 3. Hydrate pages with `ResolvedSession` or `resolve_session()`
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod gate;
mod routes;
mod sign_out;
mod state;

pub use config::SessionConfig;
pub use error::AuthError;
pub use extractor::{ResolvedSession, resolve_session};
pub use gate::{EdgeGate, GateConfig, GateDecision, GateRequest, decide, edge_gate};
pub use routes::session_routes;
pub use sign_out::{SignOut, sign_out};
pub use state::SessionState;

/// Re-export cookie jar type used by [`resolve_session`] and [`sign_out`].
pub use axum_extra::extract::CookieJar;
