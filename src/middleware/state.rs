use std::sync::Arc;

use super::config::{SessionConfig, SessionSettings};
use super::gate::EdgeGate;
use crate::resolve::SessionResolver;

/// Shared state for the session routes, extractor and gate.
///
/// Expose it from your own state with `FromRef` to use
/// [`ResolvedSession`](super::ResolvedSession) in your handlers.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub(super) resolver: Arc<SessionResolver>,
    pub(super) settings: Arc<SessionSettings>,
}

impl SessionState {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            resolver: Arc::new(SessionResolver::new(config.client)),
            settings: Arc::new(config.settings),
        }
    }

    /// Edge gate reading the same access-signal cookie these routes write.
    #[must_use]
    pub fn edge_gate(&self) -> EdgeGate {
        EdgeGate::with_signal_cookie(
            self.settings.gate.clone(),
            &self.settings.access_signal_cookie_name,
        )
    }

    #[must_use]
    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }
}
