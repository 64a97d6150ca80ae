#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} failed with status {status}: {detail}")]
    Api {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("session must carry both an access token and a user, or neither")]
    PartialSession,
}

impl Error {
    /// Timeouts and connection failures; everything else is a definite answer.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "client")]
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            #[cfg(feature = "client")]
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
