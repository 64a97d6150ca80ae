use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::CookieJar;

use super::cookies;
use super::state::SessionState;
use crate::types::Session;

/// Session resolved from the refresh cookie for the current request.
///
/// Never rejects: a missing or invalid refresh cookie yields the empty
/// session. Return the extractor (or its jar) from the handler so the cookie
/// edits reach the browser.
///
/// # Example
///
/// ```rust,ignore
/// async fn page(resolved: ResolvedSession) -> impl IntoResponse {
///     let (jar, session) = resolved.into_parts();
///     let greeting = match session.user() {
///         Some(user) => format!("Hello, {}", user.name),
///         None => "Hello, guest".to_string(),
///     };
///     (jar, greeting)
/// }
/// ```
#[derive(Debug)]
pub struct ResolvedSession {
    pub session: Session,
    jar: CookieJar,
}

impl ResolvedSession {
    #[must_use]
    pub fn into_parts(self) -> (CookieJar, Session) {
        (self.jar, self.session)
    }
}

impl<S> FromRequestParts<S> for ResolvedSession
where
    SessionState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = SessionState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let (jar, session) = resolve_session(&state, jar).await;
        Ok(Self { session, jar })
    }
}

impl IntoResponseParts for ResolvedSession {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.jar.into_response_parts(res)
    }
}

/// Resolve the request's refresh cookie into a session.
///
/// Returns the jar with the cookie edits the outcome requires: the access
/// signal is set on success; on failure the refresh cookie and the signal
/// are deleted. Nothing is written until the caller returns the jar, so an
/// abandoned request leaves cookies untouched.
pub async fn resolve_session(state: &SessionState, jar: CookieJar) -> (CookieJar, Session) {
    let settings = &state.settings;
    let refresh = cookies::get_refresh_token(&jar, &settings.refresh_cookie_name);
    let resolved = state.resolver.resolve(refresh.as_ref()).await;

    let jar = if resolved.clear_refresh {
        jar.add(cookies::clear_refresh_cookie(
            &settings.refresh_cookie_name,
            &settings.refresh_cookie_path,
        ))
        .add(cookies::clear_access_signal_cookie(
            &settings.access_signal_cookie_name,
        ))
    } else if resolved.session.is_authenticated() {
        jar.add(cookies::access_signal_cookie(
            &settings.access_signal_cookie_name,
            settings.secure_cookies,
        ))
    } else if cookies::has_access_signal(&jar, &settings.access_signal_cookie_name) {
        // Stale marker without a refresh cookie.
        jar.add(cookies::clear_access_signal_cookie(
            &settings.access_signal_cookie_name,
        ))
    } else {
        jar
    };

    (jar, resolved.session)
}
