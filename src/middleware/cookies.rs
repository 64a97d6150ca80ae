use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::types::RefreshToken;

/// Value of the access-signal marker. Only its presence matters.
const ACCESS_SIGNAL_VALUE: &str = "1";

/// Read the refresh credential from the request cookies.
pub(super) fn get_refresh_token(jar: &CookieJar, name: &str) -> Option<RefreshToken> {
    jar.get(name)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
        .map(RefreshToken::new)
}

/// Create removal cookie for the refresh credential.
///
/// Path must match the one the backend set, or the browser keeps the cookie.
pub(super) fn clear_refresh_cookie(name: &str, path: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path(path.to_string())
        .http_only(true)
        .max_age(Duration::ZERO)
        .build()
}

/// Create the client-inspectable access-signal marker.
///
/// Not `HttpOnly`: client script and the edge gate both read it.
pub(super) fn access_signal_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), ACCESS_SIGNAL_VALUE))
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .build()
}

/// Create removal cookie for the access-signal marker.
pub(super) fn clear_access_signal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

pub(super) fn has_access_signal(jar: &CookieJar, name: &str) -> bool {
    jar.get(name).is_some_and(|c| !c.value().is_empty())
}
