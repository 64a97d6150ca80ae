use axum::http::HeaderValue;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use serde::{Deserialize, Serialize};

use super::cookies;
use super::error::AuthError;
use super::state::SessionState;

/// Result body of a sign-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOut {
    pub success: bool,
}

/// Delete the refresh credential and the access-signal marker.
///
/// Idempotent: removal cookies are emitted whether or not the request
/// carried the cookies. The in-memory [`CredentialStore`](crate::CredentialStore)
/// is not touched; clear it alongside this call for immediate UI consistency.
///
/// # Errors
///
/// Returns [`AuthError::Storage`] if a removal cookie cannot be encoded as a
/// `Set-Cookie` header (e.g. a misconfigured cookie name).
pub fn sign_out(jar: CookieJar, state: &SessionState) -> Result<(CookieJar, SignOut), AuthError> {
    let settings = &state.settings;
    let refresh = cookies::clear_refresh_cookie(
        &settings.refresh_cookie_name,
        &settings.refresh_cookie_path,
    );
    let signal = cookies::clear_access_signal_cookie(&settings.access_signal_cookie_name);

    ensure_encodable(&refresh)?;
    ensure_encodable(&signal)?;

    tracing::info!("Session signed out");
    Ok((jar.add(refresh).add(signal), SignOut { success: true }))
}

fn ensure_encodable(cookie: &Cookie<'_>) -> Result<(), AuthError> {
    HeaderValue::from_str(&cookie.to_string())
        .map(drop)
        .map_err(|e| AuthError::Storage(format!("cookie {:?}: {e}", cookie.name())))
}
