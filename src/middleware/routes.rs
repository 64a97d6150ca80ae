use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum_extra::extract::CookieJar;

use super::error::AuthError;
use super::extractor::resolve_session;
use super::sign_out::{SignOut, sign_out};
use super::state::SessionState;
use crate::types::Session;

/// Create the session router.
///
/// - `GET {auth_path}/session`: resolve the refresh cookie and return the
///   session JSON used to hydrate the client's credential store.
/// - `GET|POST {auth_path}/logout`: delete the refresh cookie.
pub fn session_routes(state: SessionState) -> Router {
    let auth_path = state.settings.auth_path.trim_end_matches('/').to_string();

    Router::new()
        .route(&format!("{auth_path}/session"), get(session))
        .route(&format!("{auth_path}/logout"), get(logout).post(logout))
        .with_state(state)
}

// ── Session ────────────────────────────────────────────────────────

async fn session(State(state): State<SessionState>, jar: CookieJar) -> (CookieJar, Json<Session>) {
    let (jar, session) = resolve_session(&state, jar).await;
    (jar, Json(session))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(
    State(state): State<SessionState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SignOut>), AuthError> {
    let (jar, result) = sign_out(jar, &state)?;
    Ok((jar, Json(result)))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::backend::{ApiConfig, TokenClient};
    use crate::middleware::SessionConfig;

    fn state_for(server: &MockServer) -> SessionState {
        SessionState::new(
            SessionConfig::new(TokenClient::new(ApiConfig::new(
                server.uri().parse().unwrap(),
            )))
            .with_secure_cookies(false),
        )
    }

    fn set_cookies(response: &Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn session_route_hydrates_and_sets_signal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "A1" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/me/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "name": "Ada" })),
            )
            .mount(&server)
            .await;

        let response = session_routes(state_for(&server))
            .oneshot(get_with_cookie("/api/auth/session", "refresh_token=validtok"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("accessToken=1")));
        assert!(!cookies.iter().any(|c| c.starts_with("refresh_token=")));

        let body = json_body(response).await;
        assert_eq!(body["accessToken"], "A1");
        assert_eq!(body["user"]["id"], 7);
    }

    #[tokio::test]
    async fn session_route_clears_cookies_on_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token/refresh/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let response = session_routes(state_for(&server))
            .oneshot(get_with_cookie(
                "/api/auth/session",
                "refresh_token=expiredtok; accessToken=1",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(
            cookies
                .iter()
                .any(|c| c.starts_with("refresh_token=;") && c.contains("Max-Age=0"))
        );
        assert!(cookies.iter().any(|c| c.starts_with("accessToken=;")));

        let body = json_body(response).await;
        assert_eq!(body, json!({ "accessToken": null, "user": null }));
    }

    #[tokio::test]
    async fn session_route_without_cookie_is_quiet() {
        let server = MockServer::start().await;

        let response = session_routes(state_for(&server))
            .oneshot(Request::get("/api/auth/session").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(set_cookies(&response).is_empty());
        assert_eq!(
            json_body(response).await,
            json!({ "accessToken": null, "user": null })
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let server = MockServer::start().await;
        let app = session_routes(state_for(&server));

        for request in [
            Request::post("/api/auth/logout")
                .header(header::COOKIE, "refresh_token=validtok")
                .body(Body::empty())
                .unwrap(),
            Request::post("/api/auth/logout").body(Body::empty()).unwrap(),
        ] {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(
                set_cookies(&response)
                    .iter()
                    .any(|c| c.starts_with("refresh_token=;") && c.contains("Max-Age=0"))
            );
            assert_eq!(json_body(response).await, json!({ "success": true }));
        }
    }

    #[tokio::test]
    async fn logout_with_unencodable_cookie_name_fails() {
        let server = MockServer::start().await;
        let state = SessionState::new(
            SessionConfig::new(TokenClient::new(ApiConfig::new(
                server.uri().parse().unwrap(),
            )))
            .with_refresh_cookie_name("bad\nname"),
        );

        let response = session_routes(state)
            .oneshot(Request::post("/api/auth/logout").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
