//! Identity resolution through the HTTP stack.

use axum::http::{Method, StatusCode};
use serde_json::json;

use storekeep_integration_tests::{Auth, TestApp};

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .send(Method::GET, "/api/v1/store/list", None, &Auth::None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], "error");
}

#[tokio::test]
async fn test_unauthorized_wins_over_bad_input() {
    let app = TestApp::new();

    let response = app
        .send(
            Method::PATCH,
            "/api/v1/store/update/not-a-uuid",
            Some(json!({ "name": "" })),
            &Auth::None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_identity() {
    let app = TestApp::new();
    let m1 = app.login(1).await;

    let store_id = app.create_store(&m1, "Joe's Diner", "Breakfast").await;
    let response = app
        .send(
            Method::GET,
            &format!("/api/v1/store/view/{store_id}"),
            None,
            &m1,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["store"]["merchant_id"], 1);
}

#[tokio::test]
async fn test_logout_clears_session_identity() {
    let app = TestApp::new();
    let m1 = app.login(1).await;
    app.create_store(&m1, "Joe's Diner", "Breakfast").await;

    app.logout(&m1).await;

    let response = app.send(Method::GET, "/api/v1/store/list", None, &m1).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_bearer_token_identity() {
    let app = TestApp::new();
    let token = app.bearer(5);

    let store_id = app.create_store(&token, "Kiosk", "Snacks").await;
    let response = app
        .send(
            Method::GET,
            &format!("/api/v1/store/view/{store_id}"),
            None,
            &token,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["store"]["merchant_id"], 5);
}

#[tokio::test]
async fn test_session_and_token_see_same_merchant() {
    let app = TestApp::new();
    let cookie = app.login(9).await;
    let token = app.bearer(9);

    let store_id = app.create_store(&cookie, "Shared", "Both ways").await;
    let response = app
        .send(
            Method::DELETE,
            &format!("/api/v1/store/remove/{store_id}"),
            None,
            &token,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_bad_tokens_are_unauthorized() {
    let app = TestApp::new();

    for auth in [
        Auth::Bearer("v1.1.9999999999.deadbeef".to_string()),
        Auth::Bearer("garbage".to_string()),
        app.expired_bearer(1),
    ] {
        let response = app
            .send(Method::GET, "/api/v1/store/list", None, &auth)
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{auth:?}");
    }
}

#[tokio::test]
async fn test_unknown_session_cookie_is_unauthorized() {
    let app = TestApp::new();
    let forged = Auth::Cookie("storekeep_session=AAAAAAAAAAAAAAAAAAAAAA".to_string());

    let response = app
        .send(Method::GET, "/api/v1/store/list", None, &forged)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
