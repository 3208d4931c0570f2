//! End-to-end session tests: login, refresh rotation, logout, password
//! change, all over HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use account_service::repositories::CredentialStore;
use account_test_utils::TestAccountServer;
use serde_json::{json, Value};

async fn seed_alice(server: &TestAccountServer) {
    server
        .store
        .seed_user("alice", "a@x.com", "secret1")
        .await
        .expect("seed user");
}

async fn post_json(server: &TestAccountServer, path: &str, body: Value) -> reqwest::Response {
    server
        .client()
        .post(format!("{}{}", server.url(), path))
        .json(&body)
        .send()
        .await
        .expect("request should reach the test server")
}

fn set_cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|cookie| {
            let rest = cookie.strip_prefix(&prefix)?;
            Some(rest.split(';').next().unwrap_or_default().to_string())
        })
}

fn set_cookie_header<'a>(response: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|cookie| cookie.starts_with(&prefix))
}

#[tokio::test]
async fn test_login_sets_http_only_cookies_and_mirrors_refresh_token() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let response = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "secret1"}),
    )
    .await;

    assert_eq!(response.status(), 200);

    let access_cookie = set_cookie_header(&response, "accessToken").expect("access cookie");
    assert!(access_cookie.contains("HttpOnly"));
    assert!(
        !access_cookie.contains("Secure"),
        "test harness is non-production"
    );
    let refresh_cookie = set_cookie_header(&response, "refreshToken").expect("refresh cookie");
    assert!(refresh_cookie.contains("HttpOnly"));

    let refresh_value = set_cookie_value(&response, "refreshToken").expect("refresh value");
    let body: Value = response.json().await.expect("json body");

    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(body["data"]["user"].get("password").is_none());
    assert_eq!(body["data"]["refreshToken"], refresh_value);

    // The returned refresh token is the one now stored on the record.
    let stored = server
        .store
        .find_by_identity("alice")
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(stored.refresh_token.as_deref(), Some(refresh_value.as_str()));
}

#[tokio::test]
async fn test_login_failure_is_401_and_does_not_reveal_cause() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let wrong_password = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "wrong"}),
    )
    .await;
    assert_eq!(wrong_password.status(), 401);
    let wrong_body: Value = wrong_password.json().await.expect("json body");

    let unknown_user = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "mallory", "password": "secret1"}),
    )
    .await;
    assert_eq!(unknown_user.status(), 401);
    let unknown_body: Value = unknown_user.json().await.expect("json body");

    assert_eq!(wrong_body["message"], unknown_body["message"]);
    let message = wrong_body["message"].as_str().expect("message");
    assert!(!message.contains("alice"));
    assert!(!message.contains("mallory"));
}

#[tokio::test]
async fn test_login_without_password_is_400() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let response = post_json(&server, "/api/v1/users/login", json!({"username": "alice"})).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_refresh_from_cookie_rotates_the_pair() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let login = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "secret1"}),
    )
    .await;
    let first_refresh = set_cookie_value(&login, "refreshToken").expect("refresh cookie");

    let refreshed = server
        .client()
        .post(format!("{}/api/v1/users/refresh-token", server.url()))
        .header(
            reqwest::header::COOKIE,
            format!("refreshToken={}", first_refresh),
        )
        .send()
        .await
        .expect("refresh request");
    assert_eq!(refreshed.status(), 200);

    let second_refresh = set_cookie_value(&refreshed, "refreshToken").expect("rotated cookie");
    assert_ne!(second_refresh, first_refresh);

    // The superseded token is permanently unusable, even though its
    // signature is still valid.
    let reused = server
        .client()
        .post(format!("{}/api/v1/users/refresh-token", server.url()))
        .header(
            reqwest::header::COOKIE,
            format!("refreshToken={}", first_refresh),
        )
        .send()
        .await
        .expect("reuse request");
    assert_eq!(reused.status(), 401);

    // The rotated token works exactly once more.
    let third = post_json(
        &server,
        "/api/v1/users/refresh-token",
        json!({"refreshToken": second_refresh}),
    )
    .await;
    assert_eq!(third.status(), 200);
}

#[tokio::test]
async fn test_refresh_from_body_works() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let login = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "secret1"}),
    )
    .await;
    let body: Value = login.json().await.expect("json body");
    let refresh_token = body["data"]["refreshToken"].as_str().expect("token");

    let response = post_json(
        &server,
        "/api/v1/users/refresh-token",
        json!({"refreshToken": refresh_token}),
    )
    .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_refresh_without_token_is_401() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let response = server
        .client()
        .post(format!("{}/api/v1/users/refresh-token", server.url()))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["message"], "Refresh token is missing");
}

#[tokio::test]
async fn test_logout_clears_session_and_blocks_refresh() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let login = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "secret1"}),
    )
    .await;
    let access = set_cookie_value(&login, "accessToken").expect("access cookie");
    let refresh = set_cookie_value(&login, "refreshToken").expect("refresh cookie");

    let logout = server
        .client()
        .post(format!("{}/api/v1/users/logout", server.url()))
        .header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", access),
        )
        .send()
        .await
        .expect("logout request");
    assert_eq!(logout.status(), 200);

    let cleared = set_cookie_header(&logout, "refreshToken").expect("clearing cookie");
    assert!(cleared.contains("Max-Age=0"));

    let stored = server
        .store
        .find_by_identity("alice")
        .await
        .expect("lookup")
        .expect("user exists");
    assert!(stored.refresh_token.is_none());

    let reused = post_json(
        &server,
        "/api/v1/users/refresh-token",
        json!({"refreshToken": refresh}),
    )
    .await;
    assert_eq!(reused.status(), 401);
}

#[tokio::test]
async fn test_logout_requires_authentication() {
    let server = TestAccountServer::spawn().await.expect("server");

    let response = server
        .client()
        .post(format!("{}/api/v1/users/logout", server.url()))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_logout_accepts_access_token_cookie() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let login = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "secret1"}),
    )
    .await;
    let access = set_cookie_value(&login, "accessToken").expect("access cookie");

    let logout = server
        .client()
        .post(format!("{}/api/v1/users/logout", server.url()))
        .header(reqwest::header::COOKIE, format!("accessToken={}", access))
        .send()
        .await
        .expect("logout request");
    assert_eq!(logout.status(), 200);
}

#[tokio::test]
async fn test_change_password_end_to_end() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let login = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "secret1"}),
    )
    .await;
    let access = set_cookie_value(&login, "accessToken").expect("access cookie");

    let change = server
        .client()
        .post(format!("{}/api/v1/users/change-password", server.url()))
        .header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", access),
        )
        .json(&json!({"oldPassword": "secret1", "newPassword": "secret2"}))
        .send()
        .await
        .expect("change request");
    assert_eq!(change.status(), 200);

    let old_login = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "secret1"}),
    )
    .await;
    assert_eq!(old_login.status(), 401);

    let new_login = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "secret2"}),
    )
    .await;
    assert_eq!(new_login.status(), 200);
}

#[tokio::test]
async fn test_change_password_wrong_old_is_400() {
    let server = TestAccountServer::spawn().await.expect("server");
    seed_alice(&server).await;

    let login = post_json(
        &server,
        "/api/v1/users/login",
        json!({"username": "alice", "password": "secret1"}),
    )
    .await;
    let access = set_cookie_value(&login, "accessToken").expect("access cookie");

    let change = server
        .client()
        .post(format!("{}/api/v1/users/change-password", server.url()))
        .header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", access),
        )
        .json(&json!({"oldPassword": "wrong", "newPassword": "secret2"}))
        .send()
        .await
        .expect("change request");

    assert_eq!(change.status(), 400);
    let body: Value = change.json().await.expect("json body");
    assert_eq!(body["message"], "Old password is incorrect");
}
