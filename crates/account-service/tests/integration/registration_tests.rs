//! End-to-end registration tests: real router, real normalizer, fake
//! collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use account_test_utils::{AssetFixture, TestAccountServer};
use serde_json::{json, Value};

async fn post_register(server: &TestAccountServer, body: Value) -> reqwest::Response {
    server
        .client()
        .post(format!("{}/api/v1/users/register", server.url()))
        .json(&body)
        .send()
        .await
        .expect("request should reach the test server")
}

#[tokio::test]
async fn test_register_returns_201_and_sanitized_user() {
    let server = TestAccountServer::spawn().await.expect("server");
    let fixture = AssetFixture::new();
    let avatar = fixture.file("avatar.png", b"avatar bytes");

    let response = post_register(
        &server,
        json!({
            "displayName": "Alice",
            "email": "a@x.com",
            "username": "alice",
            "password": "secret1",
            "avatarPath": avatar,
        }),
    )
    .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("json body");

    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "a@x.com");
    assert!(body["data"]["avatarUrl"]
        .as_str()
        .is_some_and(|url| !url.is_empty()));
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("refreshToken").is_none());

    assert_eq!(server.assets.uploaded_ids().len(), 1);
    assert_eq!(server.store.user_count(), 1);
}

#[tokio::test]
async fn test_register_duplicate_username_is_409() {
    let server = TestAccountServer::spawn().await.expect("server");
    let fixture = AssetFixture::new();

    let first = fixture.file("first.png", b"bytes");
    let response = post_register(
        &server,
        json!({
            "displayName": "Alice",
            "email": "a@x.com",
            "username": "alice",
            "password": "secret1",
            "avatarPath": first,
        }),
    )
    .await;
    assert_eq!(response.status(), 201);

    let again = fixture.file("again.png", b"bytes");
    let response = post_register(
        &server,
        json!({
            "displayName": "Alice Again",
            "email": "again@x.com",
            "username": "alice",
            "password": "secret1",
            "avatarPath": again,
        }),
    )
    .await;

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["statusCode"], 409);
    assert_eq!(body["message"], "User with the email or username already exists");

    // The losing attempt performed no uploads and no deletes.
    assert_eq!(server.assets.uploaded_ids().len(), 1);
    assert!(server.assets.deleted_ids().is_empty());
}

#[tokio::test]
async fn test_register_missing_fields_is_400_with_details() {
    let server = TestAccountServer::spawn().await.expect("server");

    let response = post_register(
        &server,
        json!({
            "displayName": "Alice",
            "email": "a@x.com",
        }),
    )
    .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["message"], "All fields are required");
    let details = body["errors"].as_array().expect("errors array");
    assert!(details.contains(&json!("username")));
    assert!(details.contains(&json!("password")));
}

#[tokio::test]
async fn test_register_missing_avatar_is_400() {
    let server = TestAccountServer::spawn().await.expect("server");

    let response = post_register(
        &server,
        json!({
            "displayName": "Alice",
            "email": "a@x.com",
            "username": "alice",
            "password": "secret1",
        }),
    )
    .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["message"], "Avatar image is missing");
    assert!(server.assets.uploaded_ids().is_empty());
}

#[tokio::test]
async fn test_register_cover_failure_compensates_avatar() {
    let server = TestAccountServer::spawn().await.expect("server");
    let fixture = AssetFixture::new();

    let avatar = fixture.file("avatar.png", b"bytes");
    let cover = fixture.file("cover.png", b"bytes");
    server.assets.fail_uploads_containing("cover");

    let response = post_register(
        &server,
        json!({
            "displayName": "Alice",
            "email": "a@x.com",
            "username": "alice",
            "password": "secret1",
            "avatarPath": avatar,
            "coverPath": cover,
        }),
    )
    .await;

    assert_eq!(response.status(), 500);
    let uploaded = server.assets.uploaded_ids();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(server.assets.deleted_ids(), uploaded);
    assert_eq!(server.store.user_count(), 0);
}

#[tokio::test]
async fn test_internal_error_envelope_has_no_stack_by_default() {
    let server = TestAccountServer::spawn().await.expect("server");
    let fixture = AssetFixture::new();

    let avatar = fixture.file("avatar.png", b"bytes");
    server.assets.fail_uploads_containing("avatar");

    let response = post_register(
        &server,
        json!({
            "displayName": "Alice",
            "email": "a@x.com",
            "username": "alice",
            "password": "secret1",
            "avatarPath": avatar,
        }),
    )
    .await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["statusCode"], 500);
    assert!(body.get("stack").is_none());
}
