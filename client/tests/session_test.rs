//! Integration tests for session restore, persistence, and logout.

use std::sync::Arc;

use client::models::keys;
use client::{ApiClient, ApiError, MemoryStore, SessionManager, SessionStore};
use mockito::{Matcher, Server};
use serde_json::json;

fn manager_for(server: &Server) -> (SessionManager, Arc<ApiClient>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(ApiClient::new(server.url(), store.clone()));
    let manager = SessionManager::new(client.clone(), store.clone());
    (manager, client, store)
}

#[tokio::test]
async fn restore_arms_client_from_cached_session() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/employees/me")
        .match_header("authorization", "Bearer at-cached")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 7}"#)
        .expect(1)
        .create_async()
        .await;

    let (manager, client, store) = manager_for(&server);
    store.set(keys::ACCESS_TOKEN, "at-cached").await.unwrap();
    store
        .set(keys::USER, r#"{"id":7,"email":"e@acme.test","role":"employee","companyId":3}"#)
        .await
        .unwrap();

    //* When
    let user = manager.restore().await.expect("restore");

    //* Then
    let user = user.expect("session should be restored");
    assert_eq!(user["companyId"], 3);
    assert_eq!(manager.current_user().await.unwrap()["id"], 7);

    // The client is armed with the cached token
    client.get_my_profile().await.expect("authenticated request");
    mock.assert_async().await;
}

#[tokio::test]
async fn restore_without_cached_session_is_a_noop() {
    //* Given
    let server = Server::new_async().await;
    let (manager, _client, _store) = manager_for(&server);

    //* When
    let user = manager.restore().await.expect("restore");

    //* Then
    assert!(user.is_none());
    assert!(manager.current_user().await.is_none());
}

#[tokio::test]
async fn restore_with_corrupt_user_clears_the_session() {
    //* Given
    let server = Server::new_async().await;
    let (manager, _client, store) = manager_for(&server);
    store.set(keys::ACCESS_TOKEN, "at-cached").await.unwrap();
    store.set(keys::REFRESH_TOKEN, "rt-cached").await.unwrap();
    store.set(keys::USER, "{not valid json").await.unwrap();

    //* When
    let user = manager.restore().await.expect("restore");

    //* Then
    assert!(user.is_none());
    assert_eq!(store.get(keys::ACCESS_TOKEN).await.unwrap(), None);
    assert_eq!(store.get(keys::REFRESH_TOKEN).await.unwrap(), None);
    assert_eq!(store.get(keys::USER).await.unwrap(), None);
}

#[tokio::test]
async fn login_persists_the_full_session() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "accessToken": "at-1",
                "refreshToken": "rt-1",
                "user": {"id": 7, "email": "e@acme.test", "role": "admin", "companyId": 3}
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let (manager, _client, store) = manager_for(&server);

    //* When
    let user = manager.login("e@acme.test", "hunter2").await.expect("login");

    //* Then
    assert_eq!(user["role"], "admin");
    assert_eq!(
        store.get(keys::ACCESS_TOKEN).await.unwrap(),
        Some("at-1".to_string())
    );
    assert_eq!(
        store.get(keys::REFRESH_TOKEN).await.unwrap(),
        Some("rt-1".to_string())
    );
    let cached: serde_json::Value =
        serde_json::from_str(&store.get(keys::USER).await.unwrap().unwrap()).unwrap();
    assert_eq!(cached, json!({"id": 7, "email": "e@acme.test", "role": "admin", "companyId": 3}));
}

#[tokio::test]
async fn failed_login_clears_local_state_before_propagating() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "Invalid credentials"}"#)
        .expect(1)
        .create_async()
        .await;

    let (manager, _client, store) = manager_for(&server);
    // Residue from an earlier session
    store.set(keys::ACCESS_TOKEN, "at-old").await.unwrap();
    store.set(keys::USER, r#"{"id":1}"#).await.unwrap();

    //* When
    let err = manager.login("e@acme.test", "wrong").await.unwrap_err();

    //* Then
    match err {
        ApiError::RequestFailed { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
    assert_eq!(store.get(keys::ACCESS_TOKEN).await.unwrap(), None);
    assert_eq!(store.get(keys::USER).await.unwrap(), None);
    assert!(manager.current_user().await.is_none());
}

#[tokio::test]
async fn register_persists_and_arms_like_login() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/register")
        .match_body(Matcher::Json(json!({
            "email": "owner@acme.test",
            "password": "hunter2",
            "companyName": "Acme",
            "industry": "Robotics",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken": "at-1", "refreshToken": "rt-1", "user": {"id": 1, "role": "admin"}}"#)
        .expect(1)
        .create_async()
        .await;

    let profile_mock = server
        .mock("GET", "/employees/me")
        .match_header("authorization", "Bearer at-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1}"#)
        .expect(1)
        .create_async()
        .await;

    let (manager, client, store) = manager_for(&server);

    //* When
    let user = manager
        .register("owner@acme.test", "hunter2", "Acme", Some("Robotics"))
        .await
        .expect("register");

    //* Then
    assert_eq!(user["role"], "admin");
    assert_eq!(
        store.get(keys::REFRESH_TOKEN).await.unwrap(),
        Some("rt-1".to_string())
    );
    client.get_my_profile().await.expect("authenticated request");
    profile_mock.assert_async().await;
}

#[tokio::test]
async fn logout_tears_down_client_and_store() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken": "at-1", "refreshToken": "rt-1", "user": {"id": 7}}"#)
        .create_async()
        .await;

    let bare_mock = server
        .mock("GET", "/employees/me")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let (manager, client, store) = manager_for(&server);
    manager.login("e@acme.test", "hunter2").await.expect("login");

    //* When
    manager.logout().await.expect("logout");

    //* Then
    assert!(manager.current_user().await.is_none());
    assert_eq!(store.get(keys::ACCESS_TOKEN).await.unwrap(), None);
    assert_eq!(store.get(keys::REFRESH_TOKEN).await.unwrap(), None);
    assert_eq!(store.get(keys::USER).await.unwrap(), None);

    // No server-side revocation: logout is purely local, and the next
    // request simply goes out unauthenticated
    client.get_my_profile().await.expect("unauthenticated request");
    bare_mock.assert_async().await;
}
