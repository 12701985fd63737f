// ABOUTME: Integration tests for the authorization core flows
// ABOUTME: Register, login, external identity provisioning, and the permission gate
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use common::{test_service, InMemoryStore};
use custodia::errors::ErrorCode;
use custodia::models::ExternalIdentity;

fn google_identity() -> ExternalIdentity {
    ExternalIdentity {
        email: "bob@x.com".into(),
        name: "Bob".into(),
        external_id: "g-123".into(),
    }
}

#[tokio::test]
async fn test_register_issues_default_grant_token() {
    let store = Arc::new(InMemoryStore::new());
    let service = test_service(Arc::clone(&store));

    let issued = service.register("alice", "secret").await.unwrap();
    assert_eq!(issued.token_type, "bearer");

    let claims = service.authorize(&issued.access_token, &[]).unwrap();
    assert_eq!(claims.get("sub"), Some(&serde_json::Value::from("alice")));
    assert_eq!(
        claims.get("permissions"),
        Some(&serde_json::Value::from(vec![1, 2, 4]))
    );

    // the record was persisted with a hash, never the plaintext
    let stored = store.get("alice").unwrap();
    assert_ne!(stored.password_hash, "secret");
    assert!(stored.id.is_some());
}

#[tokio::test]
async fn test_duplicate_register_conflicts() {
    let store = Arc::new(InMemoryStore::new());
    let service = test_service(Arc::clone(&store));

    service.register("alice", "secret").await.unwrap();
    let err = service.register("alice", "secret").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
    assert_eq!(store.row_count(), 1);
}

#[tokio::test]
async fn test_login_round_trip() {
    let store = Arc::new(InMemoryStore::new());
    let service = test_service(Arc::clone(&store));

    service.register("alice", "secret").await.unwrap();
    let issued = service.login("alice", "secret").await.unwrap();
    let claims = service.authorize(&issued.access_token, &[1, 2, 4]).unwrap();
    assert_eq!(claims.get("sub"), Some(&serde_json::Value::from("alice")));
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthenticated() {
    let store = Arc::new(InMemoryStore::new());
    let service = test_service(Arc::clone(&store));

    service.register("alice", "secret").await.unwrap();
    let err = service.login("alice", "wrong").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);
}

#[tokio::test]
async fn test_login_unknown_user_is_unauthenticated() {
    let store = Arc::new(InMemoryStore::new());
    let service = test_service(store);

    let err = service.login("nobody", "secret").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);
}

#[tokio::test]
async fn test_external_identity_provisions_placeholder() {
    let store = Arc::new(InMemoryStore::new());
    let service = test_service(Arc::clone(&store));

    let issued = service
        .external_identity_login(&google_identity())
        .await
        .unwrap();

    let claims = service.authorize(&issued.access_token, &[]).unwrap();
    assert_eq!(
        claims.get("sub"),
        Some(&serde_json::Value::from("bob@x.com"))
    );

    let stored = store.get("bob@x.com").unwrap();
    assert_eq!(stored.external_id.as_deref(), Some("g-123"));
    assert_ne!(stored.password_hash, "g-123");
}

#[tokio::test]
async fn test_external_identity_reuses_existing_record() {
    let store = Arc::new(InMemoryStore::new());
    let service = test_service(Arc::clone(&store));

    service
        .external_identity_login(&google_identity())
        .await
        .unwrap();
    service
        .external_identity_login(&google_identity())
        .await
        .unwrap();

    assert_eq!(store.row_count(), 1);
}

#[tokio::test]
async fn test_authorize_enforces_all_of() {
    let store = Arc::new(InMemoryStore::new());
    let service = test_service(store);

    let issued = service.register("alice", "secret").await.unwrap();

    // default grants are [1, 2, 4]
    assert!(service.authorize(&issued.access_token, &[1, 4]).is_ok());

    let err = service
        .authorize(&issued.access_token, &[1, 8])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let err = service.authorize("garbage.token.here", &[1]).unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);
}

#[tokio::test]
async fn test_register_rejects_empty_credentials() {
    let store = Arc::new(InMemoryStore::new());
    let service = test_service(store);

    let err = service.register("", "secret").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = service.register("alice", "").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}
