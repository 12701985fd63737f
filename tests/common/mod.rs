// ABOUTME: Shared test helpers for integration tests
// ABOUTME: In-memory credential store and service construction
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)] // not every test binary uses every helper

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use custodia::accounts::AccountService;
use custodia::auth::TokenManager;
use custodia::config::AuthConfig;
use custodia::errors::AppResult;
use custodia::models::Credential;
use custodia::store::CredentialStore;

/// In-memory credential store for exercising the flows without PostgreSQL
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<Credential>>,
    next_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, username: &str) -> Option<Credential> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.username == username)
            .cloned()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Credential>> {
        Ok(self.get(username))
    }

    async fn insert(&self, credential: &Credential) -> AppResult<Credential> {
        let mut stored = credential.clone();
        stored.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst));
        if stored.created_at.is_none() {
            stored.created_at = Some(Utc::now());
        }
        self.rows.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn touch_last_login(&self, _username: &str) -> AppResult<()> {
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.row_count() as i64)
    }
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        secret_key: "integration-test-secret".into(),
        default_ttl_minutes: 15,
        session_ttl_minutes: 60,
    }
}

pub fn test_token_manager() -> TokenManager {
    TokenManager::new(&test_auth_config())
}

pub fn test_service(store: Arc<InMemoryStore>) -> AccountService {
    let config = test_auth_config();
    AccountService::new(store, TokenManager::new(&config), &config)
}
