// ABOUTME: Authorization core flows over the credential store and token codec
// ABOUTME: Register, login, external identity login, and permission-gated authorize
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Account Flows
//!
//! The authorization core. Composes the credential store, the password
//! hasher, and the token codec into the register / login / external
//! identity flows, and fronts protected operations with the all-of
//! permission gate.
//!
//! External identity verification (provider signature, audience) is an
//! upstream collaborator's job; this service consumes already-verified
//! claims.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use crate::auth::{Claims, TokenManager};
use crate::config::AuthConfig;
use crate::constants::grants::DEFAULT_GRANTS;
use crate::errors::{AppError, AppResult};
use crate::models::{Credential, ExternalIdentity, IssuedToken};
use crate::passwords::{hash_password_blocking, verify_password_blocking};
use crate::store::CredentialStore;

/// Account registration and session issuance service
pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenManager,
    session_ttl: Duration,
}

impl AccountService {
    /// Compose the service from its collaborators
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenManager, config: &AuthConfig) -> Self {
        Self {
            store,
            tokens,
            session_ttl: Duration::minutes(config.session_ttl_minutes),
        }
    }

    /// Register a local account and issue its first session token.
    ///
    /// New accounts receive the default grant set.
    ///
    /// # Errors
    /// `InvalidInput` on empty credentials, `ResourceAlreadyExists` when
    /// the username is taken, storage errors from the store.
    pub async fn register(&self, username: &str, password: &str) -> AppResult<IssuedToken> {
        info!(username, "registration attempt");

        if username.is_empty() {
            return Err(AppError::validation("username must not be empty"));
        }
        if password.is_empty() {
            return Err(AppError::validation("password must not be empty"));
        }

        if self.store.find_by_username(username).await?.is_some() {
            return Err(AppError::conflict(format!(
                "username {username} is already registered"
            )));
        }

        let password_hash = hash_password_blocking(password.to_owned()).await?;
        let credential = Credential::new(username, password_hash);
        let stored = self.store.insert(&credential).await?;

        info!(username = %stored.username, id = ?stored.id, "account registered");
        self.issue_session(&stored.username)
    }

    /// Authenticate a local account and issue a session token.
    ///
    /// # Errors
    /// `AuthInvalid` when the username is unknown or the password does not
    /// verify; the two cases are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<IssuedToken> {
        info!(username, "login attempt");

        let Some(credential) = self.store.find_by_username(username).await? else {
            return Err(AppError::unauthenticated("invalid username or password"));
        };

        let verified =
            verify_password_blocking(password.to_owned(), credential.password_hash.clone()).await?;
        if !verified {
            info!(username, "password verification failed");
            return Err(AppError::unauthenticated("invalid username or password"));
        }

        self.store.touch_last_login(username).await?;

        info!(username, "login succeeded");
        self.issue_session(&credential.username)
    }

    /// Issue a session for an externally-verified identity, provisioning a
    /// placeholder local record on first sight.
    ///
    /// The verified email is the username. The placeholder's password hash
    /// derives from the provider's stable subject id and is not intended
    /// for local login.
    ///
    /// # Errors
    /// Storage errors from the store; hashing failures.
    pub async fn external_identity_login(
        &self,
        identity: &ExternalIdentity,
    ) -> AppResult<IssuedToken> {
        info!(email = %identity.email, "external identity login");

        let existing = self.store.find_by_username(&identity.email).await?;
        let credential = match existing {
            Some(credential) => credential,
            None => {
                let placeholder_hash =
                    hash_password_blocking(identity.external_id.clone()).await?;
                let credential = Credential::new(&identity.email, placeholder_hash)
                    .with_external_id(&identity.external_id);
                let stored = self.store.insert(&credential).await?;
                info!(
                    email = %identity.email,
                    name = %identity.name,
                    "provisioned placeholder account for external identity"
                );
                stored
            }
        };

        self.issue_session(&credential.username)
    }

    /// Gate a protected operation: verify the token and require every
    /// listed permission.
    ///
    /// # Errors
    /// `AuthInvalid` for a bad or expired token, `AuthMalformed` for a
    /// non-list permissions claim, `PermissionDenied` when any required
    /// permission is absent.
    pub fn authorize(&self, token: &str, required_permissions: &[i64]) -> AppResult<Claims> {
        self.tokens.verify(token, Some(required_permissions))
    }

    fn issue_session(&self, subject: &str) -> AppResult<IssuedToken> {
        let access_token =
            self.tokens
                .issue_access_token(subject, &DEFAULT_GRANTS, Some(self.session_ttl))?;
        Ok(IssuedToken::bearer(
            access_token,
            Utc::now() + self.session_ttl,
        ))
    }
}
