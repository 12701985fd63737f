// ABOUTME: Persisted and wire-facing data models for the credential core
// ABOUTME: Credential records, external identity claims, issued token responses
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Data Models
//!
//! The credential record is the only persisted entity this core owns. It
//! lives in the `accounts` schema under the snake-case fallback table name
//! and is created on registration, read on login, and never mutated by the
//! authorization flows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Record;
use crate::entity::Entity;
use crate::errors::{AppError, AppResult};

/// A stored credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Row identifier; absent until persisted
    pub id: Option<i64>,
    /// Unique login name; the verified email for external identities
    pub username: String,
    /// One-way password hash
    pub password_hash: String,
    /// Stable identifier from the external identity provider, when the
    /// account was provisioned through one
    pub external_id: Option<String>,
    /// Creation timestamp, assigned by the database on insert
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Credential {
    const SCHEMA: &'static str = "accounts";
    const NAME: &'static str = "Credential";
}

impl Credential {
    /// New unpersisted credential record. `id` and `created_at` stay
    /// absent so the database assigns them.
    #[must_use]
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            password_hash: password_hash.into(),
            external_id: None,
            created_at: None,
        }
    }

    /// Attach the external provider's stable identifier
    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Parse a fetched row back into a credential record.
    ///
    /// Unknown columns (the soft-delete flag, for one) are ignored.
    ///
    /// # Errors
    /// Returns a storage error if required columns are missing or
    /// mistyped.
    pub fn from_record(record: Record) -> AppResult<Self> {
        serde_json::from_value(serde_json::Value::Object(record))
            .map_err(|e| AppError::storage("credential row has unexpected shape").with_source(e))
    }
}

/// Verified identity claims handed over by the external OIDC collaborator.
///
/// Signature and audience verification against the provider's keys happen
/// upstream; this core consumes the claims as already trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Verified email address; becomes the username
    pub email: String,
    /// Display name as asserted by the provider
    pub name: String,
    /// Stable provider-scoped subject identifier
    pub external_id: String,
}

/// An issued bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Signed compact token string
    pub access_token: String,
    /// Token type for the Authorization header
    pub token_type: String,
    /// Expiry of the embedded `exp` claim
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Bearer token wrapper
    #[must_use]
    pub fn bearer(access_token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type: crate::constants::tokens::TOKEN_TYPE_BEARER.into(),
            expires_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_table_location() {
        assert_eq!(Credential::table_fullname(), "accounts.credential");
    }

    #[test]
    fn test_from_record_ignores_extra_columns() {
        let mut record = Record::new();
        record.insert("id".into(), serde_json::Value::from(7));
        record.insert("username".into(), serde_json::Value::from("alice"));
        record.insert("password_hash".into(), serde_json::Value::from("h"));
        record.insert("external_id".into(), serde_json::Value::Null);
        record.insert("created_at".into(), serde_json::Value::Null);
        record.insert("exist".into(), serde_json::Value::from(true));

        let credential = Credential::from_record(record).unwrap();
        assert_eq!(credential.id, Some(7));
        assert_eq!(credential.username, "alice");
        assert!(credential.external_id.is_none());
    }

    #[test]
    fn test_from_record_rejects_missing_username() {
        let mut record = Record::new();
        record.insert("id".into(), serde_json::Value::from(7));
        assert!(Credential::from_record(record).is_err());
    }
}
