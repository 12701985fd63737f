// ABOUTME: Credential persistence seam and its PostgreSQL implementation
// ABOUTME: Repository built on the statement builders and transactional executor
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Credential Store
//!
//! The authorization flows depend on this trait, not on PostgreSQL; the
//! production implementation routes every operation through the statement
//! builders and the transactional executor.

use async_trait::async_trait;
use tracing::warn;

use crate::database::{Database, RowSet};
use crate::entity::Entity;
use crate::errors::{AppError, AppResult};
use crate::models::Credential;
use crate::statements::{build_insert, build_select_entity, Filter, Op, Statement};
use crate::value::{Params, Payload, Value};

/// Persistence operations the authorization flows require
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a credential record by its unique username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Credential>>;

    /// Persist a new credential record, returning it with storage-assigned
    /// columns populated
    async fn insert(&self, credential: &Credential) -> AppResult<Credential>;

    /// Record a successful login
    async fn touch_last_login(&self, username: &str) -> AppResult<()>;

    /// Total number of stored credential records
    async fn count(&self) -> AppResult<i64>;
}

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    db: Database,
}

impl PgCredentialStore {
    /// Wrap an executor
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the schema and table this store owns.
    ///
    /// # Errors
    /// Returns a storage error if any setup statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.db
            .execute(&Statement::bare(
                "CREATE SCHEMA IF NOT EXISTS accounts",
            ))
            .await?;

        self.db
            .execute(&Statement::bare(
                r"
                CREATE TABLE IF NOT EXISTS accounts.credential (
                    id BIGSERIAL PRIMARY KEY,
                    username TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    external_id TEXT,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    last_login_at TIMESTAMPTZ,
                    exist BOOLEAN NOT NULL DEFAULT TRUE
                )
                ",
            ))
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Credential>> {
        let statement = build_select_entity::<Credential>(
            &[],
            &Filter::field("username", Op::Eq, username),
            "",
            0,
            0,
        );

        match self.db.fetch(&statement).await? {
            RowSet::Empty => Ok(None),
            RowSet::One(record) => Credential::from_record(record).map(Some),
            RowSet::Many(records) => {
                // username is unique; more than one row is a storage anomaly
                warn!(username, rows = records.len(), "duplicate credential rows");
                records
                    .into_iter()
                    .next()
                    .map(Credential::from_record)
                    .transpose()
            }
        }
    }

    async fn insert(&self, credential: &Credential) -> AppResult<Credential> {
        let statement = build_insert(credential, &["*"])?;
        let row = self
            .db
            .fetch(&statement)
            .await?
            .into_one()
            .ok_or_else(|| AppError::storage("insert returned no row"))?;
        Credential::from_record(row)
    }

    async fn touch_last_login(&self, username: &str) -> AppResult<()> {
        let mut params = Payload::new();
        params.insert("username", Value::from(username));
        let statement = Statement {
            text: format!(
                "UPDATE {} SET last_login_at = NOW() WHERE username = %(username)s",
                Credential::table_fullname()
            ),
            params: Params::Row(params),
        };
        self.db.execute(&statement).await?;
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let statement = build_select_entity::<Credential>(
            &["COUNT(*) AS count"],
            &Filter::none(),
            "",
            0,
            0,
        );
        let row = self
            .db
            .fetch(&statement)
            .await?
            .into_one()
            .ok_or_else(|| AppError::storage("count returned no row"))?;

        row.get("count")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| AppError::storage("count column has unexpected shape"))
    }
}
