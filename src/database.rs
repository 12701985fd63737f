// ABOUTME: Transactional statement executor over a bounded PostgreSQL pool
// ABOUTME: Commit-on-success, rollback-on-failure, tri-state row results
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Transactional Executor
//!
//! Runs built statements against PostgreSQL. Each call checks one
//! connection out of a bounded pool, opens a transaction, runs the
//! statement, and commits before returning; any failure rolls the
//! transaction back, is logged, and surfaces to the caller as a
//! [`ErrorCode::DatabaseError`](crate::errors::ErrorCode::DatabaseError)
//! value. Callers can always distinguish "no rows matched" from "the
//! statement failed".
//!
//! Statement text arrives in the `%(name)s` named-placeholder dialect and
//! is translated to the driver's positional parameters at execution time;
//! the dialect itself is part of the builder's wire contract and never
//! changes shape here.
//!
//! Dropping an in-flight call aborts its transaction; the checked-out
//! connection is returned to the pool either way.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column as _, PgPool, Postgres, Row as _, TypeInfo as _};
use tracing::error;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, AppResult};
use crate::statements::Statement;
use crate::value::{Params, Payload, Value};

/// A fetched row as an ordered field-name to value mapping
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Tri-state result shape of a fetching execution.
///
/// Callers must branch on the shape: no rows, exactly one row, or an
/// ordered list of rows.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSet {
    /// Zero rows matched
    Empty,
    /// Exactly one row
    One(Record),
    /// More than one row, in result order
    Many(Vec<Record>),
}

impl RowSet {
    fn from_records(mut records: Vec<Record>) -> Self {
        match records.len() {
            0 => Self::Empty,
            1 => Self::One(records.remove(0)),
            _ => Self::Many(records),
        }
    }

    /// Number of rows carried
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Many(records) => records.len(),
        }
    }

    /// True when zero rows matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The single row, or the first of many
    #[must_use]
    pub fn into_one(self) -> Option<Record> {
        match self {
            Self::Empty => None,
            Self::One(record) => Some(record),
            Self::Many(mut records) => {
                if records.is_empty() {
                    None
                } else {
                    Some(records.remove(0))
                }
            }
        }
    }

    /// All rows as a vector
    #[must_use]
    pub fn into_vec(self) -> Vec<Record> {
        match self {
            Self::Empty => Vec::new(),
            Self::One(record) => vec![record],
            Self::Many(records) => records,
        }
    }
}

#[allow(clippy::expect_used)] // Safe: pattern is a compile-time literal
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"%\(([A-Za-z_][A-Za-z0-9_]*)\)s").expect("placeholder pattern is valid")
    })
}

/// Translate `%(name)s` placeholders to `$n` positional parameters.
///
/// First occurrence assigns the ordinal; repeated names reuse it. A
/// placeholder with no payload key is a validation error raised before any
/// transaction work.
fn expand_named_placeholders(text: &str, payload: &Payload) -> AppResult<(String, Vec<Value>)> {
    let mut order: Vec<String> = Vec::new();
    let mut missing: Option<String> = None;

    let expanded = placeholder_re().replace_all(text, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        if payload.get(name).is_none() && missing.is_none() {
            missing = Some(name.to_owned());
        }
        let ordinal = order.iter().position(|n| n == name).unwrap_or_else(|| {
            order.push(name.to_owned());
            order.len() - 1
        });
        format!("${}", ordinal + 1)
    });

    if let Some(name) = missing {
        return Err(AppError::validation(format!(
            "statement references parameter `{name}` missing from payload"
        )));
    }

    let values = order
        .iter()
        .map(|name| payload.get(name).cloned().unwrap_or(Value::Null))
        .collect();

    Ok((expanded.into_owned(), values))
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: Value,
) -> AppResult<Query<'q, Postgres, PgArguments>> {
    Ok(match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(b),
        Value::Int(n) => query.bind(n),
        Value::Float(f) => query.bind(f),
        Value::Text(s) => query.bind(s),
        Value::Uuid(u) => query.bind(u),
        Value::Timestamp(t) => query.bind(t),
        Value::Json(v) => query.bind(v),
        Value::Structured(_) => {
            return Err(AppError::storage(
                "structured parameter bound without JSON wrapping; \
                 use the JSON-params execution variants",
            ))
        }
    })
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> AppResult<serde_json::Value> {
    use serde_json::Value as Json;

    let de = |e: sqlx::Error| AppError::storage("failed to decode result column").with_source(e);

    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx).map_err(de)?.map(Json::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)
            .map_err(de)?
            .map(|n| Json::from(i64::from(n))),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)
            .map_err(de)?
            .map(|n| Json::from(i64::from(n))),
        "INT8" => row.try_get::<Option<i64>, _>(idx).map_err(de)?.map(Json::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)
            .map_err(de)?
            .and_then(|f| serde_json::Number::from_f64(f64::from(f)))
            .map(Json::Number),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(idx)
            .map_err(de)?
            .and_then(serde_json::Number::from_f64)
            .map(Json::Number),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(idx)
            .map_err(de)?
            .map(|u| Json::String(u.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
            .map_err(de)?
            .map(|t| Json::String(t.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .map_err(de)?
            .map(|t| Json::String(t.to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .map_err(de)?
            .map(|d| Json::String(d.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Json>, _>(idx).map_err(de)?,
        // TEXT, VARCHAR, CHAR, NAME, and anything else that decodes as text
        _ => row.try_get::<Option<String>, _>(idx).map_err(de)?.map(Json::String),
    };

    Ok(value.unwrap_or(Json::Null))
}

fn decode_row(row: &PgRow) -> AppResult<Record> {
    let mut record = Record::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())?;
        record.insert(column.name().to_owned(), value);
    }
    Ok(record)
}

fn row_payload(params: &Params) -> AppResult<&Payload> {
    static EMPTY: OnceLock<Payload> = OnceLock::new();
    match params {
        Params::None => Ok(EMPTY.get_or_init(Payload::new)),
        Params::Row(payload) => Ok(payload),
        Params::Batch(_) => Err(AppError::validation(
            "batch parameters require the batch execution variants",
        )),
    }
}

/// Transactional statement executor over a bounded connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect a bounded pool from configuration.
    ///
    /// One connection is checked out per executor call; concurrent callers
    /// are serialized by the pool, never by this type.
    ///
    /// # Errors
    /// Returns a storage error if the pool cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url())
            .await
            .map_err(|e| AppError::storage("failed to connect to database").with_source(e))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run a non-fetching statement; returns the affected row count.
    ///
    /// # Errors
    /// Returns a storage error after rolling the transaction back if
    /// execution fails; a validation error if the statement's parameters
    /// do not satisfy its placeholders.
    pub async fn execute(&self, statement: &Statement) -> AppResult<u64> {
        let payload = row_payload(&statement.params)?;
        let (text, values) = expand_named_placeholders(&statement.text, payload)?;

        let mut tx = self.begin().await?;
        let mut query = sqlx::query(&text);
        for value in values {
            query = match bind_value(query, value) {
                Ok(q) => q,
                Err(e) => return Self::rolled_back(tx, e).await,
            };
        }

        let affected = match query.execute(&mut *tx).await {
            Ok(result) => result.rows_affected(),
            Err(e) => {
                return Self::rolled_back(
                    tx,
                    AppError::storage("statement execution failed").with_source(e),
                )
                .await
            }
        };

        self.commit(tx).await?;
        Ok(affected)
    }

    /// Run a fetching statement and normalize the rows into a [`RowSet`].
    ///
    /// # Errors
    /// Same failure contract as [`Database::execute`].
    pub async fn fetch(&self, statement: &Statement) -> AppResult<RowSet> {
        let payload = row_payload(&statement.params)?;
        let (text, values) = expand_named_placeholders(&statement.text, payload)?;

        let mut tx = self.begin().await?;
        let mut query = sqlx::query(&text);
        for value in values {
            query = match bind_value(query, value) {
                Ok(q) => q,
                Err(e) => return Self::rolled_back(tx, e).await,
            };
        }

        let rows = match query.fetch_all(&mut *tx).await {
            Ok(rows) => rows,
            Err(e) => {
                return Self::rolled_back(
                    tx,
                    AppError::storage("statement execution failed").with_source(e),
                )
                .await
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match decode_row(row) {
                Ok(record) => records.push(record),
                Err(e) => return Self::rolled_back(tx, e).await,
            }
        }

        self.commit(tx).await?;
        Ok(RowSet::from_records(records))
    }

    /// [`Database::execute`] with the JSON-wrapping parameter walk applied
    /// first, so structured values bind as JSONB.
    ///
    /// # Errors
    /// Same failure contract as [`Database::execute`].
    pub async fn execute_with_json_params(&self, statement: Statement) -> AppResult<u64> {
        let statement = Statement {
            text: statement.text,
            params: statement.params.into_json_wrapped(),
        };
        self.execute(&statement).await
    }

    /// [`Database::fetch`] with the JSON-wrapping parameter walk applied
    /// first.
    ///
    /// # Errors
    /// Same failure contract as [`Database::execute`].
    pub async fn fetch_with_json_params(&self, statement: Statement) -> AppResult<RowSet> {
        let statement = Statement {
            text: statement.text,
            params: statement.params.into_json_wrapped(),
        };
        self.fetch(&statement).await
    }

    /// Apply a batch statement once per payload inside a single
    /// transaction; returns the total affected row count.
    ///
    /// # Errors
    /// Rolls the whole batch back and returns a storage error if any
    /// payload fails.
    pub async fn execute_batch_insert(&self, statement: &Statement) -> AppResult<u64> {
        self.execute_batch(statement).await
    }

    /// Batch counterpart for built UPDATE statements; identical execution
    /// discipline to [`Database::execute_batch_insert`].
    ///
    /// # Errors
    /// Rolls the whole batch back and returns a storage error if any
    /// payload fails.
    pub async fn execute_batch_update(&self, statement: &Statement) -> AppResult<u64> {
        self.execute_batch(statement).await
    }

    async fn execute_batch(&self, statement: &Statement) -> AppResult<u64> {
        let Params::Batch(batch) = &statement.params else {
            return Err(AppError::validation(
                "batch execution requires batch parameters",
            ));
        };

        let mut tx = self.begin().await?;
        let mut affected = 0u64;

        for payload in batch {
            let (text, values) = match expand_named_placeholders(&statement.text, payload) {
                Ok(expanded) => expanded,
                Err(e) => return Self::rolled_back(tx, e).await,
            };

            let mut query = sqlx::query(&text);
            for value in values {
                query = match bind_value(query, value) {
                    Ok(q) => q,
                    Err(e) => return Self::rolled_back(tx, e).await,
                };
            }

            match query.execute(&mut *tx).await {
                Ok(result) => affected += result.rows_affected(),
                Err(e) => {
                    return Self::rolled_back(
                        tx,
                        AppError::storage("batch statement execution failed").with_source(e),
                    )
                    .await
                }
            }
        }

        self.commit(tx).await?;
        Ok(affected)
    }

    async fn begin(&self) -> AppResult<sqlx::Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::storage("failed to begin transaction").with_source(e))
    }

    async fn commit(&self, tx: sqlx::Transaction<'static, Postgres>) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::storage("failed to commit transaction").with_source(e))
    }

    /// Roll back explicitly, log, and hand the failure to the caller.
    async fn rolled_back<T>(
        tx: sqlx::Transaction<'static, Postgres>,
        error: AppError,
    ) -> AppResult<T> {
        if let Err(rollback_err) = tx.rollback().await {
            error!(error = %rollback_err, "transaction rollback failed");
        }
        error!(error = %error, "statement failed; transaction rolled back");
        Err(error)
    }
}
