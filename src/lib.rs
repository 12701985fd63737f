// ABOUTME: Main library entry point for the custodia credential core
// ABOUTME: Credential issuance, permission gating, and generic SQL data access
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![deny(unsafe_code)]

//! # Custodia
//!
//! The shared credential-issuance and data-access core of the platform's
//! backend services. Two halves:
//!
//! - **Data access layer**: entity descriptors, pure statement builders
//!   emitting `%(name)s`-parameterized SQL, and a transactional executor
//!   over a bounded PostgreSQL pool with commit-on-success /
//!   rollback-on-failure discipline and tri-state row results.
//! - **Authorization core**: bcrypt credential hashing (argon2 legacy
//!   verify), an HS256 bearer-token codec carrying a permission list, and
//!   the register / login / external-identity flows gating protected
//!   operations on an all-of permission check.
//!
//! HTTP routing, the OAuth redirect dance, and process bootstrap live in
//! the services embedding this crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use custodia::accounts::AccountService;
//! use custodia::auth::TokenManager;
//! use custodia::config::ServiceConfig;
//! use custodia::database::Database;
//! use custodia::store::PgCredentialStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::from_env()?;
//!     let db = Database::connect(&config.database).await?;
//!
//!     let store = PgCredentialStore::new(db);
//!     store.migrate().await?;
//!
//!     let tokens = TokenManager::new(&config.auth);
//!     let accounts = AccountService::new(Arc::new(store), tokens, &config.auth);
//!
//!     let issued = accounts.register("alice", "correct horse battery").await?;
//!     let claims = accounts.authorize(&issued.access_token, &[1, 4])?;
//!     println!("authorized subject: {:?}", claims.get("sub"));
//!     Ok(())
//! }
//! ```

/// Authorization core flows: register, login, external identity, authorize
pub mod accounts;

/// Bearer token codec with permission-list validation
pub mod auth;

/// Environment-derived configuration
pub mod config;

/// Deployment-policy constants
pub mod constants;

/// Transactional statement executor and row results
pub mod database;

/// Entity descriptors and table naming
pub mod entity;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Persisted and wire-facing data models
pub mod models;

/// Password hashing and verification
pub mod passwords;

/// Pure SQL statement builders
pub mod statements;

/// Credential persistence seam and PostgreSQL implementation
pub mod store;

/// Statement parameter values and payloads
pub mod value;

pub use accounts::AccountService;
pub use auth::{Claims, TokenManager};
pub use config::{AuthConfig, DatabaseConfig, ServiceConfig};
pub use database::{Database, Record, RowSet};
pub use entity::Entity;
pub use errors::{AppError, AppResult, ErrorCode};
pub use models::{Credential, ExternalIdentity, IssuedToken};
pub use statements::{Filter, Op, Statement};
pub use store::{CredentialStore, PgCredentialStore};
pub use value::{Params, Payload, Value};
