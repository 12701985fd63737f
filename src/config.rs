// ABOUTME: Environment-derived configuration for the custodia core
// ABOUTME: Database connection parameters, signing secret, and pool sizing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Configuration
//!
//! Configuration is read from the environment exactly once at process start
//! and passed by reference into the constructors that need it. Core logic
//! performs no ambient environment lookups.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::constants::tokens;

/// Database connection and pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Database name
    pub name: String,
    /// Upper bound on pooled connections; one is checked out per request
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before failing the call
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Load database configuration from the environment
    ///
    /// # Errors
    /// Returns an error if a numeric variable is present but unparseable.
    pub fn from_env() -> Result<Self> {
        let port = match env::var("DB_PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DB_PORT is not a valid port: {raw}"))?,
            Err(_) => 5432,
        };

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {raw}"))?,
            Err(_) => 5,
        };

        Ok(Self {
            host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".into()),
            port,
            user: env::var("DB_USER").unwrap_or_else(|_| "postgres".into()),
            password: env::var("DB_PASSWORD").unwrap_or_default(),
            name: env::var("DB_NAME").unwrap_or_else(|_| "custodia".into()),
            max_connections,
            acquire_timeout_secs: 30,
        })
    }

    /// Connection URL for the PostgreSQL driver
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

/// Token signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for HS256 token signing; fixed per deployment
    pub secret_key: String,
    /// Default token TTL in minutes when a caller supplies none
    pub default_ttl_minutes: i64,
    /// Lifetime of session tokens issued by the account flows
    pub session_ttl_minutes: i64,
}

impl AuthConfig {
    /// Load auth configuration from the environment
    ///
    /// # Errors
    /// Returns an error if `SECRET_KEY` is missing or empty. There is no
    /// usable fallback for a signing secret.
    pub fn from_env() -> Result<Self> {
        let secret_key =
            env::var("SECRET_KEY").context("SECRET_KEY must be set for token signing")?;
        if secret_key.is_empty() {
            anyhow::bail!("SECRET_KEY must not be empty");
        }

        let default_ttl_minutes = match env::var("TOKEN_TTL_MINUTES") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("TOKEN_TTL_MINUTES is not a number: {raw}"))?,
            Err(_) => tokens::DEFAULT_TTL_MINUTES,
        };

        Ok(Self {
            secret_key,
            default_ttl_minutes,
            session_ttl_minutes: tokens::SESSION_TTL_MINUTES,
        })
    }
}

/// Top-level configuration constructed once at process start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Database connection parameters
    pub database: DatabaseConfig,
    /// Token signing parameters
    pub auth: AuthConfig,
}

impl ServiceConfig {
    /// Load the full service configuration from the environment
    ///
    /// # Errors
    /// Returns an error if any section fails to load.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
        })
    }
}
