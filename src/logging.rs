// ABOUTME: Structured logging setup for services embedding the custodia core
// ABOUTME: Configures log level, output format, and subscriber installation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Structured logging configuration with tracing

use std::env;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::constants::service;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
}

/// Log output format options
#[derive(Debug, Clone)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            service_name: service::SERVICE_NAME.into(),
            service_version: service::SERVICE_VERSION.into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        Self {
            level,
            format,
            ..Self::default()
        }
    }

    /// Install the global tracing subscriber
    ///
    /// # Errors
    /// Returns an error if a subscriber is already installed.
    pub fn init(&self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.level)
            .or_else(|_| EnvFilter::try_new("info"))
            .map_err(|e| anyhow::anyhow!("failed to build log filter: {e}"))?;

        let registry = tracing_subscriber::registry().with(filter);

        match self.format {
            LogFormat::Json => {
                let layer = tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .json();
                registry.with(layer).try_init()?;
            }
            LogFormat::Pretty => {
                let layer = tracing_subscriber::fmt::layer().with_target(true);
                registry.with(layer).try_init()?;
            }
            LogFormat::Compact => {
                let layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false);
                registry.with(layer).try_init()?;
            }
        }

        info!(
            service = %self.service_name,
            version = %self.service_version,
            level = %self.level,
            "logging initialized"
        );

        Ok(())
    }
}

/// Initialize logging from the environment with the default configuration
///
/// # Errors
/// Returns an error if a subscriber is already installed.
pub fn init_logging() -> Result<()> {
    LoggingConfig::from_env().init()
}
