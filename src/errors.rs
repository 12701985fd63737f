// ABOUTME: Unified error handling for the custodia core
// ABOUTME: Defines error codes, the AppError type, and HTTP response formatting
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Unified Error Handling
//!
//! Every failure the core can surface maps to a machine-checkable
//! [`ErrorCode`] plus a human-readable message. Storage failures always
//! reach the caller as a distinguishable value; logging is layered on top
//! of the error, never a replacement for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed caller input (empty bulk batch, bad placeholder, weak password)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Application-level uniqueness violation (duplicate username)
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists,
    /// Bad credentials or an invalid/expired token
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid,
    /// Valid token, insufficient permissions
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied,
    /// Token payload shape violates the permissions-list contract
    #[serde(rename = "AUTH_MALFORMED")]
    AuthMalformed,
    /// Statement execution failure at the transactional boundary
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    /// Configuration error
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
    /// Anything else that should never happen
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput | Self::AuthMalformed => 400,
            Self::AuthInvalid => 401,
            Self::PermissionDenied => 403,
            Self::ResourceAlreadyExists => 409,
            Self::DatabaseError | Self::ConfigError | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::AuthMalformed => "The authentication token payload is malformed",
            Self::DatabaseError => "Database operation failed",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal error occurred",
        }
    }
}

/// Unified error type for the crate
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Malformed caller input
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Duplicate resource at the application level
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Bad credentials or invalid/expired token
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Valid token, missing permissions
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Token claims violate the expected shape
    pub fn malformed_claims(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthMalformed, message)
    }

    /// Statement execution failure; always paired with a rollback
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration problem
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal invariant violation
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Wire-format error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error body
    pub error: ErrorResponseDetails,
}

/// Error body carried by [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-checkable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
            },
        }
    }
}
