// ABOUTME: System-wide constants for the custodia core
// ABOUTME: Grant sets, token lifetimes, claim keys, and SQL conventions
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Constants Module
//!
//! Deployment-policy constants shared by the authorization flows and the
//! data access layer.

/// Permission grants
pub mod grants {
    /// Permission set issued to every newly registered or externally
    /// provisioned account. Deployment policy, not a role system; flows
    /// must reference this constant rather than inline the literal.
    pub const DEFAULT_GRANTS: [i64; 3] = [1, 2, 4];
}

/// Token lifetimes and claim keys
pub mod tokens {
    /// Default TTL applied when the caller does not supply one
    pub const DEFAULT_TTL_MINUTES: i64 = 15;

    /// Lifetime of session tokens issued by the account flows
    pub const SESSION_TTL_MINUTES: i64 = 60;

    /// Subject claim key
    pub const CLAIM_SUB: &str = "sub";

    /// Permission-list claim key
    pub const CLAIM_PERMISSIONS: &str = "permissions";

    /// Expiration claim key
    pub const CLAIM_EXP: &str = "exp";

    /// Token type reported alongside issued access tokens
    pub const TOKEN_TYPE_BEARER: &str = "bearer";
}

/// SQL dialect conventions
pub mod sql {
    /// Flag column toggled by soft deletes. Every soft-deletable table is
    /// assumed to carry it.
    pub const SOFT_DELETE_COLUMN: &str = "exist";
}

/// Service identity for logging
pub mod service {
    /// Service name reported in structured logs
    pub const SERVICE_NAME: &str = "custodia";

    /// Crate version from Cargo.toml
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}
