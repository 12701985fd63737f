// ABOUTME: Bearer token codec with permission-list validation
// ABOUTME: HS256 issue/verify over a deployment-held shared secret
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Token Codec
//!
//! Issues and verifies compact signed tokens carrying a subject, an
//! ordered permission list, and an expiration claim. Authenticity is
//! entirely signature-plus-expiry; there is no server-side revocation
//! list. The permission check is all-of: every required permission must be
//! present in the token's list.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::config::AuthConfig;
use crate::constants::tokens::{CLAIM_EXP, CLAIM_PERMISSIONS, CLAIM_SUB};
use crate::errors::{AppError, AppResult};

/// Decoded token claims as an open mapping
pub type Claims = serde_json::Map<String, serde_json::Value>;

/// Signs and verifies bearer tokens with a fixed algorithm and a shared
/// per-deployment secret
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenManager {
    /// Build a codec from the deployment's auth configuration
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            default_ttl: Duration::minutes(config.default_ttl_minutes),
        }
    }

    /// Sign a claims mapping, adding `exp = now + ttl`.
    ///
    /// Falls back to the configured default TTL when the caller supplies
    /// none. Claims are immutable once signed.
    ///
    /// # Errors
    /// Returns an internal error if encoding fails.
    pub fn issue(&self, mut claims: Claims, ttl: Option<Duration>) -> AppResult<String> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = Utc::now() + ttl;
        claims.insert(
            CLAIM_EXP.to_owned(),
            serde_json::Value::from(expires_at.timestamp()),
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal("token encoding failed").with_source(e))
    }

    /// Issue a standard access token: subject plus permission list.
    ///
    /// # Errors
    /// Returns an internal error if encoding fails.
    pub fn issue_access_token(
        &self,
        subject: &str,
        permissions: &[i64],
        ttl: Option<Duration>,
    ) -> AppResult<String> {
        let mut claims = Claims::new();
        claims.insert(CLAIM_SUB.to_owned(), serde_json::Value::from(subject));
        claims.insert(
            CLAIM_PERMISSIONS.to_owned(),
            serde_json::Value::from(permissions.to_vec()),
        );
        self.issue(claims, ttl)
    }

    /// Verify a token and optionally gate on required permissions.
    ///
    /// Signature or expiry failure is `Unauthenticated`. When
    /// `required_permissions` is supplied, a present-but-non-list
    /// `permissions` claim is `MalformedClaims` and any missing required
    /// permission is `Forbidden`. Returns the full claims mapping.
    ///
    /// # Errors
    /// As described above.
    pub fn verify(
        &self,
        token: &str,
        required_permissions: Option<&[i64]>,
    ) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<serde_json::Value>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                debug!(error = %e, "token verification failed");
                AppError::unauthenticated("token is invalid or expired").with_source(e)
            })?;

        let serde_json::Value::Object(claims) = data.claims else {
            return Err(AppError::malformed_claims("token payload is not a mapping"));
        };

        if let Some(required) = required_permissions {
            check_permissions(&claims, required)?;
        }

        Ok(claims)
    }
}

/// All-of permission check against the token's `permissions` claim.
///
/// A missing claim is an empty grant list; a present claim that is not a
/// list violates the claims contract.
fn check_permissions(claims: &Claims, required: &[i64]) -> AppResult<()> {
    if required.is_empty() {
        return Ok(());
    }

    let granted: Vec<i64> = match claims.get(CLAIM_PERMISSIONS) {
        None => Vec::new(),
        Some(serde_json::Value::Array(items)) => {
            items.iter().filter_map(serde_json::Value::as_i64).collect()
        }
        Some(_) => {
            return Err(AppError::malformed_claims(
                "permissions claim is not a list",
            ))
        }
    };

    for permission in required {
        if !granted.contains(permission) {
            return Err(AppError::forbidden(format!(
                "missing required permission {permission}"
            )));
        }
    }

    Ok(())
}
