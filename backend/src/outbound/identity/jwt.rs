//! HS256 bearer tokens carrying a caller's id and role.
//!
//! Expiry and not-before are checked against the injected clock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{IdentityError, IdentityResolver};
use crate::domain::{Caller, Role, UserId};

/// Issuer stamped into and required from every token.
pub const TOKEN_ISSUER: &str = "crop_connect";

/// Shortest signing secret accepted.
pub const MIN_SECRET_BYTES: usize = 32;

/// Failures building or signing tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The configured secret is too short to sign with.
    #[error("token secret must be at least {minimum} bytes")]
    SecretTooShort { minimum: usize },
    /// The configured lifetime is zero or negative.
    #[error("token lifetime must be positive")]
    NonPositiveLifetime,
    /// The signer rejected the claims.
    #[error("failed to sign token: {message}")]
    Signing { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    iss: String,
    uid: UserId,
    role: Role,
    iat: i64,
    nbf: i64,
    exp: i64,
}

/// Identity resolver verifying HS256 tokens signed with a shared secret.
pub struct JwtIdentityResolver {
    secret: Zeroizing<Vec<u8>>,
    lifetime: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JwtIdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityResolver")
            .field("secret", &"<redacted>")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl JwtIdentityResolver {
    /// Build a resolver signing with `secret` and issuing tokens valid for
    /// `lifetime`.
    pub fn new(
        secret: impl Into<Vec<u8>>,
        lifetime: TimeDelta,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        Self::with_secret(Zeroizing::new(secret.into()), lifetime, clock)
    }

    /// Build a resolver from a secret that is already held in zeroizing
    /// storage.
    pub fn with_secret(
        key: Zeroizing<Vec<u8>>,
        lifetime: TimeDelta,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        if key.len() < MIN_SECRET_BYTES {
            return Err(TokenError::SecretTooShort {
                minimum: MIN_SECRET_BYTES,
            });
        }
        if lifetime <= TimeDelta::zero() {
            return Err(TokenError::NonPositiveLifetime);
        }
        Ok(Self {
            secret: key,
            lifetime,
            clock,
        })
    }

    /// Sign a token identifying `caller`.
    pub fn issue(&self, caller: Caller) -> Result<String, TokenError> {
        let now = self.clock.utc().timestamp();
        let claims = Claims {
            iss: TOKEN_ISSUER.to_owned(),
            uid: caller.id,
            role: caller.role,
            iat: now,
            nbf: now,
            exp: now.saturating_add(self.lifetime.num_seconds()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|err| TokenError::Signing {
            message: err.to_string(),
        })
    }

    fn verify(&self, token: &str) -> Result<Claims, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["iss", "exp", "nbf"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;

        decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature => IdentityError::invalid("signature mismatch"),
                ErrorKind::InvalidIssuer => IdentityError::invalid("unexpected issuer"),
                ErrorKind::MissingRequiredClaim(claim) => {
                    IdentityError::invalid(format!("missing claim `{claim}`"))
                }
                _ => IdentityError::invalid("malformed token"),
            })
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, credential: &str) -> Result<Caller, IdentityError> {
        let trimmed = credential.trim();
        let token = trimmed.strip_prefix("Bearer").unwrap_or(trimmed).trim();
        if token.is_empty() {
            return Err(IdentityError::missing());
        }

        let claims = self.verify(token)?;
        let now = self.clock.utc().timestamp();
        if now < claims.nbf {
            return Err(IdentityError::invalid("token is not yet valid"));
        }
        if now >= claims.exp {
            debug!(user_id = %claims.uid, "rejected expired token");
            return Err(IdentityError::expired());
        }
        Ok(Caller::new(claims.uid, claims.role))
    }
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod tests;
