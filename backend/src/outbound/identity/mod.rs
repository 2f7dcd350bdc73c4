//! Identity resolver adapters.

mod jwt;

pub use jwt::{JwtIdentityResolver, MIN_SECRET_BYTES, TOKEN_ISSUER, TokenError};
