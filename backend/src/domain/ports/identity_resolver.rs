//! Port resolving an inbound credential into a caller.

use async_trait::async_trait;

use crate::domain::Caller;

use super::define_port_error;

define_port_error! {
    /// Reasons a credential does not identify a caller.
    pub enum IdentityError {
        /// No credential was presented.
        Missing => "credential is missing",
        /// The credential is malformed or its signature does not verify.
        Invalid { message: String } => "credential is invalid: {message}",
        /// The credential was valid once but has expired.
        Expired => "credential has expired",
    }
}

/// Port for authenticating callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve `credential` (optionally `Bearer `-prefixed) into a caller.
    async fn resolve(&self, credential: &str) -> Result<Caller, IdentityError>;
}
