//! Tracing subscriber installation.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a JSON formatter filtered by `RUST_LOG`.
///
/// A subscriber that is already installed is left in place.
pub fn init_tracing() {
    if let Err(error) = fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        warn!(%error, "tracing subscriber already installed");
    }
}
