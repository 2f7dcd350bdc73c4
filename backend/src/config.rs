//! Workflow configuration loaded via OrthoConfig.

use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::DEFAULT_FILL_SKEW_HOURS;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_MEDIA_CALL_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MEDIA_BASE_URL: &str = "https://media.invalid/crop-connect/";

/// Configuration values shared by the workflow services and adapters.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CROP_CONNECT")]
pub struct WorkflowSettings {
    /// Secret signing bearer tokens.
    pub jwt_secret: Option<String>,
    /// Lifetime of issued tokens, in hours.
    #[ortho_config(default = 24)]
    pub token_ttl_hours: i64,
    /// How far ahead of its date a treatment record may be filled, in hours.
    #[ortho_config(default = 7)]
    pub treatment_fill_skew_hours: i64,
    /// Upper bound on a single media store call, in seconds.
    #[ortho_config(default = 20)]
    pub media_call_timeout_secs: u64,
    /// Base URL media objects are published under.
    pub media_base_url: Option<String>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            treatment_fill_skew_hours: DEFAULT_FILL_SKEW_HOURS,
            media_call_timeout_secs: DEFAULT_MEDIA_CALL_TIMEOUT_SECS,
            media_base_url: None,
        }
    }
}

impl WorkflowSettings {
    /// Return the token secret, if one is configured.
    pub fn jwt_secret(&self) -> Option<Zeroizing<Vec<u8>>> {
        self.jwt_secret
            .as_deref()
            .map(|secret| Zeroizing::new(secret.as_bytes().to_vec()))
    }

    /// Return the token lifetime.
    pub fn token_ttl(&self) -> TimeDelta {
        TimeDelta::hours(self.token_ttl_hours)
    }

    /// Return the treatment fill window.
    pub fn treatment_fill_skew(&self) -> TimeDelta {
        TimeDelta::hours(self.treatment_fill_skew_hours)
    }

    /// Return the media call bound.
    pub fn media_call_timeout(&self) -> Duration {
        Duration::from_secs(self.media_call_timeout_secs)
    }

    /// Return the media base URL, falling back to a placeholder host.
    pub fn media_base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.media_base_url
                .as_deref()
                .unwrap_or(DEFAULT_MEDIA_BASE_URL),
        )
    }
}
