//! Opaque identifiers for workflow entities.
//!
//! Every identifier wraps a UUID, is immutable once assigned and serialises as
//! its hyphenated string form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raised when an identifier cannot be parsed from caller input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a valid UUID, got `{raw}`")]
pub struct IdParseError {
    kind: &'static str,
    raw: String,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse the hyphenated UUID form.
            pub fn parse(raw: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(raw.trim()).map(Self).map_err(|_| IdParseError {
                    kind: $kind,
                    raw: raw.to_owned(),
                })
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

define_id!(
    /// Any authenticated account: farmer, validator, buyer or admin.
    UserId => "user id"
);
define_id!(
    /// Identifies one version of a commodity; replaced on every edit.
    CommodityId => "commodity id"
);
define_id!(
    /// Stable commodity identity shared by every superseding version.
    CommodityCode => "commodity code"
);
define_id!(
    /// Identifies one version of a planting proposal.
    ProposalId => "proposal id"
);
define_id!(
    /// Stable proposal identity shared across re-proposals.
    ProposalCode => "proposal code"
);
define_id!(
    /// Administrative region a proposal is planted in.
    RegionId => "region id"
);
define_id!(
    /// Identifies a buyer transaction.
    TransactionId => "transaction id"
);
define_id!(
    /// Identifies a production batch.
    BatchId => "batch id"
);
define_id!(
    /// Identifies a scheduled treatment record.
    TreatmentRecordId => "treatment record id"
);
define_id!(
    /// Identifies a harvest submission.
    HarvestId => "harvest id"
);
