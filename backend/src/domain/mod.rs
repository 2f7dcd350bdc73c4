//! Domain primitives, aggregates and lifecycle services.
//!
//! Purpose: model the production chain from commodity to harvest and the
//! rules that move each record through its statuses. Types here never know
//! how they are stored or transported; services reach storage, media and
//! identity only through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Commodity, Proposal, Transaction, Batch, TreatmentRecord, Harvest:
//!   the chain's aggregates and their status machines.
//! - CommodityService, ProposalService, TransactionService, BatchService,
//!   TreatmentService, HarvestService: the operations callers invoke.
//! - MediaAttachments and OwnershipResolver: shared building blocks the
//!   services compose.

pub mod error;
pub mod ports;

mod batch;
mod batch_service;
mod commodity;
mod commodity_service;
mod harvest;
mod harvest_service;
mod identity;
mod ids;
mod keyed_locks;
mod media;
mod media_attachments;
mod ownership;
mod proposal;
mod proposal_service;
mod review;
mod service_support;
mod statistics;
mod supersession;
#[cfg(test)]
mod test_chain;
mod transaction;
mod transaction_service;
mod treatment_record;
mod treatment_service;

pub use self::batch::{Batch, BatchStatus};
pub use self::batch_service::BatchService;
pub use self::commodity::{Commodity, CommodityDraft};
pub use self::commodity_service::CommodityService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::harvest::{Harvest, HarvestAmendment, HarvestReport, HarvestStatus};
pub use self::harvest_service::HarvestService;
pub use self::identity::{Caller, Role};
pub use self::ids::{
    BatchId, CommodityCode, CommodityId, HarvestId, IdParseError, ProposalCode, ProposalId,
    RegionId, TransactionId, TreatmentRecordId, UserId,
};
pub use self::keyed_locks::{KeyGuard, KeyedLocks};
pub use self::media::{
    ImageAndNote, ImageChange, ImageUpload, MAX_IMAGE_BYTES, MediaFolder, ensure_paired,
    pair_with_notes, validate_uploads,
};
pub use self::media_attachments::{MediaAttachments, ReplacedMedia};
pub use self::ownership::{ChainRoute, OwnershipCheck, OwnershipResolver};
pub use self::proposal::{Proposal, ProposalDecision, ProposalDraft, ProposalStatus};
pub use self::proposal_service::ProposalService;
pub use self::review::{ReviewRequest, ReviewVerdict, non_blank};
pub use self::statistics::{MonthlyCount, fill_missing_months};
pub use self::supersession::Visibility;
pub use self::transaction::{Transaction, TransactionDecision, TransactionStatus};
pub use self::transaction_service::TransactionService;
pub use self::treatment_record::{
    DEFAULT_FILL_SKEW_HOURS, TreatmentRecord, TreatmentRequest, TreatmentStatus, check_schedule,
};
pub use self::treatment_service::TreatmentService;

/// Result alias used by every service operation.
///
/// # Examples
/// ```
/// use crop_connect::domain::{Error, WorkflowResult};
///
/// fn refuse() -> WorkflowResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(refuse().is_err());
/// ```
pub type WorkflowResult<T> = Result<T, Error>;
