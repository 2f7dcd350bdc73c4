//! Scheduled field treatments within a batch.
//!
//! A validator schedules a treatment for a future date; once that date is
//! close the farmer fills it with photo evidence; the validator then approves
//! it or sends it back for revision.
//!
//! ```text
//! (none) --request--> WaitingResponse --fill--> Pending --approve--> Approved
//!                                        ^            |
//!                                        |       revise (note)
//!                                        +-- fill/update -- Revision
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::review::non_blank;
use crate::domain::{
    Batch, BatchId, BatchStatus, Error, ImageAndNote, ReviewRequest, ReviewVerdict,
    TreatmentRecordId, UserId,
};

/// How far ahead of its scheduled date a farmer may fill a record.
pub const DEFAULT_FILL_SKEW_HOURS: i64 = 7;

/// Lifecycle state of a treatment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
    WaitingResponse,
    Pending,
    Revision,
    Approved,
}

impl TreatmentStatus {
    /// Approved records accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// One scheduled treatment occurrence.
///
/// ## Invariants
/// - `number` runs 1, 2, 3, ... per batch with no gaps.
/// - At most one record per batch is outside `Approved` at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRecord {
    pub id: TreatmentRecordId,
    pub batch_id: BatchId,
    pub requester_id: UserId,
    pub accepter_id: Option<UserId>,
    pub number: u32,
    pub date: DateTime<Utc>,
    pub status: TreatmentStatus,
    pub description: String,
    pub treatment: Vec<ImageAndNote>,
    pub revision_note: Option<String>,
    pub warning_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validator request to schedule the next treatment of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRequest {
    pub batch_id: BatchId,
    pub date: DateTime<Utc>,
    pub description: String,
}

/// Decide whether a treatment may be scheduled for `date`.
///
/// `newest` is the batch's most recent record, if any.
pub fn check_schedule(
    batch: &Batch,
    newest: Option<&TreatmentRecord>,
    date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    if batch.status != BatchStatus::Planting {
        return Err(Error::invalid_state("batch is not in the planting stage"));
    }
    if date <= batch.created_at {
        return Err(Error::invalid_temporal(
            "treatment date must be after the planting date",
        ));
    }
    if let Some(prior) = newest {
        if !prior.status.is_terminal() {
            return Err(Error::invalid_state(
                "the latest treatment record is not finished yet",
            ));
        }
    }
    if date <= now {
        return Err(Error::invalid_temporal("treatment date must be in the future"));
    }
    if let Some(prior) = newest {
        if date <= prior.date {
            return Err(Error::invalid_temporal(
                "treatment date must be after the latest treatment date",
            ));
        }
    }
    if date > batch.estimated_harvest_date {
        return Err(Error::invalid_temporal(
            "treatment date must not be after the estimated harvest date",
        ));
    }
    Ok(())
}

impl TreatmentRecord {
    /// A freshly scheduled record awaiting the farmer.
    pub fn scheduled(
        request: TreatmentRequest,
        requester_id: UserId,
        number: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TreatmentRecordId::random(),
            batch_id: request.batch_id,
            requester_id,
            accepter_id: None,
            number,
            date: request.date,
            status: TreatmentStatus::WaitingResponse,
            description: request.description,
            treatment: Vec::new(),
            revision_note: None,
            warning_note: None,
            created_at: now,
            updated_at: None,
        }
    }

    /// Guard shared by filling and updating evidence.
    ///
    /// Farmers may only act once the scheduled date is within `skew` of
    /// `now`, and never on an approved record.
    pub fn ensure_fillable(&self, now: DateTime<Utc>, skew: Duration) -> Result<(), Error> {
        if self.date > now + skew {
            return Err(Error::invalid_temporal(
                "treatment record cannot be filled yet",
            ));
        }
        if self.status.is_terminal() {
            return Err(Error::invalid_state("treatment record is already approved"));
        }
        Ok(())
    }

    /// Append newly stored evidence and resubmit for review.
    pub fn append_evidence(&mut self, evidence: Vec<ImageAndNote>, now: DateTime<Utc>) {
        self.treatment.extend(evidence);
        self.status = TreatmentStatus::Pending;
        self.updated_at = Some(now);
    }

    /// Swap in a rewritten evidence list and resubmit for review.
    pub fn replace_evidence(&mut self, evidence: Vec<ImageAndNote>, now: DateTime<Utc>) {
        self.treatment = evidence;
        self.status = TreatmentStatus::Pending;
        self.updated_at = Some(now);
    }

    /// Apply a validator's review of pending evidence.
    pub fn apply_review(
        &mut self,
        validator_id: UserId,
        review: &ReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let revision_note = review.checked_revision_note()?;
        if self.status != TreatmentStatus::Pending {
            return Err(Error::invalid_state(
                "treatment record is not waiting for validation",
            ));
        }
        match review.verdict {
            ReviewVerdict::Approved => {
                self.status = TreatmentStatus::Approved;
                self.accepter_id = Some(validator_id);
            }
            ReviewVerdict::Revision => self.status = TreatmentStatus::Revision,
        }
        self.revision_note = revision_note;
        self.warning_note = review.warning();
        self.updated_at = Some(now);
        Ok(())
    }

    /// Adjust validator notes without changing status.
    ///
    /// A revision note may only be set while the record is under revision;
    /// the warning note can be changed at any time. Returns whether anything
    /// changed so callers can skip redundant writes.
    pub fn update_notes(
        &mut self,
        revision_note: Option<String>,
        warning_note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let revision_note = non_blank(revision_note);
        let warning_note = non_blank(warning_note);
        if revision_note.is_some() && self.status != TreatmentStatus::Revision {
            return Err(Error::invalid_state(
                "treatment record is not under revision",
            ));
        }
        if self.revision_note == revision_note && self.warning_note == warning_note {
            return Ok(false);
        }
        self.revision_note = revision_note;
        self.warning_note = warning_note;
        self.updated_at = Some(now);
        Ok(true)
    }
}
