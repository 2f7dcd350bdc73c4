//! The single harvest report of a batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BatchId, Error, HarvestId, ImageAndNote, ReviewRequest, ReviewVerdict, TreatmentRecord,
    TreatmentStatus, UserId,
};

/// Review state of a harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStatus {
    Pending,
    Approved,
    Revision,
}

impl HarvestStatus {
    /// Approved harvests accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Error returned when a second harvest is submitted for a batch whose
    /// existing harvest is in this state.
    pub fn duplicate_submission(self) -> Error {
        match self {
            Self::Pending => Error::invalid_state("harvest is already under review"),
            Self::Approved => Error::invalid_state("harvest has already been accepted"),
            Self::Revision => Error::invalid_state("harvest is under revision"),
        }
    }
}

/// Harvest report submitted by the owning farmer.
///
/// ## Invariants
/// - At most one harvest exists per batch.
/// - `date` is never before the batch's last approved treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Harvest {
    pub id: HarvestId,
    pub batch_id: BatchId,
    pub date: DateTime<Utc>,
    /// Harvested weight in kilograms.
    pub total_harvest: f64,
    pub condition: String,
    pub status: HarvestStatus,
    pub harvest: Vec<ImageAndNote>,
    pub accepter_id: Option<UserId>,
    pub revision_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Farmer-supplied harvest fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestReport {
    pub batch_id: BatchId,
    pub date: DateTime<Utc>,
    pub total_harvest: f64,
    pub condition: String,
}

/// Figures a farmer may correct when resubmitting after revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestAmendment {
    pub total_harvest: f64,
    pub condition: String,
}

impl HarvestAmendment {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), Error> {
        check_figures(self.total_harvest, &self.condition)
    }
}

fn check_figures(total_harvest: f64, condition: &str) -> Result<(), Error> {
    if !(total_harvest.is_finite() && total_harvest > 0.0) {
        return Err(Error::invalid_input("total harvest must be positive"));
    }
    if condition.trim().is_empty() {
        return Err(Error::invalid_input("harvest condition must not be empty"));
    }
    Ok(())
}

impl HarvestReport {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), Error> {
        check_figures(self.total_harvest, &self.condition)
    }

    /// Check the report date against the batch's newest treatment record.
    ///
    /// The newest record must exist and be approved, and the harvest may
    /// neither precede it nor lie in the future.
    pub fn check_timeline(
        &self,
        newest_treatment: Option<&TreatmentRecord>,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let Some(treatment) = newest_treatment else {
            return Err(Error::invalid_state("treatment history not found"));
        };
        if treatment.status != TreatmentStatus::Approved {
            return Err(Error::invalid_state("latest treatment record is not approved"));
        }
        if treatment.date > self.date {
            return Err(Error::invalid_temporal(
                "harvest date must not precede the latest treatment date",
            ));
        }
        if self.date > now {
            return Err(Error::invalid_temporal("harvest date must not be in the future"));
        }
        Ok(())
    }
}

impl Harvest {
    /// A new pending harvest carrying its uploaded evidence.
    pub fn submitted(
        report: HarvestReport,
        evidence: Vec<ImageAndNote>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: HarvestId::random(),
            batch_id: report.batch_id,
            date: report.date,
            total_harvest: report.total_harvest,
            condition: report.condition.trim().to_owned(),
            status: HarvestStatus::Pending,
            harvest: evidence,
            accepter_id: None,
            revision_note: None,
            created_at: now,
            updated_at: None,
        }
    }

    /// Only harvests sent back for revision may be resubmitted.
    pub fn ensure_revisable(&self) -> Result<(), Error> {
        match self.status {
            HarvestStatus::Revision => Ok(()),
            HarvestStatus::Pending => Err(Error::invalid_state("harvest is already under review")),
            HarvestStatus::Approved => {
                Err(Error::invalid_state("harvest has already been accepted"))
            }
        }
    }

    /// Swap in resubmitted figures and evidence and return to review.
    pub fn resubmit(
        &mut self,
        amendment: HarvestAmendment,
        evidence: Vec<ImageAndNote>,
        now: DateTime<Utc>,
    ) {
        self.total_harvest = amendment.total_harvest;
        self.condition = amendment.condition.trim().to_owned();
        self.harvest = evidence;
        self.status = HarvestStatus::Pending;
        self.updated_at = Some(now);
    }

    /// Apply a validator's review.
    pub fn apply_review(
        &mut self,
        validator_id: UserId,
        review: &ReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let revision_note = review.checked_revision_note()?;
        if self.status != HarvestStatus::Pending {
            return Err(Error::invalid_state("harvest is not waiting for validation"));
        }
        match review.verdict {
            ReviewVerdict::Approved => {
                self.status = HarvestStatus::Approved;
                self.accepter_id = Some(validator_id);
            }
            ReviewVerdict::Revision => self.status = HarvestStatus::Revision,
        }
        self.revision_note = revision_note;
        self.updated_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{ErrorCode, TreatmentRequest};
    use chrono::Duration;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn report(date: DateTime<Utc>) -> HarvestReport {
        HarvestReport {
            batch_id: BatchId::random(),
            date,
            total_harvest: 950.0,
            condition: "good".to_owned(),
        }
    }

    fn treatment(date: DateTime<Utc>, status: TreatmentStatus) -> TreatmentRecord {
        let mut record = TreatmentRecord::scheduled(
            TreatmentRequest {
                batch_id: BatchId::random(),
                date,
                description: "fertilise".to_owned(),
            },
            UserId::random(),
            1,
            date - Duration::days(1),
        );
        record.status = status;
        record
    }

    #[rstest]
    #[case(TreatmentStatus::Revision)]
    #[case(TreatmentStatus::Pending)]
    #[case(TreatmentStatus::WaitingResponse)]
    fn unapproved_treatment_blocks_submission(now: DateTime<Utc>, #[case] status: TreatmentStatus) {
        let prior = treatment(now - Duration::days(5), status);
        let err = report(now - Duration::days(1))
            .check_timeline(Some(&prior), now)
            .expect_err("not approved");
        assert_eq!(err.code(), ErrorCode::InvalidState);
    }

    #[rstest]
    fn missing_treatment_history_blocks_submission(now: DateTime<Utc>) {
        let err = report(now).check_timeline(None, now).expect_err("no history");
        assert_eq!(err.code(), ErrorCode::InvalidState);
    }

    #[rstest]
    #[case(Duration::days(-6))]
    #[case(Duration::hours(1))]
    fn harvest_date_must_follow_treatment_and_precede_now(
        now: DateTime<Utc>,
        #[case] offset: Duration,
    ) {
        let prior = treatment(now - Duration::days(5), TreatmentStatus::Approved);
        let err = report(now + offset)
            .check_timeline(Some(&prior), now)
            .expect_err("out of order");
        assert_eq!(err.code(), ErrorCode::InvalidTemporal);
    }

    #[rstest]
    #[case(HarvestStatus::Pending, "already under review")]
    #[case(HarvestStatus::Approved, "already been accepted")]
    #[case(HarvestStatus::Revision, "under revision")]
    fn duplicate_submission_message_tracks_status(
        #[case] status: HarvestStatus,
        #[case] fragment: &str,
    ) {
        let err = status.duplicate_submission();
        assert_eq!(err.code(), ErrorCode::InvalidState);
        assert!(err.message().contains(fragment));
    }

    #[rstest]
    fn only_revision_can_be_resubmitted(now: DateTime<Utc>) {
        let mut harvest = Harvest::submitted(report(now), Vec::new(), now);
        assert!(harvest.ensure_revisable().is_err());
        harvest
            .apply_review(UserId::random(), &ReviewRequest::revise("blurry photos"), now)
            .expect("revise");
        harvest.ensure_revisable().expect("revisable");
        assert_eq!(harvest.revision_note.as_deref(), Some("blurry photos"));
    }

    #[rstest]
    fn approved_harvest_is_terminal(now: DateTime<Utc>) {
        let mut harvest = Harvest::submitted(report(now), Vec::new(), now);
        harvest
            .apply_review(UserId::random(), &ReviewRequest::approve(), now)
            .expect("approve");
        let err = harvest
            .apply_review(UserId::random(), &ReviewRequest::approve(), now)
            .expect_err("terminal");
        assert_eq!(err.code(), ErrorCode::InvalidState);
        assert!(harvest.status.is_terminal());
    }
}
