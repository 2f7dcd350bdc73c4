//! Treatment lifecycle service.
//!
//! Drives the request → fill → validate → revise cycle of a batch's field
//! treatments. Every farmer action re-derives ownership through
//! [`OwnershipResolver`]; every action that stores images goes through
//! [`MediaAttachments`] so a failed write never leaves uploads behind.

use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::debug;

use crate::domain::ports::{
    BatchRepository, MediaStore, TreatmentRecordFilter, TreatmentRecordRepository,
    TreatmentRecordSort,
};
use crate::domain::service_support::{map_repository_error, map_repository_error_as_state};
use crate::domain::{
    BatchId, Caller, DEFAULT_FILL_SKEW_HOURS, Error, ImageChange, ImageUpload, KeyGuard,
    KeyedLocks, MediaAttachments, MediaFolder, MonthlyCount, OwnershipCheck, OwnershipResolver,
    ReviewRequest, Role, TreatmentRecord, TreatmentRecordId, TreatmentRequest, check_schedule,
    ensure_paired, fill_missing_months, pair_with_notes, validate_uploads,
};

const READERS: [Role; 3] = [Role::Admin, Role::Validator, Role::Farmer];
const STAFF: [Role; 2] = [Role::Admin, Role::Validator];

/// Treatment lifecycle service.
pub struct TreatmentService<R, B, M> {
    records: Arc<R>,
    batches: Arc<B>,
    ownership: OwnershipResolver,
    media: MediaAttachments<M>,
    clock: Arc<dyn Clock>,
    batch_locks: Arc<KeyedLocks<BatchId>>,
    fill_skew: Duration,
}

impl<R, B, M> TreatmentService<R, B, M> {
    /// Create a service with the default seven-hour fill window.
    pub fn new(
        records: Arc<R>,
        batches: Arc<B>,
        ownership: OwnershipResolver,
        media: Arc<M>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            records,
            batches,
            ownership,
            media: MediaAttachments::new(media),
            clock,
            batch_locks: Arc::new(KeyedLocks::new()),
            fill_skew: Duration::hours(DEFAULT_FILL_SKEW_HOURS),
        }
    }

    /// How far ahead of its date a record may be filled.
    #[must_use]
    pub fn with_fill_skew(mut self, fill_skew: Duration) -> Self {
        self.fill_skew = fill_skew;
        self
    }

    /// Share per-batch locks with other services touching the same batches.
    #[must_use]
    pub fn with_batch_locks(mut self, batch_locks: Arc<KeyedLocks<BatchId>>) -> Self {
        self.batch_locks = batch_locks;
        self
    }
}

impl<R, B, M> TreatmentService<R, B, M>
where
    R: TreatmentRecordRepository,
    B: BatchRepository,
    M: MediaStore,
{
    /// Schedule the next treatment of a batch.
    ///
    /// Holds the batch lock across the precondition checks and the insert so
    /// two concurrent requests cannot both pass the "previous record is
    /// approved" check.
    pub async fn request_to_farmer(
        &self,
        caller: &Caller,
        request: TreatmentRequest,
    ) -> Result<TreatmentRecord, Error> {
        let validator_id = caller.require_role(&[Role::Validator])?;
        if request.description.trim().is_empty() {
            return Err(Error::invalid_input("treatment description must not be empty"));
        }

        let _guard = self.batch_locks.lock(request.batch_id).await;
        let batch = self
            .batches
            .find_by_id(request.batch_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("batch not found"))?;
        let newest = self
            .records
            .newest_by_batch_and_status(batch.id, None)
            .await
            .map_err(map_repository_error)?;
        let now = self.clock.utc();
        check_schedule(&batch, newest.as_ref(), request.date, now)?;

        let existing = self
            .records
            .count_by_batch(batch.id)
            .await
            .map_err(map_repository_error)?;
        let number = existing
            .checked_add(1)
            .ok_or_else(|| Error::invalid_state("batch has too many treatment records"))?;
        let record = TreatmentRecord::scheduled(request, validator_id, number, now);
        self.records
            .create(&record)
            .await
            .map_err(map_repository_error_as_state)?;

        debug!(batch_id = %record.batch_id, number, "treatment requested");
        Ok(record)
    }

    /// Attach the farmer's evidence and submit the record for validation.
    ///
    /// New pairs are appended to any evidence already on the record.
    pub async fn fill(
        &self,
        caller: &Caller,
        id: TreatmentRecordId,
        images: Vec<ImageUpload>,
        notes: Vec<String>,
    ) -> Result<TreatmentRecord, Error> {
        let owned = self.farmer_record(caller, id).await?;
        let (_guard, mut record) = self.relock(owned).await?;
        let expected = record.status;
        let now = self.clock.utc();
        record.ensure_fillable(now, self.fill_skew)?;
        ensure_paired(images.len(), notes.len())?;
        validate_uploads(&images)?;

        let records = Arc::clone(&self.records);
        let record = self
            .media
            .with_media_rollback(MediaFolder::TreatmentRecords, &images, |urls| async move {
                record.append_evidence(pair_with_notes(urls, notes), now);
                records
                    .update(&record, expected)
                    .await
                    .map_err(map_repository_error_as_state)?;
                Ok(record)
            })
            .await?;

        debug!(record_id = %record.id, "treatment filled");
        Ok(record)
    }

    /// Rewrite the evidence list position by position and resubmit.
    ///
    /// `notes` pairs with the positions that survive `changes`.
    pub async fn update_evidence(
        &self,
        caller: &Caller,
        id: TreatmentRecordId,
        changes: Vec<ImageChange>,
        notes: Vec<String>,
    ) -> Result<TreatmentRecord, Error> {
        let owned = self.farmer_record(caller, id).await?;
        let (_guard, mut record) = self.relock(owned).await?;
        let expected = record.status;
        let now = self.clock.utc();
        record.ensure_fillable(now, self.fill_skew)?;
        let retained = changes.iter().filter(|change| change.is_retained()).count();
        ensure_paired(retained, notes.len())?;

        let existing: Vec<_> = record
            .treatment
            .iter()
            .map(|entry| entry.image_url.clone())
            .collect();
        let records = Arc::clone(&self.records);
        let record = self
            .media
            .replace_with_rollback(
                MediaFolder::TreatmentRecords,
                &existing,
                changes,
                |urls| async move {
                    record.replace_evidence(pair_with_notes(urls, notes), now);
                    records
                        .update(&record, expected)
                        .await
                        .map_err(map_repository_error_as_state)?;
                    Ok(record)
                },
            )
            .await?;

        debug!(record_id = %record.id, "treatment evidence updated");
        Ok(record)
    }

    /// Approve a pending record or send it back for revision.
    pub async fn validate(
        &self,
        caller: &Caller,
        id: TreatmentRecordId,
        review: ReviewRequest,
    ) -> Result<TreatmentRecord, Error> {
        let validator_id = caller.require_role(&[Role::Validator])?;
        review.checked_revision_note()?;
        let loaded = self.load(id).await?;
        let (_guard, mut record) = self.relock(loaded).await?;
        let expected = record.status;
        record.apply_review(validator_id, &review, self.clock.utc())?;
        self.records
            .update(&record, expected)
            .await
            .map_err(map_repository_error_as_state)?;

        debug!(record_id = %record.id, status = ?record.status, "treatment validated");
        Ok(record)
    }

    /// Adjust validator notes without changing status.
    pub async fn update_notes(
        &self,
        caller: &Caller,
        id: TreatmentRecordId,
        revision_note: Option<String>,
        warning_note: Option<String>,
    ) -> Result<TreatmentRecord, Error> {
        caller.require_role(&[Role::Validator])?;
        let loaded = self.load(id).await?;
        let (_guard, mut record) = self.relock(loaded).await?;
        let expected = record.status;
        if record.update_notes(revision_note, warning_note, self.clock.utc())? {
            self.records
                .update(&record, expected)
                .await
                .map_err(map_repository_error_as_state)?;
        }
        Ok(record)
    }

    /// Fetch one record; farmers only see their own.
    pub async fn get_for_caller(
        &self,
        caller: &Caller,
        id: TreatmentRecordId,
    ) -> Result<TreatmentRecord, Error> {
        caller.require_role(&READERS)?;
        if caller.role == Role::Farmer {
            return self.farmer_record(caller, id).await;
        }
        self.load(id).await
    }

    /// Every record of a batch in number order; farmers only see their own.
    pub async fn list_by_batch(
        &self,
        caller: &Caller,
        batch_id: BatchId,
    ) -> Result<Vec<TreatmentRecord>, Error> {
        caller.require_role(&READERS)?;
        if caller.role == Role::Farmer {
            self.ownership
                .authorize(batch_id, caller.id, OwnershipCheck::TREATMENT_RECORD)
                .await?;
        }
        self.records
            .list_by_batch(batch_id)
            .await
            .map_err(map_repository_error)
    }

    /// Page through records for staff dashboards.
    pub async fn query(
        &self,
        caller: &Caller,
        filter: TreatmentRecordFilter,
        sort: TreatmentRecordSort,
        page: PageRequest,
    ) -> Result<Page<TreatmentRecord>, Error> {
        caller.require_role(&STAFF)?;
        self.records
            .query(filter, sort, page)
            .await
            .map_err(map_repository_error)
    }

    /// Number of records created during `year`.
    pub async fn count_by_year(&self, caller: &Caller, year: i32) -> Result<u64, Error> {
        caller.require_role(&STAFF)?;
        self.records
            .count_by_year(year)
            .await
            .map_err(map_repository_error)
    }

    /// Records created during `year` for all twelve months.
    pub async fn statistic_by_year(
        &self,
        caller: &Caller,
        year: i32,
    ) -> Result<Vec<MonthlyCount>, Error> {
        caller.require_role(&STAFF)?;
        let sparse = self
            .records
            .statistic_by_year(year)
            .await
            .map_err(map_repository_error)?;
        Ok(fill_missing_months(sparse))
    }

    async fn load(&self, id: TreatmentRecordId) -> Result<TreatmentRecord, Error> {
        self.records
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("treatment record not found"))
    }

    /// Take the record's batch lock and re-read it under the lock.
    async fn relock(
        &self,
        record: TreatmentRecord,
    ) -> Result<(KeyGuard, TreatmentRecord), Error> {
        let guard = self.batch_locks.lock(record.batch_id).await;
        let current = self.load(record.id).await?;
        Ok((guard, current))
    }

    async fn farmer_record(
        &self,
        caller: &Caller,
        id: TreatmentRecordId,
    ) -> Result<TreatmentRecord, Error> {
        let farmer_id = caller.require_role(&[Role::Farmer])?;
        let record = self.load(id).await?;
        self.ownership
            .authorize(record.batch_id, farmer_id, OwnershipCheck::TREATMENT_RECORD)
            .await?;
        Ok(record)
    }
}

#[cfg(test)]
#[path = "treatment_service_tests.rs"]
mod tests;
