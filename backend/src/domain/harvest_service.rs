//! Harvest lifecycle service.
//!
//! A batch gets exactly one harvest. Submission is gated on the batch's
//! treatment history; approval moves the batch into its harvesting stage.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::{debug, error, warn};

use crate::domain::ports::{
    BatchRepository, HarvestFilter, HarvestRepository, MediaStore, TreatmentRecordRepository,
};
use crate::domain::service_support::{map_repository_error, map_repository_error_as_state};
use crate::domain::{
    BatchId, Caller, Error, Harvest, HarvestAmendment, HarvestId, HarvestReport, ImageChange,
    ImageUpload, KeyedLocks, MediaAttachments, MediaFolder, OwnershipCheck, OwnershipResolver,
    ReviewRequest, ReviewVerdict, Role, ensure_paired, pair_with_notes, validate_uploads,
};

const STAFF: [Role; 2] = [Role::Admin, Role::Validator];

/// Harvest lifecycle service.
pub struct HarvestService<H, R, B, M> {
    harvests: Arc<H>,
    records: Arc<R>,
    batches: Arc<B>,
    ownership: OwnershipResolver,
    media: MediaAttachments<M>,
    clock: Arc<dyn Clock>,
    batch_locks: Arc<KeyedLocks<BatchId>>,
}

impl<H, R, B, M> HarvestService<H, R, B, M> {
    /// Create a service over its repositories and media store.
    pub fn new(
        harvests: Arc<H>,
        records: Arc<R>,
        batches: Arc<B>,
        ownership: OwnershipResolver,
        media: Arc<M>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            harvests,
            records,
            batches,
            ownership,
            media: MediaAttachments::new(media),
            clock,
            batch_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Share per-batch locks with the treatment service.
    #[must_use]
    pub fn with_batch_locks(mut self, batch_locks: Arc<KeyedLocks<BatchId>>) -> Self {
        self.batch_locks = batch_locks;
        self
    }
}

impl<H, R, B, M> HarvestService<H, R, B, M>
where
    H: HarvestRepository,
    R: TreatmentRecordRepository,
    B: BatchRepository,
    M: MediaStore,
{
    /// Submit the batch's harvest report with its photo evidence.
    ///
    /// Fails with `InvalidState` whenever the batch already has a harvest,
    /// whatever that harvest's status; resubmission after revision goes
    /// through [`Self::update`].
    pub async fn submit(
        &self,
        caller: &Caller,
        report: HarvestReport,
        images: Vec<ImageUpload>,
        notes: Vec<String>,
    ) -> Result<Harvest, Error> {
        let farmer_id = caller.require_role(&[Role::Farmer])?;
        report.validate()?;

        let _guard = self.batch_locks.lock(report.batch_id).await;
        let batch = self
            .ownership
            .authorize(report.batch_id, farmer_id, OwnershipCheck::HARVEST_BATCH)
            .await?;
        if let Some(existing) = self
            .harvests
            .find_by_batch(batch.id)
            .await
            .map_err(map_repository_error)?
        {
            return Err(existing.status.duplicate_submission());
        }
        let newest = self
            .records
            .newest_by_batch_and_status(batch.id, None)
            .await
            .map_err(map_repository_error)?;
        let now = self.clock.utc();
        report.check_timeline(newest.as_ref(), now)?;
        ensure_paired(images.len(), notes.len())?;
        validate_uploads(&images)?;

        let harvests = Arc::clone(&self.harvests);
        let harvest = self
            .media
            .with_media_rollback(MediaFolder::Harvests, &images, |urls| async move {
                let harvest = Harvest::submitted(report, pair_with_notes(urls, notes), now);
                harvests
                    .create(&harvest)
                    .await
                    .map_err(map_repository_error_as_state)?;
                Ok(harvest)
            })
            .await?;

        debug!(batch_id = %harvest.batch_id, harvest_id = %harvest.id, "harvest submitted");
        Ok(harvest)
    }

    /// Approve a pending harvest or send it back for revision.
    ///
    /// The harvest is re-read under its batch lock, and the write only lands
    /// while the stored harvest is still pending. Approval moves the batch to
    /// `Harvesting` first; if the harvest write then fails the batch status
    /// is restored.
    pub async fn validate(
        &self,
        caller: &Caller,
        id: HarvestId,
        review: ReviewRequest,
    ) -> Result<Harvest, Error> {
        let validator_id = caller.require_role(&[Role::Validator])?;
        review.checked_revision_note()?;
        let batch_id = self.load(id).await?.batch_id;
        let _guard = self.batch_locks.lock(batch_id).await;
        let mut harvest = self.load(id).await?;
        let expected = harvest.status;
        let now = self.clock.utc();
        harvest.apply_review(validator_id, &review, now)?;

        if review.verdict == ReviewVerdict::Revision {
            self.harvests
                .update(&harvest, expected)
                .await
                .map_err(map_repository_error_as_state)?;
            debug!(harvest_id = %harvest.id, "harvest sent back for revision");
            return Ok(harvest);
        }

        let original = self
            .batches
            .find_by_id(harvest.batch_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("batch not found"))?;
        let mut batch = original.clone();
        batch.start_harvesting(now);
        self.batches
            .update(&batch)
            .await
            .map_err(map_repository_error)?;

        if let Err(write_error) = self.harvests.update(&harvest, expected).await {
            let cause = map_repository_error_as_state(write_error);
            warn!(batch_id = %batch.id, error = %cause, "harvest write failed; restoring batch");
            if let Err(restore_error) = self.batches.update(&original).await {
                let restore = map_repository_error(restore_error);
                error!(
                    batch_id = %batch.id,
                    error = %restore,
                    original = %cause,
                    "failed to restore batch status"
                );
                return Err(restore);
            }
            return Err(cause);
        }

        debug!(harvest_id = %harvest.id, batch_id = %batch.id, "harvest approved");
        Ok(harvest)
    }

    /// Resubmit a harvest that was sent back for revision.
    ///
    /// `notes` pairs with the positions that survive `changes`.
    pub async fn update(
        &self,
        caller: &Caller,
        id: HarvestId,
        amendment: HarvestAmendment,
        changes: Vec<ImageChange>,
        notes: Vec<String>,
    ) -> Result<Harvest, Error> {
        let farmer_id = caller.require_role(&[Role::Farmer])?;
        amendment.validate()?;
        let batch_id = self.load(id).await?.batch_id;
        self.ownership
            .authorize(batch_id, farmer_id, OwnershipCheck::HARVEST)
            .await?;
        let _guard = self.batch_locks.lock(batch_id).await;
        let mut harvest = self.load(id).await?;
        harvest.ensure_revisable()?;
        let expected = harvest.status;
        let retained = changes.iter().filter(|change| change.is_retained()).count();
        ensure_paired(retained, notes.len())?;

        let now = self.clock.utc();
        let existing: Vec<_> = harvest
            .harvest
            .iter()
            .map(|entry| entry.image_url.clone())
            .collect();
        let harvests = Arc::clone(&self.harvests);
        let harvest = self
            .media
            .replace_with_rollback(MediaFolder::Harvests, &existing, changes, |urls| async move {
                harvest.resubmit(amendment, pair_with_notes(urls, notes), now);
                harvests
                    .update(&harvest, expected)
                    .await
                    .map_err(map_repository_error_as_state)?;
                Ok(harvest)
            })
            .await?;

        debug!(harvest_id = %harvest.id, "harvest resubmitted");
        Ok(harvest)
    }

    /// The harvest of a batch; farmers only see their own.
    pub async fn get_by_batch(&self, caller: &Caller, batch_id: BatchId) -> Result<Harvest, Error> {
        if caller.role == Role::Farmer {
            self.ownership
                .authorize(batch_id, caller.id, OwnershipCheck::HARVEST_BATCH)
                .await?;
        } else {
            caller.require_role(&STAFF)?;
        }
        self.harvests
            .find_by_batch(batch_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("harvest not found"))
    }

    /// One harvest by id; farmers only see their own.
    pub async fn get(&self, caller: &Caller, id: HarvestId) -> Result<Harvest, Error> {
        if caller.role != Role::Farmer {
            caller.require_role(&STAFF)?;
        }
        let harvest = self.load(id).await?;
        if caller.role == Role::Farmer {
            self.ownership
                .authorize(harvest.batch_id, caller.id, OwnershipCheck::HARVEST)
                .await?;
        }
        Ok(harvest)
    }

    /// Page through harvests for staff dashboards.
    pub async fn query(
        &self,
        caller: &Caller,
        filter: HarvestFilter,
        page: PageRequest,
    ) -> Result<Page<Harvest>, Error> {
        caller.require_role(&STAFF)?;
        self.harvests
            .query(filter, page)
            .await
            .map_err(map_repository_error)
    }

    /// Number of harvests created during `year`.
    pub async fn count_by_year(&self, caller: &Caller, year: i32) -> Result<u64, Error> {
        caller.require_role(&STAFF)?;
        self.harvests
            .count_by_year(year)
            .await
            .map_err(map_repository_error)
    }

    async fn load(&self, id: HarvestId) -> Result<Harvest, Error> {
        self.harvests
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("harvest not found"))
    }
}

#[cfg(test)]
#[path = "harvest_service_tests.rs"]
mod tests;
