//! Port for treatment record persistence.
//!
//! Adapters must reject a second record with the same `(batch, number)` pair
//! using [`RepositoryError::Conflict`]; the treatment lifecycle relies on it
//! as a backstop for concurrent scheduling. Updates are conditional on the
//! stored status and fail with the same error when it has moved on.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{BatchId, MonthlyCount, TreatmentRecord, TreatmentRecordId, TreatmentStatus};

use super::{RepositoryError, TreatmentRecordFilter, TreatmentRecordSort};

/// Port for treatment record storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TreatmentRecordRepository: Send + Sync {
    /// Insert a new record.
    async fn create(&self, record: &TreatmentRecord) -> Result<(), RepositoryError>;

    /// Fetch a record by id.
    async fn find_by_id(
        &self,
        id: TreatmentRecordId,
    ) -> Result<Option<TreatmentRecord>, RepositoryError>;

    /// The batch's record with the highest number, optionally restricted to
    /// one status.
    async fn newest_by_batch_and_status(
        &self,
        batch_id: BatchId,
        status: Option<TreatmentStatus>,
    ) -> Result<Option<TreatmentRecord>, RepositoryError>;

    /// How many records the batch has, in any status.
    async fn count_by_batch(&self, batch_id: BatchId) -> Result<u32, RepositoryError>;

    /// Every record of the batch in ascending number order.
    async fn list_by_batch(&self, batch_id: BatchId)
    -> Result<Vec<TreatmentRecord>, RepositoryError>;

    /// Page through records matching `filter` in `sort` order.
    async fn query(
        &self,
        filter: TreatmentRecordFilter,
        sort: TreatmentRecordSort,
        page: PageRequest,
    ) -> Result<Page<TreatmentRecord>, RepositoryError>;

    /// Number of records created during `year`.
    async fn count_by_year(&self, year: i32) -> Result<u64, RepositoryError>;

    /// Records created during `year`, grouped by month. Months with no
    /// records may be omitted.
    async fn statistic_by_year(&self, year: i32) -> Result<Vec<MonthlyCount>, RepositoryError>;

    /// Overwrite a record's mutable fields while its stored status is still
    /// `expected`.
    async fn update(
        &self,
        record: &TreatmentRecord,
        expected: TreatmentStatus,
    ) -> Result<(), RepositoryError>;
}
