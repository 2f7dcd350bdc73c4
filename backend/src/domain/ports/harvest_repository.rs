//! Port for harvest persistence.
//!
//! Adapters must reject a second harvest for the same batch with
//! [`RepositoryError::Conflict`], and an update whose expected status no
//! longer matches the stored row the same way.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{BatchId, Harvest, HarvestId, HarvestStatus};

use super::{HarvestFilter, RepositoryError};

/// Port for harvest storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HarvestRepository: Send + Sync {
    /// Insert a new harvest.
    async fn create(&self, harvest: &Harvest) -> Result<(), RepositoryError>;

    /// Fetch a harvest by id.
    async fn find_by_id(&self, id: HarvestId) -> Result<Option<Harvest>, RepositoryError>;

    /// Fetch the harvest of a batch, if one was submitted.
    async fn find_by_batch(&self, batch_id: BatchId) -> Result<Option<Harvest>, RepositoryError>;

    /// Page through harvests matching `filter`, newest first.
    async fn query(
        &self,
        filter: HarvestFilter,
        page: PageRequest,
    ) -> Result<Page<Harvest>, RepositoryError>;

    /// Number of harvests created during `year`.
    async fn count_by_year(&self, year: i32) -> Result<u64, RepositoryError>;

    /// Overwrite a harvest's mutable fields while its stored status is still
    /// `expected`.
    async fn update(
        &self,
        harvest: &Harvest,
        expected: HarvestStatus,
    ) -> Result<(), RepositoryError>;
}
