//! Port for batch persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Batch, BatchId, CommodityId, TransactionId};

use super::{BatchFilter, RepositoryError};

/// Port for batch storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Insert a new batch.
    async fn create(&self, batch: &Batch) -> Result<(), RepositoryError>;

    /// Fetch a batch by id.
    async fn find_by_id(&self, id: BatchId) -> Result<Option<Batch>, RepositoryError>;

    /// Fetch the batch started by accepting `transaction_id`.
    async fn find_by_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<Batch>, RepositoryError>;

    /// Every batch grown from `commodity_id`, newest first.
    async fn list_by_commodity(
        &self,
        commodity_id: CommodityId,
    ) -> Result<Vec<Batch>, RepositoryError>;

    /// Page through batches matching `filter`, newest first.
    async fn query(
        &self,
        filter: BatchFilter,
        page: PageRequest,
    ) -> Result<Page<Batch>, RepositoryError>;

    /// Overwrite a batch's mutable fields.
    async fn update(&self, batch: &Batch) -> Result<(), RepositoryError>;

    /// Number of batches created during `year`.
    async fn count_by_year(&self, year: i32) -> Result<u64, RepositoryError>;
}
