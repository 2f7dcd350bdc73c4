//! Batch collection.
//!
//! Commodity and farmer criteria are answered by following each batch to
//! its proposal and that proposal's commodity within the same snapshot.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::ports::{BatchFilter, BatchRepository, RepositoryError};
use crate::domain::{Batch, BatchId, CommodityId, TransactionId, UserId};

use super::{InMemoryStore, Tables, count, created_in, missing, paged};

/// The commodity a batch grows and that commodity's owner.
fn lineage(tables: &Tables, batch: &Batch) -> Option<(CommodityId, UserId)> {
    let proposal = tables.proposals.get(&batch.proposal_id)?;
    let commodity = tables.commodities.get(&proposal.commodity_id)?;
    Some((commodity.id, commodity.owner_id))
}

fn newest_first(mut rows: Vec<Batch>) -> Vec<Batch> {
    rows.sort_by(|left, right| right.created_at.cmp(&left.created_at));
    rows
}

#[async_trait]
impl BatchRepository for InMemoryStore {
    async fn create(&self, batch: &Batch) -> Result<(), RepositoryError> {
        self.tables().batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        Ok(self.tables().batches.get(&id).cloned())
    }

    async fn find_by_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<Batch>, RepositoryError> {
        Ok(self
            .tables()
            .batches
            .values()
            .find(|row| row.transaction_id == transaction_id)
            .cloned())
    }

    async fn list_by_commodity(
        &self,
        commodity_id: CommodityId,
    ) -> Result<Vec<Batch>, RepositoryError> {
        let filter = BatchFilter {
            commodity_id: Some(commodity_id),
            ..BatchFilter::default()
        };
        Ok(newest_first(self.matching(filter)))
    }

    async fn query(
        &self,
        filter: BatchFilter,
        page: PageRequest,
    ) -> Result<Page<Batch>, RepositoryError> {
        Ok(paged(newest_first(self.matching(filter)), page))
    }

    async fn update(&self, batch: &Batch) -> Result<(), RepositoryError> {
        match self.tables().batches.get_mut(&batch.id) {
            Some(row) => {
                *row = batch.clone();
                Ok(())
            }
            None => Err(missing("batch")),
        }
    }

    async fn count_by_year(&self, year: i32) -> Result<u64, RepositoryError> {
        Ok(count(
            self.tables()
                .batches
                .values()
                .filter(|row| created_in(row.created_at, year))
                .count(),
        ))
    }
}

impl InMemoryStore {
    fn matching(&self, filter: BatchFilter) -> Vec<Batch> {
        let tables = self.tables();
        tables
            .batches
            .values()
            .filter(|row| {
                lineage(&tables, row).is_some_and(|(commodity_id, owner_id)| {
                    filter.matches(row, commodity_id, owner_id)
                })
            })
            .cloned()
            .collect()
    }
}
