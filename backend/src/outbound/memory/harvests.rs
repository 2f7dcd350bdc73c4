//! Harvest collection.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::ports::{HarvestFilter, HarvestRepository, RepositoryError};
use crate::domain::{BatchId, Harvest, HarvestId, HarvestStatus};

use super::{InMemoryStore, count, created_in, missing, paged};

#[async_trait]
impl HarvestRepository for InMemoryStore {
    async fn create(&self, harvest: &Harvest) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        if tables
            .harvests
            .values()
            .any(|row| row.batch_id == harvest.batch_id)
        {
            return Err(RepositoryError::conflict(format!(
                "batch {} already has a harvest",
                harvest.batch_id
            )));
        }
        tables.harvests.insert(harvest.id, harvest.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: HarvestId) -> Result<Option<Harvest>, RepositoryError> {
        Ok(self.tables().harvests.get(&id).cloned())
    }

    async fn find_by_batch(&self, batch_id: BatchId) -> Result<Option<Harvest>, RepositoryError> {
        Ok(self
            .tables()
            .harvests
            .values()
            .find(|row| row.batch_id == batch_id)
            .cloned())
    }

    async fn query(
        &self,
        filter: HarvestFilter,
        page: PageRequest,
    ) -> Result<Page<Harvest>, RepositoryError> {
        let mut rows: Vec<_> = self
            .tables()
            .harvests
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(paged(rows, page))
    }

    async fn count_by_year(&self, year: i32) -> Result<u64, RepositoryError> {
        Ok(count(
            self.tables()
                .harvests
                .values()
                .filter(|row| created_in(row.created_at, year))
                .count(),
        ))
    }

    async fn update(
        &self,
        harvest: &Harvest,
        expected: HarvestStatus,
    ) -> Result<(), RepositoryError> {
        match self.tables().harvests.get_mut(&harvest.id) {
            Some(row) if row.status != expected => Err(RepositoryError::conflict(format!(
                "harvest {} is {:?}, not {expected:?}",
                harvest.id, row.status
            ))),
            Some(row) => {
                *row = harvest.clone();
                Ok(())
            }
            None => Err(missing("harvest")),
        }
    }
}
