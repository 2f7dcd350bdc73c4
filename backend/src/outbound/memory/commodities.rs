//! Commodity collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::{CommodityRepository, RepositoryError};
use crate::domain::{Commodity, CommodityId, UserId, Visibility};

use super::{InMemoryStore, Tables, count, created_in, paged};

fn name_taken(tables: &Tables, owner_id: UserId, name: &str, except: Option<CommodityId>) -> bool {
    tables.commodities.values().any(|row| {
        row.superseded_at.is_none()
            && row.owner_id == owner_id
            && row.name == name
            && Some(row.id) != except
    })
}

fn duplicate_name(name: &str) -> RepositoryError {
    RepositoryError::conflict(format!("live commodity named `{name}` already exists"))
}

#[async_trait]
impl CommodityRepository for InMemoryStore {
    async fn create(&self, commodity: &Commodity) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        if name_taken(&tables, commodity.owner_id, &commodity.name, None) {
            return Err(duplicate_name(&commodity.name));
        }
        tables.commodities.insert(commodity.id, commodity.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: CommodityId,
        visibility: Visibility,
    ) -> Result<Option<Commodity>, RepositoryError> {
        Ok(self
            .tables()
            .commodities
            .get(&id)
            .filter(|row| visibility.admits(row.superseded_at))
            .cloned())
    }

    async fn find_live_by_owner_and_name(
        &self,
        owner_id: UserId,
        name: &str,
    ) -> Result<Option<Commodity>, RepositoryError> {
        Ok(self
            .tables()
            .commodities
            .values()
            .find(|row| row.superseded_at.is_none() && row.owner_id == owner_id && row.name == name)
            .cloned())
    }

    async fn list_live_by_owner(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Commodity>, RepositoryError> {
        let mut rows: Vec<_> = self
            .tables()
            .commodities
            .values()
            .filter(|row| row.superseded_at.is_none() && row.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(paged(rows, page))
    }

    async fn supersede(
        &self,
        previous: CommodityId,
        replacement: &Commodity,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();
        let live = tables
            .commodities
            .get(&previous)
            .is_some_and(|row| row.superseded_at.is_none());
        if !live {
            return Ok(false);
        }
        if name_taken(&tables, replacement.owner_id, &replacement.name, Some(previous)) {
            return Err(duplicate_name(&replacement.name));
        }
        if let Some(row) = tables.commodities.get_mut(&previous) {
            row.superseded_at = Some(at);
        }
        tables.commodities.insert(replacement.id, replacement.clone());
        Ok(true)
    }

    async fn retire(&self, id: CommodityId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();
        match tables.commodities.get_mut(&id) {
            Some(row) if row.superseded_at.is_none() => {
                row.superseded_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_live_by_year(&self, year: i32) -> Result<u64, RepositoryError> {
        let tables = self.tables();
        Ok(count(
            tables
                .commodities
                .values()
                .filter(|row| row.superseded_at.is_none() && created_in(row.created_at, year))
                .count(),
        ))
    }
}
