//! Treatment record collection.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Datelike;
use pagination::{Page, PageRequest};

use crate::domain::ports::{
    RepositoryError, TreatmentRecordFilter, TreatmentRecordRepository, TreatmentRecordSort,
};
use crate::domain::{BatchId, MonthlyCount, TreatmentRecord, TreatmentRecordId, TreatmentStatus};

use super::{InMemoryStore, count, created_in, missing, paged};

#[async_trait]
impl TreatmentRecordRepository for InMemoryStore {
    async fn create(&self, record: &TreatmentRecord) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        if tables
            .treatment_records
            .values()
            .any(|row| row.batch_id == record.batch_id && row.number == record.number)
        {
            return Err(RepositoryError::conflict(format!(
                "batch {} already has treatment number {}",
                record.batch_id, record.number
            )));
        }
        tables.treatment_records.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: TreatmentRecordId,
    ) -> Result<Option<TreatmentRecord>, RepositoryError> {
        Ok(self.tables().treatment_records.get(&id).cloned())
    }

    async fn newest_by_batch_and_status(
        &self,
        batch_id: BatchId,
        status: Option<TreatmentStatus>,
    ) -> Result<Option<TreatmentRecord>, RepositoryError> {
        Ok(self
            .tables()
            .treatment_records
            .values()
            .filter(|row| {
                row.batch_id == batch_id && status.is_none_or(|wanted| row.status == wanted)
            })
            .max_by_key(|row| row.number)
            .cloned())
    }

    async fn count_by_batch(&self, batch_id: BatchId) -> Result<u32, RepositoryError> {
        let total = self
            .tables()
            .treatment_records
            .values()
            .filter(|row| row.batch_id == batch_id)
            .count();
        u32::try_from(total).map_err(|_| RepositoryError::query("treatment count overflow"))
    }

    async fn list_by_batch(
        &self,
        batch_id: BatchId,
    ) -> Result<Vec<TreatmentRecord>, RepositoryError> {
        let mut rows: Vec<_> = self
            .tables()
            .treatment_records
            .values()
            .filter(|row| row.batch_id == batch_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.number);
        Ok(rows)
    }

    async fn query(
        &self,
        filter: TreatmentRecordFilter,
        sort: TreatmentRecordSort,
        page: PageRequest,
    ) -> Result<Page<TreatmentRecord>, RepositoryError> {
        let mut rows: Vec<_> = self
            .tables()
            .treatment_records
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|left, right| sort.compare(left, right));
        Ok(paged(rows, page))
    }

    async fn count_by_year(&self, year: i32) -> Result<u64, RepositoryError> {
        Ok(count(
            self.tables()
                .treatment_records
                .values()
                .filter(|row| created_in(row.created_at, year))
                .count(),
        ))
    }

    async fn statistic_by_year(&self, year: i32) -> Result<Vec<MonthlyCount>, RepositoryError> {
        let mut months: BTreeMap<u32, u64> = BTreeMap::new();
        for row in self
            .tables()
            .treatment_records
            .values()
            .filter(|row| created_in(row.created_at, year))
        {
            *months.entry(row.created_at.month()).or_default() += 1;
        }
        Ok(months
            .into_iter()
            .map(|(month, total)| MonthlyCount { month, total })
            .collect())
    }

    async fn update(
        &self,
        record: &TreatmentRecord,
        expected: TreatmentStatus,
    ) -> Result<(), RepositoryError> {
        match self.tables().treatment_records.get_mut(&record.id) {
            Some(row) if row.status != expected => Err(RepositoryError::conflict(format!(
                "treatment record {} is {:?}, not {expected:?}",
                record.id, row.status
            ))),
            Some(row) => {
                *row = record.clone();
                Ok(())
            }
            None => Err(missing("treatment record")),
        }
    }
}
