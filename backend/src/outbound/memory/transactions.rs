//! Transaction collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::{RepositoryError, TransactionFilter, TransactionRepository};
use crate::domain::{ProposalId, Transaction, TransactionId, TransactionStatus, UserId};

use super::{InMemoryStore, count, missing, paged};

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn create(&self, transaction: &Transaction) -> Result<(), RepositoryError> {
        self.tables()
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, RepositoryError> {
        Ok(self.tables().transactions.get(&id).cloned())
    }

    async fn find_by_buyer_proposal_and_status(
        &self,
        buyer_id: UserId,
        proposal_id: ProposalId,
        status: TransactionStatus,
    ) -> Result<Option<Transaction>, RepositoryError> {
        Ok(self
            .tables()
            .transactions
            .values()
            .find(|row| {
                row.buyer_id == buyer_id && row.proposal_id == proposal_id && row.status == status
            })
            .cloned())
    }

    async fn find_accepted_by_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<Transaction>, RepositoryError> {
        Ok(self
            .tables()
            .transactions
            .values()
            .find(|row| row.proposal_id == proposal_id && row.status == TransactionStatus::Accepted)
            .cloned())
    }

    async fn update(&self, transaction: &Transaction) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        if transaction.status == TransactionStatus::Accepted
            && tables.transactions.values().any(|row| {
                row.id != transaction.id
                    && row.proposal_id == transaction.proposal_id
                    && row.status == TransactionStatus::Accepted
            })
        {
            return Err(RepositoryError::conflict(format!(
                "proposal {} already has an accepted transaction",
                transaction.proposal_id
            )));
        }
        match tables.transactions.get_mut(&transaction.id) {
            Some(row) => {
                *row = transaction.clone();
                Ok(())
            }
            None => Err(missing("transaction")),
        }
    }

    async fn reject_pending_by_proposal(
        &self,
        proposal_id: ProposalId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables();
        let mut rejected = 0;
        for row in tables.transactions.values_mut().filter(|row| {
            row.proposal_id == proposal_id && row.status == TransactionStatus::Pending
        }) {
            row.status = TransactionStatus::Rejected;
            row.updated_at = Some(at);
            rejected += 1;
        }
        Ok(count(rejected))
    }

    async fn list(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<Transaction>, RepositoryError> {
        let mut rows: Vec<_> = self
            .tables()
            .transactions
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(paged(rows, page))
    }
}
