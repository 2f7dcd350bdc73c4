//! Port for transaction persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::{ProposalId, Transaction, TransactionId, TransactionStatus, UserId};

use super::{RepositoryError, TransactionFilter};

/// Port for transaction storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Insert a new transaction.
    async fn create(&self, transaction: &Transaction) -> Result<(), RepositoryError>;

    /// Fetch a transaction by id.
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, RepositoryError>;

    /// Fetch the buyer's transaction on `proposal_id` in `status`, if any.
    async fn find_by_buyer_proposal_and_status(
        &self,
        buyer_id: UserId,
        proposal_id: ProposalId,
        status: TransactionStatus,
    ) -> Result<Option<Transaction>, RepositoryError>;

    /// Fetch the accepted transaction of a proposal, if any.
    async fn find_accepted_by_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<Transaction>, RepositoryError>;

    /// Overwrite a transaction's mutable fields.
    ///
    /// Fails with [`RepositoryError::Conflict`] when accepting would leave the
    /// proposal with two accepted transactions.
    async fn update(&self, transaction: &Transaction) -> Result<(), RepositoryError>;

    /// Reject every pending transaction on `proposal_id`. Returns how many
    /// changed.
    async fn reject_pending_by_proposal(
        &self,
        proposal_id: ProposalId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Page through transactions matching `filter`, newest first.
    async fn list(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<Transaction>, RepositoryError>;
}
