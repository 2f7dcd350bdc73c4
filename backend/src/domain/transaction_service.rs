//! Buyer transaction service.
//!
//! Accepting a transaction starts production: a planting batch is created
//! and linked, the proposal closes to further offers, and every other
//! pending offer on it is rejected. Decisions on one proposal are
//! serialised through a per-proposal lock; the store's single-accepted rule
//! is the backstop.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::{debug, error, warn};

use crate::domain::ports::{
    BatchRepository, CommodityRepository, ProposalRepository, TransactionFilter,
    TransactionRepository,
};
use crate::domain::service_support::map_repository_error;
use crate::domain::{
    Batch, Caller, Commodity, Error, KeyedLocks, Proposal, ProposalId, Role, Transaction,
    TransactionDecision, TransactionId, TransactionStatus, Visibility,
};

/// Buyer transaction service.
pub struct TransactionService<T, P, C, B> {
    transactions: Arc<T>,
    proposals: Arc<P>,
    commodities: Arc<C>,
    batches: Arc<B>,
    clock: Arc<dyn Clock>,
    proposal_locks: Arc<KeyedLocks<ProposalId>>,
}

impl<T, P, C, B> TransactionService<T, P, C, B> {
    /// Create a service over its repositories.
    pub fn new(
        transactions: Arc<T>,
        proposals: Arc<P>,
        commodities: Arc<C>,
        batches: Arc<B>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transactions,
            proposals,
            commodities,
            batches,
            clock,
            proposal_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Share per-proposal locks with other service instances.
    #[must_use]
    pub fn with_proposal_locks(mut self, proposal_locks: Arc<KeyedLocks<ProposalId>>) -> Self {
        self.proposal_locks = proposal_locks;
        self
    }
}

impl<T, P, C, B> TransactionService<T, P, C, B>
where
    T: TransactionRepository,
    P: ProposalRepository,
    C: CommodityRepository,
    B: BatchRepository,
{
    /// Open a pending transaction on an approved, available proposal.
    ///
    /// The price is the proposal's estimated yield at the commodity's price
    /// per kilogram.
    pub async fn create(
        &self,
        caller: &Caller,
        proposal_id: ProposalId,
        address: String,
    ) -> Result<Transaction, Error> {
        let buyer_id = caller.require_role(&[Role::Buyer])?;
        if address.trim().is_empty() {
            return Err(Error::invalid_input("delivery address must not be empty"));
        }

        let _guard = self.proposal_locks.lock(proposal_id).await;
        let proposal = self.proposal(proposal_id).await?;
        if !proposal.is_open_for_transactions() {
            return Err(Error::invalid_state("proposal is not open for transactions"));
        }
        let commodity = self.commodity(&proposal).await?;
        let pending = self
            .transactions
            .find_by_buyer_proposal_and_status(buyer_id, proposal_id, TransactionStatus::Pending)
            .await
            .map_err(map_repository_error)?;
        if pending.is_some() {
            return Err(Error::invalid_state(
                "a pending transaction for this proposal already exists",
            ));
        }

        #[expect(
            clippy::cast_precision_loss,
            clippy::float_arithmetic,
            reason = "prices are far below the f64 mantissa limit"
        )]
        let total_price = proposal.estimated_total_harvest * commodity.price_per_kg as f64;
        let transaction = Transaction::pending(
            buyer_id,
            proposal_id,
            address.trim().to_owned(),
            total_price,
            self.clock.utc(),
        );
        self.transactions
            .create(&transaction)
            .await
            .map_err(map_repository_error)?;
        debug!(transaction_id = %transaction.id, proposal_id = %proposal_id, "transaction opened");
        Ok(transaction)
    }

    /// Accept or reject a pending transaction on one of the caller's
    /// proposals.
    ///
    /// Acceptance returns the transaction linked to its new batch.
    pub async fn decide(
        &self,
        caller: &Caller,
        id: TransactionId,
        decision: TransactionDecision,
    ) -> Result<Transaction, Error> {
        let farmer_id = caller.require_role(&[Role::Farmer])?;
        let current = self.load(id).await?;
        let _guard = self.proposal_locks.lock(current.proposal_id).await;
        // Re-read under the lock; a sibling decision may have rejected it.
        let mut transaction = self.load(id).await?;
        let mut proposal = self.proposal(transaction.proposal_id).await?;
        let commodity = self.commodity(&proposal).await?;
        if commodity.owner_id != farmer_id {
            return Err(Error::forbidden("you do not have access to this resource"));
        }
        let now = self.clock.utc();

        if decision == TransactionDecision::Rejected {
            transaction.reject(now)?;
            self.transactions
                .update(&transaction)
                .await
                .map_err(map_repository_error)?;
            debug!(transaction_id = %transaction.id, "transaction rejected");
            return Ok(transaction);
        }

        if transaction.status != TransactionStatus::Pending {
            return Err(Error::invalid_state("transaction is no longer pending"));
        }
        if self
            .transactions
            .find_accepted_by_proposal(proposal.id)
            .await
            .map_err(map_repository_error)?
            .is_some()
        {
            return Err(Error::conflict("proposal already has an accepted transaction"));
        }

        let original = transaction.clone();
        let batch = Batch::planting(
            proposal.id,
            transaction.id,
            now,
            commodity.estimated_harvest_date(now),
        );
        transaction.accept(batch.id, now)?;
        self.transactions
            .update(&transaction)
            .await
            .map_err(map_repository_error)?;
        if let Err(write_error) = self.batches.create(&batch).await {
            let cause = map_repository_error(write_error);
            warn!(
                transaction_id = %transaction.id,
                error = %cause,
                "batch write failed; restoring transaction"
            );
            if let Err(restore_error) = self.transactions.update(&original).await {
                let restore = map_repository_error(restore_error);
                error!(
                    transaction_id = %transaction.id,
                    error = %restore,
                    original = %cause,
                    "failed to restore transaction status"
                );
                return Err(restore);
            }
            return Err(cause);
        }

        proposal.set_availability(false, now)?;
        self.proposals
            .update(&proposal)
            .await
            .map_err(map_repository_error)?;
        let rejected = self
            .transactions
            .reject_pending_by_proposal(proposal.id, now)
            .await
            .map_err(map_repository_error)?;

        debug!(
            transaction_id = %transaction.id,
            batch_id = %batch.id,
            rejected,
            "transaction accepted"
        );
        Ok(transaction)
    }

    /// Withdraw one of the caller's pending transactions.
    pub async fn cancel(&self, caller: &Caller, id: TransactionId) -> Result<Transaction, Error> {
        let buyer_id = caller.require_role(&[Role::Buyer])?;
        let mut transaction = self.load(id).await?;
        if transaction.buyer_id != buyer_id {
            return Err(Error::not_found("transaction not found"));
        }
        transaction.cancel(self.clock.utc())?;
        self.transactions
            .update(&transaction)
            .await
            .map_err(map_repository_error)?;
        debug!(transaction_id = %transaction.id, "transaction cancelled");
        Ok(transaction)
    }

    /// One transaction, visible to its buyer, the owning farmer and staff.
    pub async fn get(&self, caller: &Caller, id: TransactionId) -> Result<Transaction, Error> {
        let transaction = self.load(id).await?;
        let visible = match caller.role {
            Role::Admin | Role::Validator => true,
            Role::Buyer => transaction.buyer_id == caller.id,
            Role::Farmer => {
                let proposal = self.proposal(transaction.proposal_id).await?;
                self.commodity(&proposal).await?.owner_id == caller.id
            }
        };
        if visible {
            Ok(transaction)
        } else {
            Err(Error::not_found("transaction not found"))
        }
    }

    /// Page through transactions.
    ///
    /// Buyers only see their own; farmers must name one of their proposals.
    pub async fn list(
        &self,
        caller: &Caller,
        mut filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<Transaction>, Error> {
        match caller.role {
            Role::Admin | Role::Validator => {}
            Role::Buyer => filter.buyer_id = Some(caller.id),
            Role::Farmer => {
                let Some(proposal_id) = filter.proposal_id else {
                    return Err(Error::invalid_input("farmers must filter by proposal"));
                };
                let proposal = self.proposal(proposal_id).await?;
                if self.commodity(&proposal).await?.owner_id != caller.id {
                    return Err(Error::forbidden("you do not have access to this resource"));
                }
            }
        }
        self.transactions
            .list(filter, page)
            .await
            .map_err(map_repository_error)
    }

    async fn load(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.transactions
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("transaction not found"))
    }

    async fn proposal(&self, id: ProposalId) -> Result<Proposal, Error> {
        self.proposals
            .find_by_id(id, Visibility::Live)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("proposal not found"))
    }

    async fn commodity(&self, proposal: &Proposal) -> Result<Commodity, Error> {
        self.commodities
            .find_by_id(proposal.commodity_id, Visibility::Live)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("commodity not found"))
    }
}

#[cfg(test)]
#[path = "transaction_service_tests.rs"]
mod tests;
