//! Read access to production batches.
//!
//! Batches are written only by the transaction and harvest flows; this
//! service answers the questions farmers, buyers and staff ask about them.

use std::sync::Arc;

use pagination::{Page, PageRequest};

use crate::domain::ports::{BatchFilter, BatchRepository, TransactionRepository};
use crate::domain::service_support::map_repository_error;
use crate::domain::{
    Batch, Caller, CommodityId, Error, OwnershipCheck, OwnershipResolver, Role, TransactionId,
};

const STAFF: [Role; 2] = [Role::Admin, Role::Validator];

/// Batch read service.
pub struct BatchService<B, T> {
    batches: Arc<B>,
    transactions: Arc<T>,
    ownership: OwnershipResolver,
}

impl<B, T> BatchService<B, T> {
    /// Create a service over the batch and transaction stores.
    pub fn new(batches: Arc<B>, transactions: Arc<T>, ownership: OwnershipResolver) -> Self {
        Self {
            batches,
            transactions,
            ownership,
        }
    }
}

impl<B, T> BatchService<B, T>
where
    B: BatchRepository,
    T: TransactionRepository,
{
    /// Page through the calling farmer's batches.
    ///
    /// Any farmer criterion in `filter` is replaced by the caller.
    pub async fn list_for_farmer(
        &self,
        caller: &Caller,
        mut filter: BatchFilter,
        page: PageRequest,
    ) -> Result<Page<Batch>, Error> {
        filter.farmer_id = Some(caller.require_role(&[Role::Farmer])?);
        self.batches
            .query(filter, page)
            .await
            .map_err(map_repository_error)
    }

    /// Page through every batch for staff dashboards.
    pub async fn query(
        &self,
        caller: &Caller,
        filter: BatchFilter,
        page: PageRequest,
    ) -> Result<Page<Batch>, Error> {
        caller.require_role(&STAFF)?;
        self.batches
            .query(filter, page)
            .await
            .map_err(map_repository_error)
    }

    /// Every batch grown from a commodity, newest first.
    pub async fn list_by_commodity(&self, commodity_id: CommodityId) -> Result<Vec<Batch>, Error> {
        self.batches
            .list_by_commodity(commodity_id)
            .await
            .map_err(map_repository_error)
    }

    /// The batch started by accepting a transaction.
    ///
    /// Buyers only see batches of their own transactions and farmers only
    /// batches they own; anything else reads as "not found".
    pub async fn get_by_transaction(
        &self,
        caller: &Caller,
        transaction_id: TransactionId,
    ) -> Result<Batch, Error> {
        let batch = self
            .batches
            .find_by_transaction(transaction_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(batch_not_found)?;
        match caller.role {
            Role::Admin | Role::Validator => Ok(batch),
            Role::Buyer => {
                let bought = self
                    .transactions
                    .find_by_id(transaction_id)
                    .await
                    .map_err(map_repository_error)?
                    .is_some_and(|transaction| transaction.buyer_id == caller.id);
                if bought {
                    Ok(batch)
                } else {
                    Err(batch_not_found())
                }
            }
            Role::Farmer => {
                self.ownership
                    .authorize(batch.id, caller.id, OwnershipCheck::BATCH)
                    .await
            }
        }
    }

    /// Number of batches created during `year`.
    pub async fn count_by_year(&self, caller: &Caller, year: i32) -> Result<u64, Error> {
        caller.require_role(&STAFF)?;
        self.batches
            .count_by_year(year)
            .await
            .map_err(map_repository_error)
    }
}

fn batch_not_found() -> Error {
    Error::not_found("batch not found")
}

#[cfg(test)]
#[path = "batch_service_tests.rs"]
mod tests;
