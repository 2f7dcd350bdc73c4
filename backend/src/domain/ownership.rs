//! Ownership resolution along the production chain.
//!
//! Treatment records and harvests carry no owner of their own: they belong to
//! the farmer owning the commodity reached through their batch. Every
//! farmer-restricted operation re-derives that owner here rather than
//! trusting a caller-supplied id.

use std::sync::Arc;

use crate::domain::ports::{
    BatchRepository, CommodityRepository, ProposalRepository, TransactionRepository,
};
use crate::domain::service_support::map_repository_error;
use crate::domain::{Batch, BatchId, Error, ProposalId, UserId, Visibility};

/// How the chain from batch to proposal is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainRoute {
    /// Batch → Proposal → Commodity.
    Direct,
    /// Batch → Transaction → Proposal → Commodity.
    ViaTransaction,
}

/// Per-flow parameters of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipCheck {
    /// Name of the originating entity used in "not found" messages.
    pub subject: &'static str,
    pub route: ChainRoute,
    /// Report a mismatch as `Forbidden` instead of "not found".
    pub leak_ownership_mismatch: bool,
}

impl OwnershipCheck {
    /// Treatment record lookups hide other farmers' records entirely.
    pub const TREATMENT_RECORD: Self = Self {
        subject: "treatment record",
        route: ChainRoute::Direct,
        leak_ownership_mismatch: false,
    };

    /// Batch lookups hide other farmers' batches entirely.
    pub const BATCH: Self = Self {
        subject: "batch",
        route: ChainRoute::Direct,
        leak_ownership_mismatch: false,
    };

    /// Harvest lookups reveal a mismatch as `Forbidden`.
    pub const HARVEST: Self = Self {
        subject: "harvest",
        route: ChainRoute::ViaTransaction,
        leak_ownership_mismatch: true,
    };

    /// Harvest submission, which starts from the batch itself.
    pub const HARVEST_BATCH: Self = Self {
        subject: "batch",
        route: ChainRoute::ViaTransaction,
        leak_ownership_mismatch: true,
    };

    fn not_found(&self) -> Error {
        Error::not_found(format!("{} not found", self.subject))
    }
}

/// Resolves the owning farmer of a batch.
#[derive(Clone)]
pub struct OwnershipResolver {
    batches: Arc<dyn BatchRepository>,
    transactions: Arc<dyn TransactionRepository>,
    proposals: Arc<dyn ProposalRepository>,
    commodities: Arc<dyn CommodityRepository>,
}

impl OwnershipResolver {
    /// Create a resolver over the chain's repositories.
    pub fn new(
        batches: Arc<dyn BatchRepository>,
        transactions: Arc<dyn TransactionRepository>,
        proposals: Arc<dyn ProposalRepository>,
        commodities: Arc<dyn CommodityRepository>,
    ) -> Self {
        Self {
            batches,
            transactions,
            proposals,
            commodities,
        }
    }

    /// Return the batch when `farmer_id` owns it.
    ///
    /// A missing link anywhere in the chain is reported as "not found" for
    /// `check.subject`, never for the link itself. Superseded proposals and
    /// commodities do not resolve.
    pub async fn authorize(
        &self,
        batch_id: BatchId,
        farmer_id: UserId,
        check: OwnershipCheck,
    ) -> Result<Batch, Error> {
        let (batch, owner) = self
            .resolve(batch_id, check.route)
            .await?
            .ok_or_else(|| check.not_found())?;
        if owner == farmer_id {
            Ok(batch)
        } else if check.leak_ownership_mismatch {
            Err(Error::forbidden("you do not have access to this resource"))
        } else {
            Err(check.not_found())
        }
    }

    /// Walk the chain and return the batch with its owning farmer.
    pub async fn resolve(
        &self,
        batch_id: BatchId,
        route: ChainRoute,
    ) -> Result<Option<(Batch, UserId)>, Error> {
        let Some(batch) = self
            .batches
            .find_by_id(batch_id)
            .await
            .map_err(map_repository_error)?
        else {
            return Ok(None);
        };
        let Some(proposal_id) = self.proposal_of(&batch, route).await? else {
            return Ok(None);
        };
        let Some(proposal) = self
            .proposals
            .find_by_id(proposal_id, Visibility::Live)
            .await
            .map_err(map_repository_error)?
        else {
            return Ok(None);
        };
        let owner = self
            .commodities
            .find_by_id(proposal.commodity_id, Visibility::Live)
            .await
            .map_err(map_repository_error)?
            .map(|commodity| commodity.owner_id);
        Ok(owner.map(|owner| (batch, owner)))
    }

    async fn proposal_of(
        &self,
        batch: &Batch,
        route: ChainRoute,
    ) -> Result<Option<ProposalId>, Error> {
        match route {
            ChainRoute::Direct => Ok(Some(batch.proposal_id)),
            ChainRoute::ViaTransaction => Ok(self
                .transactions
                .find_by_id(batch.transaction_id)
                .await
                .map_err(map_repository_error)?
                .map(|transaction| transaction.proposal_id)),
        }
    }
}
