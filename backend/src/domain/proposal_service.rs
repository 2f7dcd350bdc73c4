//! Planting proposal service.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::debug;

use crate::domain::ports::{CommodityRepository, ProposalFilter, ProposalRepository};
use crate::domain::service_support::map_repository_error;
use crate::domain::{
    Caller, CommodityId, Error, ErrorCode, Proposal, ProposalCode, ProposalDecision, ProposalDraft,
    ProposalId, Role, UserId, Visibility,
};

/// Planting proposal service.
pub struct ProposalService<P, C> {
    proposals: Arc<P>,
    commodities: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<P, C> ProposalService<P, C> {
    /// Create a service over the proposal and commodity stores.
    pub fn new(proposals: Arc<P>, commodities: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            proposals,
            commodities,
            clock,
        }
    }
}

impl<P, C> ProposalService<P, C>
where
    P: ProposalRepository,
    C: CommodityRepository,
{
    /// Submit a proposal against one of the caller's live commodities.
    pub async fn submit(&self, caller: &Caller, draft: ProposalDraft) -> Result<Proposal, Error> {
        let farmer_id = caller.require_role(&[Role::Farmer])?;
        draft.validate()?;
        self.ensure_commodity_owner(draft.commodity_id, farmer_id)
            .await?;

        let proposal = Proposal::pending(ProposalCode::random(), draft, self.clock.utc());
        self.proposals
            .create(&proposal)
            .await
            .map_err(map_repository_error)?;
        debug!(proposal_id = %proposal.id, code = %proposal.code, "proposal submitted");
        Ok(proposal)
    }

    /// Approve or reject a pending proposal.
    pub async fn decide(
        &self,
        caller: &Caller,
        id: ProposalId,
        decision: ProposalDecision,
    ) -> Result<Proposal, Error> {
        let validator_id = caller.require_role(&[Role::Validator])?;
        let mut proposal = self.get(id).await?;
        proposal.decide(validator_id, decision, self.clock.utc())?;
        self.proposals
            .update(&proposal)
            .await
            .map_err(map_repository_error)?;
        debug!(proposal_id = %proposal.id, status = ?proposal.status, "proposal decided");
        Ok(proposal)
    }

    /// Replace a pending or rejected proposal with an edited version.
    pub async fn repropose(
        &self,
        caller: &Caller,
        id: ProposalId,
        draft: ProposalDraft,
    ) -> Result<Proposal, Error> {
        let farmer_id = caller.require_role(&[Role::Farmer])?;
        draft.validate()?;
        let current = self.owned(id, farmer_id).await?;
        let now = self.clock.utc();
        let replacement = current.repropose(draft, now)?;
        let replaced = self
            .proposals
            .supersede(current.id, &replacement, now)
            .await
            .map_err(map_repository_error)?;
        if !replaced {
            return Err(Error::invalid_state("proposal was changed concurrently"));
        }
        debug!(
            previous = %current.id,
            proposal_id = %replacement.id,
            code = %replacement.code,
            "proposal resubmitted"
        );
        Ok(replacement)
    }

    /// Open or close an approved proposal to buyers.
    pub async fn set_availability(
        &self,
        caller: &Caller,
        id: ProposalId,
        available: bool,
    ) -> Result<Proposal, Error> {
        let farmer_id = caller.require_role(&[Role::Farmer])?;
        let mut proposal = self.owned(id, farmer_id).await?;
        proposal.set_availability(available, self.clock.utc())?;
        self.proposals
            .update(&proposal)
            .await
            .map_err(map_repository_error)?;
        debug!(proposal_id = %proposal.id, available, "proposal availability changed");
        Ok(proposal)
    }

    /// Soft-delete one of the caller's proposals.
    pub async fn retire(&self, caller: &Caller, id: ProposalId) -> Result<(), Error> {
        let farmer_id = caller.require_role(&[Role::Farmer])?;
        self.owned(id, farmer_id).await?;
        let retired = self
            .proposals
            .retire(id, self.clock.utc())
            .await
            .map_err(map_repository_error)?;
        if !retired {
            return Err(Error::not_found("proposal not found"));
        }
        debug!(proposal_id = %id, "proposal retired");
        Ok(())
    }

    /// A live proposal by id.
    pub async fn get(&self, id: ProposalId) -> Result<Proposal, Error> {
        self.proposals
            .find_by_id(id, Visibility::Live)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("proposal not found"))
    }

    /// Page through live proposals.
    pub async fn list(
        &self,
        filter: ProposalFilter,
        page: PageRequest,
    ) -> Result<Page<Proposal>, Error> {
        self.proposals
            .list(filter, page)
            .await
            .map_err(map_repository_error)
    }

    async fn owned(&self, id: ProposalId, farmer_id: UserId) -> Result<Proposal, Error> {
        let proposal = self.get(id).await?;
        match self
            .ensure_commodity_owner(proposal.commodity_id, farmer_id)
            .await
        {
            Err(err) if err.code() == ErrorCode::NotFound => {
                Err(Error::not_found("proposal not found"))
            }
            other => other.map(|()| proposal),
        }
    }

    async fn ensure_commodity_owner(
        &self,
        id: CommodityId,
        farmer_id: UserId,
    ) -> Result<(), Error> {
        let commodity = self
            .commodities
            .find_by_id(id, Visibility::Live)
            .await
            .map_err(map_repository_error)?;
        match commodity {
            Some(commodity) if commodity.owner_id == farmer_id => Ok(()),
            _ => Err(Error::not_found("commodity not found")),
        }
    }
}

#[cfg(test)]
#[path = "proposal_service_tests.rs"]
mod tests;
