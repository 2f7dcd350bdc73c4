//! Shared fixtures for lifecycle service tests: one fully linked
//! commodity → proposal → transaction → batch chain and an ownership
//! resolver answering from it.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::ports::{
    MockBatchRepository, MockCommodityRepository, MockProposalRepository,
    MockTransactionRepository,
};
use crate::domain::{
    Batch, Caller, Commodity, CommodityDraft, OwnershipResolver, Proposal, ProposalCode,
    ProposalDecision, ProposalDraft, RegionId, Role, Transaction, UserId,
};

/// Midnight on day `n` of the fixture timeline.
pub(crate) fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0)
        .single()
        .map(|start| start + Duration::days(n))
        .expect("valid fixture date")
}

pub(crate) struct Chain {
    pub owner: Caller,
    pub validator: Caller,
    pub buyer: Caller,
    pub commodity: Commodity,
    pub proposal: Proposal,
    pub transaction: Transaction,
    pub batch: Batch,
}

impl Chain {
    /// A batch planted on day 0 with its harvest expected on day 100.
    pub(crate) fn new() -> Self {
        let owner = Caller::new(UserId::random(), Role::Farmer);
        let validator = Caller::new(UserId::random(), Role::Validator);
        let buyer = Caller::new(UserId::random(), Role::Buyer);
        let commodity = Commodity::create(
            owner.id,
            CommodityDraft {
                name: "Red Chili".to_owned(),
                description: "hot".to_owned(),
                seed: "Bara".to_owned(),
                planting_period_days: 100,
                price_per_kg: 25_000,
                is_perennial: false,
                is_available: true,
            },
            Vec::new(),
            day(-30),
        );
        let mut proposal = Proposal::pending(
            ProposalCode::random(),
            ProposalDraft {
                commodity_id: commodity.id,
                region_id: RegionId::random(),
                name: "Dry season chili".to_owned(),
                description: String::new(),
                estimated_total_harvest: 1_000.0,
                planting_area: 500.0,
                address: "Block C".to_owned(),
            },
            day(-20),
        );
        proposal
            .decide(validator.id, ProposalDecision::Approved, day(-10))
            .expect("approve fixture proposal");
        let mut transaction = Transaction::pending(
            buyer.id,
            proposal.id,
            "Warehouse 4".to_owned(),
            25_000_000.0,
            day(-5),
        );
        let batch = Batch::planting(proposal.id, transaction.id, day(0), day(100));
        transaction
            .accept(batch.id, day(0))
            .expect("accept fixture transaction");
        Self {
            owner,
            validator,
            buyer,
            commodity,
            proposal,
            transaction,
            batch,
        }
    }

    /// A farmer who owns nothing in this chain.
    pub(crate) fn stranger(&self) -> Caller {
        Caller::new(UserId::random(), Role::Farmer)
    }

    /// Ownership resolver backed by mocks that answer from this chain.
    pub(crate) fn ownership(&self) -> OwnershipResolver {
        let mut batches = MockBatchRepository::new();
        let batch = self.batch.clone();
        batches
            .expect_find_by_id()
            .returning(move |id| Ok((id == batch.id).then(|| batch.clone())));

        let mut transactions = MockTransactionRepository::new();
        let transaction = self.transaction.clone();
        transactions
            .expect_find_by_id()
            .returning(move |id| Ok((id == transaction.id).then(|| transaction.clone())));

        let mut proposals = MockProposalRepository::new();
        let proposal = self.proposal.clone();
        proposals
            .expect_find_by_id()
            .returning(move |id, _| Ok((id == proposal.id).then(|| proposal.clone())));

        let mut commodities = MockCommodityRepository::new();
        let commodity = self.commodity.clone();
        commodities
            .expect_find_by_id()
            .returning(move |id, _| Ok((id == commodity.id).then(|| commodity.clone())));

        OwnershipResolver::new(
            Arc::new(batches),
            Arc::new(transactions),
            Arc::new(proposals),
            Arc::new(commodities),
        )
    }
}
