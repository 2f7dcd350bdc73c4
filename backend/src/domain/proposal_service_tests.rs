//! Unit coverage for the proposal service.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockCommodityRepository, MockProposalRepository};
use crate::domain::test_chain::{Chain, day};
use crate::domain::{ProposalStatus, RegionId};
use crate::test_support::MutableClock;

type Service = ProposalService<MockProposalRepository, MockCommodityRepository>;

#[fixture]
fn chain() -> Chain {
    Chain::new()
}

fn commodities(chain: &Chain) -> MockCommodityRepository {
    let commodity = chain.commodity.clone();
    let mut commodities = MockCommodityRepository::new();
    commodities
        .expect_find_by_id()
        .returning(move |id, _| Ok((id == commodity.id).then(|| commodity.clone())));
    commodities
}

fn serving(proposal: Proposal) -> MockProposalRepository {
    let mut proposals = MockProposalRepository::new();
    proposals
        .expect_find_by_id()
        .returning(move |id, _| Ok((id == proposal.id).then(|| proposal.clone())));
    proposals
}

fn service(chain: &Chain, proposals: MockProposalRepository) -> Service {
    ProposalService::new(
        Arc::new(proposals),
        Arc::new(commodities(chain)),
        Arc::new(MutableClock::new(day(2))),
    )
}

fn draft(chain: &Chain) -> ProposalDraft {
    ProposalDraft {
        commodity_id: chain.commodity.id,
        region_id: RegionId::random(),
        name: "Second planting".to_owned(),
        description: "terraced plot".to_owned(),
        estimated_total_harvest: 750.0,
        planting_area: 300.0,
        address: "Block E".to_owned(),
    }
}

fn pending(chain: &Chain) -> Proposal {
    Proposal::pending(ProposalCode::random(), draft(chain), day(-1))
}

#[rstest]
#[tokio::test]
async fn submission_starts_pending_and_closed(chain: Chain) {
    let mut proposals = MockProposalRepository::new();
    proposals.expect_create().times(1).returning(|_| Ok(()));

    let proposal = service(&chain, proposals)
        .submit(&chain.owner, draft(&chain))
        .await
        .expect("submit");

    assert_eq!(proposal.status, ProposalStatus::Pending);
    assert!(!proposal.is_available);
    assert_eq!(proposal.created_at, day(2));
}

#[rstest]
#[tokio::test]
async fn submitting_on_a_foreign_commodity_is_not_found(chain: Chain) {
    let mut proposals = MockProposalRepository::new();
    proposals.expect_create().times(0);

    let err = service(&chain, proposals)
        .submit(&chain.stranger(), draft(&chain))
        .await
        .expect_err("foreign commodity");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn validator_approval_opens_the_proposal(chain: Chain) {
    let proposal = pending(&chain);
    let id = proposal.id;
    let mut proposals = serving(proposal);
    proposals
        .expect_update()
        .withf(|proposal| proposal.is_available && proposal.status == ProposalStatus::Approved)
        .times(1)
        .returning(|_| Ok(()));

    let proposal = service(&chain, proposals)
        .decide(&chain.validator, id, ProposalDecision::Approved)
        .await
        .expect("approve");

    assert_eq!(proposal.validator_id, Some(chain.validator.id));
}

#[rstest]
#[tokio::test]
async fn farmers_cannot_decide(chain: Chain) {
    let err = service(&chain, MockProposalRepository::new())
        .decide(&chain.owner, chain.proposal.id, ProposalDecision::Approved)
        .await
        .expect_err("wrong role");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn reproposal_supersedes_rejected_version(chain: Chain) {
    let mut rejected = pending(&chain);
    rejected
        .decide(
            chain.validator.id,
            ProposalDecision::Rejected {
                reason: "area too small".to_owned(),
            },
            day(0),
        )
        .expect("reject");
    let previous = rejected.id;
    let code = rejected.code;
    let mut proposals = serving(rejected);
    proposals
        .expect_supersede()
        .withf(move |id, replacement, _| *id == previous && replacement.code == code)
        .times(1)
        .returning(|_, _, _| Ok(true));

    let replacement = service(&chain, proposals)
        .repropose(&chain.owner, previous, draft(&chain))
        .await
        .expect("repropose");

    assert_eq!(replacement.status, ProposalStatus::Pending);
    assert_eq!(replacement.code, code);
}

#[rstest]
#[tokio::test]
async fn approved_proposals_cannot_be_reproposed(chain: Chain) {
    let mut proposals = serving(chain.proposal.clone());
    proposals.expect_supersede().times(0);

    let err = service(&chain, proposals)
        .repropose(&chain.owner, chain.proposal.id, draft(&chain))
        .await
        .expect_err("approved");

    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn owner_toggles_availability(chain: Chain, #[case] available: bool) {
    let mut proposals = serving(chain.proposal.clone());
    proposals
        .expect_update()
        .withf(move |proposal| proposal.is_available == available)
        .times(1)
        .returning(|_| Ok(()));

    let proposal = service(&chain, proposals)
        .set_availability(&chain.owner, chain.proposal.id, available)
        .await
        .expect("toggle");

    assert_eq!(proposal.is_available, available);
}

#[rstest]
#[tokio::test]
async fn strangers_cannot_retire_proposals(chain: Chain) {
    let mut proposals = serving(chain.proposal.clone());
    proposals.expect_retire().times(0);

    let err = service(&chain, proposals)
        .retire(&chain.stranger(), chain.proposal.id)
        .await
        .expect_err("not the owner");

    assert_eq!(err.code(), ErrorCode::NotFound);
}
