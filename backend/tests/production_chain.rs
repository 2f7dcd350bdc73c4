//! End-to-end coverage of the production chain over the in-memory adapters.

use chrono::{DateTime, Duration, TimeZone, Utc};
use crop_connect::domain::ports::{
    BatchFilter, BatchRepository, IdentityError, IdentityResolver, TransactionFilter,
    TransactionRepository,
};
use crop_connect::domain::{
    BatchId, BatchStatus, Caller, CommodityDraft, CommodityId, ErrorCode, HarvestReport,
    HarvestStatus, ImageChange, ImageUpload, Proposal, ProposalDecision, ProposalDraft, RegionId,
    ReviewRequest, Role, Transaction, TransactionDecision, TransactionStatus, TreatmentRequest,
    TreatmentStatus,
};
use crop_connect::test_support::InMemoryWorkflow;
use futures_util::future::join_all;
use mockable::Clock;
use pagination::PageRequest;
use rstest::{fixture, rstest};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn workflow() -> InMemoryWorkflow {
    InMemoryWorkflow::new(start()).expect("workflow wiring")
}

fn photo(name: &str) -> ImageUpload {
    ImageUpload::new(name, "image/jpeg", vec![0xFF_u8, 0xD8, 0xFF])
}

fn sweet_corn() -> CommodityDraft {
    CommodityDraft {
        name: "Sweet Corn".to_owned(),
        description: "Yellow hybrid".to_owned(),
        seed: "Bisi 18".to_owned(),
        planting_period_days: 90,
        price_per_kg: 9_000,
        is_perennial: false,
        is_available: true,
    }
}

struct Listing {
    farmer: Caller,
    validator: Caller,
    commodity_id: CommodityId,
    proposal: Proposal,
}

async fn approved_listing(workflow: &InMemoryWorkflow) -> Listing {
    let farmer = InMemoryWorkflow::caller(Role::Farmer);
    let validator = InMemoryWorkflow::caller(Role::Validator);
    let commodity = workflow
        .commodities
        .create(&farmer, sweet_corn(), vec![photo("field")])
        .await
        .expect("commodity");
    let draft = ProposalDraft {
        commodity_id: commodity.id,
        region_id: RegionId::random(),
        name: "North plot".to_owned(),
        description: "Irrigated".to_owned(),
        estimated_total_harvest: 500.0,
        planting_area: 250.0,
        address: "Dusun Krajan".to_owned(),
    };
    let pending = workflow
        .proposals
        .submit(&farmer, draft)
        .await
        .expect("proposal");
    let proposal = workflow
        .proposals
        .decide(&validator, pending.id, ProposalDecision::Approved)
        .await
        .expect("approval");
    Listing {
        farmer,
        validator,
        commodity_id: commodity.id,
        proposal,
    }
}

async fn offer(workflow: &InMemoryWorkflow, listing: &Listing) -> Transaction {
    workflow
        .transactions
        .create(
            &InMemoryWorkflow::caller(Role::Buyer),
            listing.proposal.id,
            " Jl. Pasar 7 ".to_owned(),
        )
        .await
        .expect("transaction")
}

async fn planted(workflow: &InMemoryWorkflow, listing: &Listing) -> BatchId {
    let transaction = offer(workflow, listing).await;
    workflow
        .transactions
        .decide(&listing.farmer, transaction.id, TransactionDecision::Accepted)
        .await
        .expect("acceptance")
        .batch_id
        .expect("batch started")
}

#[rstest]
#[tokio::test]
async fn acceptance_closes_the_proposal_and_starts_a_batch(workflow: InMemoryWorkflow) {
    let listing = approved_listing(&workflow).await;
    let first = offer(&workflow, &listing).await;
    let second = offer(&workflow, &listing).await;
    assert_eq!(first.address, "Jl. Pasar 7");
    assert!((first.total_price - 4_500_000.0).abs() < f64::EPSILON);

    let accepted = workflow
        .transactions
        .decide(&listing.farmer, first.id, TransactionDecision::Accepted)
        .await
        .expect("acceptance");

    let batch_id = accepted.batch_id.expect("batch started");
    let batch = BatchRepository::find_by_id(&*workflow.store, batch_id)
        .await
        .expect("read")
        .expect("stored");
    assert_eq!(batch.status, BatchStatus::Planting);
    assert_eq!(batch.estimated_harvest_date, start() + Duration::days(90));

    let sibling = TransactionRepository::find_by_id(&*workflow.store, second.id)
        .await
        .expect("read")
        .expect("stored");
    assert_eq!(sibling.status, TransactionStatus::Rejected);

    let closed = workflow
        .proposals
        .get(listing.proposal.id)
        .await
        .expect("proposal");
    assert!(!closed.is_available);
    let late = workflow
        .transactions
        .create(
            &InMemoryWorkflow::caller(Role::Buyer),
            listing.proposal.id,
            "Late".to_owned(),
        )
        .await
        .expect_err("closed proposal");
    assert_eq!(late.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn a_batch_runs_from_treatment_to_approved_harvest(workflow: InMemoryWorkflow) {
    let listing = approved_listing(&workflow).await;
    let batch_id = planted(&workflow, &listing).await;

    let record = workflow
        .treatments
        .request_to_farmer(
            &listing.validator,
            TreatmentRequest {
                batch_id,
                date: start() + Duration::days(10),
                description: "Fungicide spray".to_owned(),
            },
        )
        .await
        .expect("request");
    assert_eq!(record.number, 1);
    assert_eq!(record.status, TreatmentStatus::WaitingResponse);

    let early = workflow
        .treatments
        .fill(&listing.farmer, record.id, vec![photo("spray")], vec!["done".to_owned()])
        .await
        .expect_err("too early");
    assert_eq!(early.code(), ErrorCode::InvalidTemporal);

    workflow.clock.advance(Duration::days(10));
    let filled = workflow
        .treatments
        .fill(&listing.farmer, record.id, vec![photo("spray")], vec!["done".to_owned()])
        .await
        .expect("fill");
    assert_eq!(filled.status, TreatmentStatus::Pending);
    let first_photo = filled
        .treatment
        .first()
        .map(|entry| entry.image_url.clone())
        .expect("evidence");

    workflow
        .treatments
        .validate(&listing.validator, record.id, ReviewRequest::revise("Closer photo"))
        .await
        .expect("revision");
    let revised = workflow
        .treatments
        .update_evidence(
            &listing.farmer,
            record.id,
            vec![ImageChange::Replace(photo("closer"))],
            vec!["closer".to_owned()],
        )
        .await
        .expect("update evidence");
    assert_eq!(revised.status, TreatmentStatus::Pending);
    assert!(!workflow.media_objects().contains(&first_photo));
    let approved = workflow
        .treatments
        .validate(&listing.validator, record.id, ReviewRequest::approve())
        .await
        .expect("approval");
    assert_eq!(approved.status, TreatmentStatus::Approved);

    workflow.clock.advance(Duration::days(80));
    let harvest = workflow
        .harvests
        .submit(
            &listing.farmer,
            HarvestReport {
                batch_id,
                date: workflow.clock.utc() - Duration::hours(2),
                total_harvest: 480.0,
                condition: "Dry and clean".to_owned(),
            },
            vec![photo("crates")],
            vec!["48 crates".to_owned()],
        )
        .await
        .expect("harvest");
    let accepted = workflow
        .harvests
        .validate(&listing.validator, harvest.id, ReviewRequest::approve())
        .await
        .expect("harvest approval");

    assert_eq!(accepted.status, HarvestStatus::Approved);
    let batch = BatchRepository::find_by_id(&*workflow.store, batch_id)
        .await
        .expect("read")
        .expect("stored");
    assert_eq!(batch.status, BatchStatus::Harvesting);
    assert_eq!(workflow.media_objects().len(), 3);

    let mine = workflow
        .batches
        .list_for_farmer(
            &listing.farmer,
            BatchFilter {
                status: Some(BatchStatus::Harvesting),
                ..BatchFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .expect("farmer batches");
    assert_eq!(mine.items.iter().map(|row| row.id).collect::<Vec<_>>(), vec![batch_id]);
    let by_commodity = workflow
        .batches
        .list_by_commodity(listing.commodity_id)
        .await
        .expect("commodity batches");
    assert_eq!(by_commodity.len(), 1);
    assert_eq!(
        workflow
            .batches
            .count_by_year(&listing.validator, 2026)
            .await
            .expect("count"),
        1
    );
}

#[rstest]
#[tokio::test]
async fn another_farmer_cannot_see_the_batch_records(workflow: InMemoryWorkflow) {
    let listing = approved_listing(&workflow).await;
    let batch_id = planted(&workflow, &listing).await;
    let record = workflow
        .treatments
        .request_to_farmer(
            &listing.validator,
            TreatmentRequest {
                batch_id,
                date: start() + Duration::hours(1),
                description: "Weeding".to_owned(),
            },
        )
        .await
        .expect("request");

    let stranger = InMemoryWorkflow::caller(Role::Farmer);
    let err = workflow
        .treatments
        .fill(&stranger, record.id, vec![photo("x")], vec!["x".to_owned()])
        .await
        .expect_err("not the owner");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(workflow.media_objects().len(), 1, "only the commodity photo");

    let foreign = workflow
        .batches
        .list_for_farmer(&stranger, BatchFilter::default(), PageRequest::default())
        .await
        .expect("empty listing");
    assert_eq!(foreign.total, 0);
}

#[rstest]
#[tokio::test]
async fn issued_credentials_drive_service_calls(workflow: InMemoryWorkflow) {
    let buyer = InMemoryWorkflow::caller(Role::Buyer);
    let token = workflow.identity.issue(buyer).expect("token");

    let caller = workflow
        .identity
        .resolve(&format!("Bearer {token}"))
        .await
        .expect("resolve");
    let page = workflow
        .transactions
        .list(&caller, TransactionFilter::default(), PageRequest::default())
        .await
        .expect("buyer listing");
    assert_eq!(caller, buyer);
    assert_eq!(page.total, 0);

    workflow.clock.advance(Duration::hours(24));
    let expired = workflow
        .identity
        .resolve(&token)
        .await
        .expect_err("expired");
    assert_eq!(expired, IdentityError::expired());
}

#[rstest]
#[tokio::test]
async fn concurrent_acceptances_start_exactly_one_batch(workflow: InMemoryWorkflow) {
    let listing = approved_listing(&workflow).await;
    let mut offers = Vec::new();
    for _ in 0..4 {
        offers.push(offer(&workflow, &listing).await);
    }

    let outcomes = join_all(offers.iter().map(|transaction| {
        workflow
            .transactions
            .decide(&listing.farmer, transaction.id, TransactionDecision::Accepted)
    }))
    .await;

    let accepted: Vec<_> = outcomes.iter().filter_map(|outcome| outcome.as_ref().ok()).collect();
    assert_eq!(accepted.len(), 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().err())
            .all(|err| err.code() == ErrorCode::InvalidState)
    );
    let rows = workflow
        .transactions
        .list(
            &listing.validator,
            TransactionFilter {
                proposal_id: Some(listing.proposal.id),
                status: Some(TransactionStatus::Accepted),
                ..TransactionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .expect("listing");
    assert_eq!(rows.total, 1);
}

#[rstest]
#[tokio::test]
async fn concurrent_treatment_requests_schedule_one_record(workflow: InMemoryWorkflow) {
    let listing = approved_listing(&workflow).await;
    let batch_id = planted(&workflow, &listing).await;

    let outcomes = join_all((1..=3_i64).map(|offset| {
        workflow.treatments.request_to_farmer(
            &listing.validator,
            TreatmentRequest {
                batch_id,
                date: start() + Duration::days(offset),
                description: format!("Round {offset}"),
            },
        )
    }))
    .await;

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    let records = workflow
        .treatments
        .list_by_batch(&listing.validator, batch_id)
        .await
        .expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records.first().map(|record| record.number), Some(1));
}

#[rstest]
#[tokio::test]
async fn only_the_buyer_and_owner_follow_a_transaction_to_its_batch(
    workflow: InMemoryWorkflow,
) {
    let listing = approved_listing(&workflow).await;
    let buyer = InMemoryWorkflow::caller(Role::Buyer);
    let transaction = workflow
        .transactions
        .create(&buyer, listing.proposal.id, "Jl. Pasar 7".to_owned())
        .await
        .expect("transaction");
    let batch_id = workflow
        .transactions
        .decide(&listing.farmer, transaction.id, TransactionDecision::Accepted)
        .await
        .expect("acceptance")
        .batch_id
        .expect("batch started");

    for caller in [buyer, listing.farmer] {
        let batch = workflow
            .batches
            .get_by_transaction(&caller, transaction.id)
            .await
            .expect("participant");
        assert_eq!(batch.id, batch_id);
    }
    let err = workflow
        .batches
        .get_by_transaction(&InMemoryWorkflow::caller(Role::Buyer), transaction.id)
        .await
        .expect_err("another buyer");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
