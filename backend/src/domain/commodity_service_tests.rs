//! Unit coverage for the commodity catalogue service.

use std::sync::Arc;

use mockall::predicate::eq;
use rstest::{fixture, rstest};
use url::Url;

use super::*;
use crate::domain::ports::{MockCommodityRepository, MockMediaStore, RepositoryError};
use crate::domain::test_chain::{Chain, day};
use crate::domain::ErrorCode;
use crate::test_support::MutableClock;

type Service = CommodityService<MockCommodityRepository, MockMediaStore>;

#[fixture]
fn chain() -> Chain {
    Chain::new()
}

fn service(commodities: MockCommodityRepository, media: MockMediaStore) -> Service {
    CommodityService::new(
        Arc::new(commodities),
        Arc::new(media),
        Arc::new(MutableClock::new(day(1))),
    )
}

fn draft(name: &str) -> CommodityDraft {
    CommodityDraft {
        name: name.to_owned(),
        description: "sweet".to_owned(),
        seed: "Lokal".to_owned(),
        planting_period_days: 80,
        price_per_kg: 12_000,
        is_perennial: false,
        is_available: true,
    }
}

fn url(path: &str) -> Url {
    Url::parse(&format!("https://media.test/{path}")).expect("valid url")
}

fn serving(commodity: Commodity) -> MockCommodityRepository {
    let mut commodities = MockCommodityRepository::new();
    commodities
        .expect_find_by_id()
        .returning(move |id, _| Ok((id == commodity.id).then(|| commodity.clone())));
    commodities
}

#[rstest]
#[tokio::test]
async fn create_uploads_images_and_stores_commodity(chain: Chain) {
    let mut commodities = MockCommodityRepository::new();
    commodities
        .expect_find_live_by_owner_and_name()
        .withf(|_, name| name == "Sweet Corn")
        .returning(|_, _| Ok(None));
    commodities
        .expect_create()
        .withf(|commodity| commodity.image_urls.len() == 1)
        .times(1)
        .returning(|_| Ok(()));
    let mut media = MockMediaStore::new();
    media
        .expect_upload()
        .withf(|folder, files| *folder == MediaFolder::Commodities && files.len() == 1)
        .returning(|_, _| Ok(vec![url("commodities/corn.jpg")]));

    let commodity = service(commodities, media)
        .create(
            &chain.owner,
            draft(" Sweet Corn "),
            vec![ImageUpload::new("corn", "image/png", vec![1_u8; 8])],
        )
        .await
        .expect("create");

    assert_eq!(commodity.owner_id, chain.owner.id);
    assert_eq!(commodity.name, "Sweet Corn");
    assert_eq!(commodity.created_at, day(1));
}

#[rstest]
#[tokio::test]
async fn duplicate_name_conflicts_before_upload(chain: Chain) {
    let taken = chain.commodity.clone();
    let mut commodities = MockCommodityRepository::new();
    commodities
        .expect_find_live_by_owner_and_name()
        .returning(move |_, _| Ok(Some(taken.clone())));
    commodities.expect_create().times(0);
    let mut media = MockMediaStore::new();
    media.expect_upload().times(0);

    let err = service(commodities, media)
        .create(
            &chain.owner,
            draft("Red Chili"),
            vec![ImageUpload::new("chili", "image/png", vec![1_u8; 8])],
        )
        .await
        .expect_err("name taken");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn failed_insert_removes_uploaded_images(chain: Chain) {
    let mut commodities = MockCommodityRepository::new();
    commodities
        .expect_find_live_by_owner_and_name()
        .returning(|_, _| Ok(None));
    commodities
        .expect_create()
        .returning(|_| Err(RepositoryError::query("disk full")));
    let mut media = MockMediaStore::new();
    media
        .expect_upload()
        .returning(|_, _| Ok(vec![url("commodities/corn.jpg")]));
    media
        .expect_delete()
        .withf(|_, urls| urls.len() == 1 && urls[0] == url("commodities/corn.jpg"))
        .times(1)
        .returning(|_, _| Ok(()));

    let err = service(commodities, media)
        .create(
            &chain.owner,
            draft("Sweet Corn"),
            vec![ImageUpload::new("corn", "image/png", vec![1_u8; 8])],
        )
        .await
        .expect_err("insert fails");

    assert_eq!(err.code(), ErrorCode::DependencyFailure);
}

#[rstest]
#[case(Role::Buyer)]
#[case(Role::Validator)]
#[tokio::test]
async fn only_farmers_register_commodities(chain: Chain, #[case] role: Role) {
    let caller = Caller::new(chain.owner.id, role);
    let err = service(MockCommodityRepository::new(), MockMediaStore::new())
        .create(&caller, draft("Sweet Corn"), Vec::new())
        .await
        .expect_err("wrong role");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn edit_supersedes_under_the_same_code(chain: Chain) {
    let original = chain.commodity.clone();
    let mut commodities = serving(original.clone());
    commodities
        .expect_supersede()
        .withf(move |previous, replacement, _| {
            *previous == original.id
                && replacement.code == original.code
                && replacement.id != original.id
        })
        .times(1)
        .returning(|_, _, _| Ok(true));

    let edited = service(commodities, MockMediaStore::new())
        .edit(
            &chain.owner,
            chain.commodity.id,
            draft("Red Chili"),
            Vec::new(),
        )
        .await
        .expect("edit");

    assert_eq!(edited.code, chain.commodity.code);
    assert_eq!(edited.created_at, chain.commodity.created_at);
    assert_eq!(edited.updated_at, Some(day(1)));
}

#[rstest]
#[tokio::test]
async fn renaming_checks_for_conflicts(chain: Chain) {
    let mut commodities = serving(chain.commodity.clone());
    let other = chain.commodity.clone();
    commodities
        .expect_find_live_by_owner_and_name()
        .returning(move |_, _| Ok(Some(other.clone())));
    commodities.expect_supersede().times(0);

    let err = service(commodities, MockMediaStore::new())
        .edit(
            &chain.owner,
            chain.commodity.id,
            draft("Green Chili"),
            Vec::new(),
        )
        .await
        .expect_err("name taken");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn lost_supersede_race_is_invalid_state(chain: Chain) {
    let mut commodities = serving(chain.commodity.clone());
    commodities
        .expect_supersede()
        .returning(|_, _, _| Ok(false));

    let err = service(commodities, MockMediaStore::new())
        .edit(
            &chain.owner,
            chain.commodity.id,
            draft("Red Chili"),
            Vec::new(),
        )
        .await
        .expect_err("already superseded");

    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn strangers_cannot_touch_a_commodity(chain: Chain) {
    let mut commodities = serving(chain.commodity.clone());
    commodities.expect_retire().times(0);

    let err = service(commodities, MockMediaStore::new())
        .retire(&chain.stranger(), chain.commodity.id)
        .await
        .expect_err("not the owner");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn retire_soft_deletes(chain: Chain) {
    let mut commodities = serving(chain.commodity.clone());
    commodities
        .expect_retire()
        .with(eq(chain.commodity.id), eq(day(1)))
        .times(1)
        .returning(|_, _| Ok(true));

    service(commodities, MockMediaStore::new())
        .retire(&chain.owner, chain.commodity.id)
        .await
        .expect("retire");
}
