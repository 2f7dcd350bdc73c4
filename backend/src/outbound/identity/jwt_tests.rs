//! Regression coverage for this module.

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::test_support::MutableClock;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

#[fixture]
fn clock() -> Arc<MutableClock> {
    let start = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    Arc::new(MutableClock::new(start))
}

fn resolver(clock: &Arc<MutableClock>) -> JwtIdentityResolver {
    JwtIdentityResolver::new(SECRET, TimeDelta::hours(24), clock.clone())
        .expect("valid configuration")
}

#[rstest]
#[case(Role::Farmer)]
#[case(Role::Buyer)]
#[tokio::test]
async fn issued_tokens_resolve_to_the_same_caller(clock: Arc<MutableClock>, #[case] role: Role) {
    let resolver = resolver(&clock);
    let caller = Caller::new(UserId::random(), role);
    let token = resolver.issue(caller).expect("issue");

    let bare = resolver.resolve(&token).await.expect("bare token");
    let bearer = resolver
        .resolve(&format!("Bearer {token}"))
        .await
        .expect("bearer token");

    assert_eq!(bare, caller);
    assert_eq!(bearer, caller);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("Bearer ")]
#[case("  Bearer   ")]
#[case("Bearer")]
#[tokio::test]
async fn blank_credentials_are_missing(clock: Arc<MutableClock>, #[case] credential: &str) {
    let err = resolver(&clock)
        .resolve(credential)
        .await
        .expect_err("blank");
    assert_eq!(err, IdentityError::missing());
}

#[rstest]
#[tokio::test]
async fn tokens_expire_with_the_clock(clock: Arc<MutableClock>) {
    let resolver = resolver(&clock);
    let token = resolver
        .issue(Caller::new(UserId::random(), Role::Validator))
        .expect("issue");

    clock.advance(TimeDelta::hours(23));
    resolver.resolve(&token).await.expect("still valid");

    clock.advance(TimeDelta::hours(1));
    let err = resolver.resolve(&token).await.expect_err("expired");
    assert_eq!(err, IdentityError::expired());
}

#[rstest]
#[tokio::test]
async fn tokens_from_another_secret_are_invalid(clock: Arc<MutableClock>) {
    let foreign = JwtIdentityResolver::new(
        "ffffffffffffffffffffffffffffffffffff",
        TimeDelta::hours(1),
        clock.clone(),
    )
    .expect("valid configuration");
    let token = foreign
        .issue(Caller::new(UserId::random(), Role::Admin))
        .expect("issue");

    let err = resolver(&clock).resolve(&token).await.expect_err("foreign");

    assert!(matches!(err, IdentityError::Invalid { .. }));
}

#[rstest]
#[tokio::test]
async fn tokens_from_another_issuer_are_invalid(clock: Arc<MutableClock>) {
    let now = clock.utc().timestamp();
    let claims = Claims {
        iss: "somebody_else".to_owned(),
        uid: UserId::random(),
        role: Role::Farmer,
        iat: now,
        nbf: now,
        exp: now + 600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("sign");

    let err = resolver(&clock).resolve(&token).await.expect_err("issuer");

    assert_eq!(err, IdentityError::invalid("unexpected issuer"));
}

#[rstest]
#[tokio::test]
async fn garbage_is_invalid(clock: Arc<MutableClock>) {
    let err = resolver(&clock)
        .resolve("Bearer not.a.token")
        .await
        .expect_err("garbage");
    assert!(matches!(err, IdentityError::Invalid { .. }));
}

#[rstest]
fn short_secrets_are_rejected(clock: Arc<MutableClock>) {
    let err = JwtIdentityResolver::new("short", TimeDelta::hours(1), clock)
        .expect_err("too short");
    assert_eq!(
        err,
        TokenError::SecretTooShort {
            minimum: MIN_SECRET_BYTES
        }
    );
}

#[rstest]
fn lifetimes_must_be_positive(clock: Arc<MutableClock>) {
    let err = JwtIdentityResolver::new(SECRET, TimeDelta::zero(), clock).expect_err("zero");
    assert_eq!(err, TokenError::NonPositiveLifetime);
}

#[rstest]
#[tokio::test]
async fn zeroized_secrets_sign_like_plain_ones(clock: Arc<MutableClock>) {
    let held = JwtIdentityResolver::with_secret(
        Zeroizing::new(SECRET.as_bytes().to_vec()),
        TimeDelta::hours(1),
        clock.clone(),
    )
    .expect("valid configuration");
    let caller = Caller::new(UserId::random(), Role::Farmer);
    let token = held.issue(caller).expect("issue");

    let resolved = resolver(&clock).resolve(&token).await.expect("resolve");

    assert_eq!(resolved, caller);
}
