//! Test utilities for the workflow crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

pub mod clock;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::config::WorkflowSettings;
use crate::domain::{
    BatchId, BatchService, Caller, CommodityService, HarvestService, KeyedLocks, OwnershipResolver,
    ProposalService, Role, TransactionService, TreatmentService, UserId,
};
use crate::outbound::identity::{JwtIdentityResolver, TokenError};
use crate::outbound::media::{BoundedMediaStore, InMemoryMediaStore};
use crate::outbound::memory::InMemoryStore;

pub use clock::MutableClock;

/// Signing secret used by [`InMemoryWorkflow`] when none is configured.
pub const TEST_SECRET: &str = "crop-connect-test-secret-0123456789";

/// Media store type the in-memory workflow wires into its services.
pub type TestMediaStore = BoundedMediaStore<InMemoryMediaStore>;

/// Failures wiring an [`InMemoryWorkflow`] from settings.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// `media_base_url` does not parse.
    #[error("invalid media base url: {0}")]
    MediaBaseUrl(#[from] url::ParseError),
    /// The token settings are unusable.
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Every service wired over one in-memory store, media store and clock.
///
/// The treatment and harvest services share per-batch locks, as they would
/// in a deployed process.
pub struct InMemoryWorkflow {
    pub store: Arc<InMemoryStore>,
    pub media: Arc<TestMediaStore>,
    pub clock: Arc<MutableClock>,
    pub identity: JwtIdentityResolver,
    pub commodities: CommodityService<InMemoryStore, TestMediaStore>,
    pub proposals: ProposalService<InMemoryStore, InMemoryStore>,
    pub transactions:
        TransactionService<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>,
    pub batches: BatchService<InMemoryStore, InMemoryStore>,
    pub treatments: TreatmentService<InMemoryStore, InMemoryStore, TestMediaStore>,
    pub harvests: HarvestService<InMemoryStore, InMemoryStore, InMemoryStore, TestMediaStore>,
}

impl InMemoryWorkflow {
    /// Wire the workflow with default settings and the clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Result<Self, HarnessError> {
        Self::from_settings(&WorkflowSettings::default(), now)
    }

    /// Wire the workflow from `settings` with the clock frozen at `now`.
    pub fn from_settings(
        settings: &WorkflowSettings,
        now: DateTime<Utc>,
    ) -> Result<Self, HarnessError> {
        let store = Arc::new(InMemoryStore::new());
        let media = Arc::new(BoundedMediaStore::new(
            InMemoryMediaStore::new(settings.media_base_url()?),
            settings.media_call_timeout(),
        ));
        let clock = Arc::new(MutableClock::new(now));
        let secret = settings
            .jwt_secret()
            .unwrap_or_else(|| Zeroizing::new(TEST_SECRET.as_bytes().to_vec()));
        let identity =
            JwtIdentityResolver::with_secret(secret, settings.token_ttl(), clock.clone())?;

        let ownership = OwnershipResolver::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        let batch_locks = Arc::new(KeyedLocks::<BatchId>::new());

        Ok(Self {
            commodities: CommodityService::new(store.clone(), media.clone(), clock.clone()),
            proposals: ProposalService::new(store.clone(), store.clone(), clock.clone()),
            transactions: TransactionService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                clock.clone(),
            ),
            batches: BatchService::new(store.clone(), store.clone(), ownership.clone()),
            treatments: TreatmentService::new(
                store.clone(),
                store.clone(),
                ownership.clone(),
                media.clone(),
                clock.clone(),
            )
            .with_fill_skew(settings.treatment_fill_skew())
            .with_batch_locks(batch_locks.clone()),
            harvests: HarvestService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                ownership,
                media.clone(),
                clock.clone(),
            )
            .with_batch_locks(batch_locks),
            store,
            media,
            clock,
            identity,
        })
    }

    /// A fresh caller holding `role`.
    pub fn caller(role: Role) -> Caller {
        Caller::new(UserId::random(), role)
    }

    /// The in-memory object store behind the time bound.
    pub fn media_objects(&self) -> &InMemoryMediaStore {
        self.media.inner()
    }
}
