//! Port for commodity persistence.
//!
//! Commodities are versioned by supersession: an edit inserts a replacement
//! row sharing the stable code and stamps the old row, so reads take a
//! [`Visibility`] to choose whether stamped rows are returned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::{Commodity, CommodityId, UserId, Visibility};

use super::RepositoryError;

/// Port for commodity storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommodityRepository: Send + Sync {
    /// Insert a new commodity.
    ///
    /// Fails with [`RepositoryError::Conflict`] when the owner already has a
    /// live commodity with the same name.
    async fn create(&self, commodity: &Commodity) -> Result<(), RepositoryError>;

    /// Fetch a commodity version by id.
    async fn find_by_id(
        &self,
        id: CommodityId,
        visibility: Visibility,
    ) -> Result<Option<Commodity>, RepositoryError>;

    /// Fetch the owner's live commodity with exactly this name.
    async fn find_live_by_owner_and_name(
        &self,
        owner_id: UserId,
        name: &str,
    ) -> Result<Option<Commodity>, RepositoryError>;

    /// Page through the owner's live commodities, newest first.
    async fn list_live_by_owner(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Commodity>, RepositoryError>;

    /// Stamp `previous` as superseded at `at` and insert `replacement`.
    ///
    /// Both writes happen or neither does. Returns `false` when `previous` is
    /// no longer live.
    async fn supersede(
        &self,
        previous: CommodityId,
        replacement: &Commodity,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Soft-delete a live commodity. Returns `false` when nothing was live.
    async fn retire(&self, id: CommodityId, at: DateTime<Utc>) -> Result<bool, RepositoryError>;

    /// Number of live commodities created during `year`.
    async fn count_live_by_year(&self, year: i32) -> Result<u64, RepositoryError>;
}
