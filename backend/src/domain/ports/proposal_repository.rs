//! Port for proposal persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::{Proposal, ProposalId, Visibility};

use super::{ProposalFilter, RepositoryError};

/// Port for proposal storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Insert a new proposal version.
    async fn create(&self, proposal: &Proposal) -> Result<(), RepositoryError>;

    /// Fetch a proposal version by id.
    async fn find_by_id(
        &self,
        id: ProposalId,
        visibility: Visibility,
    ) -> Result<Option<Proposal>, RepositoryError>;

    /// Overwrite the mutable fields of a live proposal.
    async fn update(&self, proposal: &Proposal) -> Result<(), RepositoryError>;

    /// Stamp `previous` as superseded at `at` and insert `replacement`.
    ///
    /// Returns `false` when `previous` is no longer live.
    async fn supersede(
        &self,
        previous: ProposalId,
        replacement: &Proposal,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Soft-delete a live proposal. Returns `false` when nothing was live.
    async fn retire(&self, id: ProposalId, at: DateTime<Utc>) -> Result<bool, RepositoryError>;

    /// Page through live proposals matching `filter`, newest first.
    async fn list(
        &self,
        filter: ProposalFilter,
        page: PageRequest,
    ) -> Result<Page<Proposal>, RepositoryError>;
}
