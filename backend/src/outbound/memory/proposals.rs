//! Proposal collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::{ProposalFilter, ProposalRepository, RepositoryError};
use crate::domain::{Proposal, ProposalId, Visibility};

use super::{InMemoryStore, missing, paged};

#[async_trait]
impl ProposalRepository for InMemoryStore {
    async fn create(&self, proposal: &Proposal) -> Result<(), RepositoryError> {
        self.tables()
            .proposals
            .insert(proposal.id, proposal.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ProposalId,
        visibility: Visibility,
    ) -> Result<Option<Proposal>, RepositoryError> {
        Ok(self
            .tables()
            .proposals
            .get(&id)
            .filter(|row| visibility.admits(row.superseded_at))
            .cloned())
    }

    async fn update(&self, proposal: &Proposal) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        match tables.proposals.get_mut(&proposal.id) {
            Some(row) if row.superseded_at.is_none() => {
                *row = proposal.clone();
                Ok(())
            }
            _ => Err(missing("live proposal")),
        }
    }

    async fn supersede(
        &self,
        previous: ProposalId,
        replacement: &Proposal,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();
        match tables.proposals.get_mut(&previous) {
            Some(row) if row.superseded_at.is_none() => row.superseded_at = Some(at),
            _ => return Ok(false),
        }
        tables.proposals.insert(replacement.id, replacement.clone());
        Ok(true)
    }

    async fn retire(&self, id: ProposalId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let mut tables = self.tables();
        match tables.proposals.get_mut(&id) {
            Some(row) if row.superseded_at.is_none() => {
                row.superseded_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(
        &self,
        filter: ProposalFilter,
        page: PageRequest,
    ) -> Result<Page<Proposal>, RepositoryError> {
        let mut rows: Vec<_> = self
            .tables()
            .proposals
            .values()
            .filter(|row| row.superseded_at.is_none() && filter.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(paged(rows, page))
    }
}
