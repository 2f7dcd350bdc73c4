//! Planting proposals submitted by farmers for validator approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CommodityId, Error, ProposalCode, ProposalId, RegionId, UserId};

/// Review state of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
}

/// One version of a planting proposal.
///
/// ## Invariants
/// - `reject_reason` is present exactly when `status` is `Rejected`.
/// - Once not `Pending`, the decision fields change only through a
///   re-proposal, which supersedes this version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub code: ProposalCode,
    pub commodity_id: CommodityId,
    pub region_id: RegionId,
    pub validator_id: Option<UserId>,
    pub name: String,
    pub description: String,
    pub status: ProposalStatus,
    pub reject_reason: Option<String>,
    /// Expected yield in kilograms.
    pub estimated_total_harvest: f64,
    /// Planted area in square metres.
    pub planting_area: f64,
    pub address: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub superseded_at: Option<DateTime<Utc>>,
}

/// Farmer-supplied proposal fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDraft {
    pub commodity_id: CommodityId,
    pub region_id: RegionId,
    pub name: String,
    pub description: String,
    pub estimated_total_harvest: f64,
    pub planting_area: f64,
    pub address: String,
}

impl ProposalDraft {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("proposal name must not be empty"));
        }
        if self.address.trim().is_empty() {
            return Err(Error::invalid_input("proposal address must not be empty"));
        }
        if !(self.estimated_total_harvest.is_finite() && self.estimated_total_harvest > 0.0) {
            return Err(Error::invalid_input("estimated total harvest must be positive"));
        }
        if !(self.planting_area.is_finite() && self.planting_area > 0.0) {
            return Err(Error::invalid_input("planting area must be positive"));
        }
        Ok(())
    }
}

/// Validator decision on a pending proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ProposalDecision {
    Approved,
    Rejected { reason: String },
}

impl Proposal {
    /// Build a pending proposal. `code` is reused by re-proposals.
    pub fn pending(code: ProposalCode, draft: ProposalDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: ProposalId::random(),
            code,
            commodity_id: draft.commodity_id,
            region_id: draft.region_id,
            validator_id: None,
            name: draft.name.trim().to_owned(),
            description: draft.description,
            status: ProposalStatus::Pending,
            reject_reason: None,
            estimated_total_harvest: draft.estimated_total_harvest,
            planting_area: draft.planting_area,
            address: draft.address,
            is_available: false,
            created_at: now,
            updated_at: None,
            superseded_at: None,
        }
    }

    /// Record a validator's decision.
    ///
    /// Approval opens the proposal for transactions; rejection requires a
    /// reason.
    pub fn decide(
        &mut self,
        validator_id: UserId,
        decision: ProposalDecision,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        if self.status != ProposalStatus::Pending {
            return Err(Error::invalid_state("proposal has already been decided"));
        }
        match decision {
            ProposalDecision::Approved => {
                self.status = ProposalStatus::Approved;
                self.reject_reason = None;
                self.is_available = true;
            }
            ProposalDecision::Rejected { reason } => {
                if reason.trim().is_empty() {
                    return Err(Error::invalid_input("reject reason must not be empty"));
                }
                self.status = ProposalStatus::Rejected;
                self.reject_reason = Some(reason);
                self.is_available = false;
            }
        }
        self.validator_id = Some(validator_id);
        self.updated_at = Some(now);
        Ok(())
    }

    /// Build the version that replaces a pending or rejected proposal.
    ///
    /// The replacement keeps the code, commodity and creation time and goes
    /// back to review.
    pub fn repropose(&self, draft: ProposalDraft, now: DateTime<Utc>) -> Result<Self, Error> {
        if self.status == ProposalStatus::Approved {
            return Err(Error::invalid_state("approved proposals cannot be changed"));
        }
        if draft.commodity_id != self.commodity_id {
            return Err(Error::invalid_input("a proposal cannot move to another commodity"));
        }
        let mut next = Self::pending(self.code, draft, self.created_at);
        next.updated_at = Some(now);
        Ok(next)
    }

    /// Open or close an approved proposal to new transactions.
    pub fn set_availability(&mut self, available: bool, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status != ProposalStatus::Approved {
            return Err(Error::invalid_state("proposal has not been approved"));
        }
        self.is_available = available;
        self.updated_at = Some(now);
        Ok(())
    }

    /// Whether buyers may open a transaction against this proposal.
    pub fn is_open_for_transactions(&self) -> bool {
        self.status == ProposalStatus::Approved && self.is_available && self.superseded_at.is_none()
    }
}
