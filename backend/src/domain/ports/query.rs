//! Filters and orderings accepted by the listing ports.
//!
//! Each filter doubles as an in-process predicate so document stores without
//! a query language can evaluate it directly.

use std::cmp::Ordering;

use pagination::SortOrder;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Batch, BatchId, BatchStatus, CommodityId, Harvest, HarvestStatus, Proposal, ProposalId,
    ProposalStatus, RegionId, Transaction, TransactionStatus, TreatmentRecord, TreatmentStatus,
    UserId,
};

/// Narrowing criteria for proposal listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalFilter {
    pub commodity_id: Option<CommodityId>,
    pub region_id: Option<RegionId>,
    pub status: Option<ProposalStatus>,
    /// Only proposals currently open for transactions.
    pub available_only: bool,
}

impl ProposalFilter {
    /// Whether `proposal` satisfies every set criterion.
    pub fn matches(&self, proposal: &Proposal) -> bool {
        self.commodity_id.is_none_or(|id| proposal.commodity_id == id)
            && self.region_id.is_none_or(|id| proposal.region_id == id)
            && self.status.is_none_or(|status| proposal.status == status)
            && (!self.available_only || proposal.is_available)
    }
}

/// Narrowing criteria for transaction listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub buyer_id: Option<UserId>,
    pub proposal_id: Option<ProposalId>,
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    /// Whether `transaction` satisfies every set criterion.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.buyer_id.is_none_or(|id| transaction.buyer_id == id)
            && self.proposal_id.is_none_or(|id| transaction.proposal_id == id)
            && self.status.is_none_or(|status| transaction.status == status)
    }
}

/// Narrowing criteria for treatment record queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRecordFilter {
    pub batch_id: Option<BatchId>,
    pub status: Option<TreatmentStatus>,
    pub number: Option<u32>,
}

impl TreatmentRecordFilter {
    /// Whether `record` satisfies every set criterion.
    pub fn matches(&self, record: &TreatmentRecord) -> bool {
        self.batch_id.is_none_or(|id| record.batch_id == id)
            && self.status.is_none_or(|status| record.status == status)
            && self.number.is_none_or(|number| record.number == number)
    }
}

/// Field a treatment record query is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatmentSortField {
    #[default]
    CreatedAt,
    Date,
    Number,
}

/// Ordering for treatment record queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreatmentRecordSort {
    pub field: TreatmentSortField,
    pub order: SortOrder,
}

impl TreatmentRecordSort {
    /// Compare two records under this ordering.
    pub fn compare(&self, left: &TreatmentRecord, right: &TreatmentRecord) -> Ordering {
        let natural = match self.field {
            TreatmentSortField::CreatedAt => left.created_at.cmp(&right.created_at),
            TreatmentSortField::Date => left.date.cmp(&right.date),
            TreatmentSortField::Number => left.number.cmp(&right.number),
        };
        self.order.apply(natural)
    }
}

/// Narrowing criteria for harvest queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestFilter {
    pub batch_id: Option<BatchId>,
    pub status: Option<HarvestStatus>,
}

impl HarvestFilter {
    /// Whether `harvest` satisfies every set criterion.
    pub fn matches(&self, harvest: &Harvest) -> bool {
        self.batch_id.is_none_or(|id| harvest.batch_id == id)
            && self.status.is_none_or(|status| harvest.status == status)
    }
}

/// Narrowing criteria for batch listings.
///
/// A batch records neither its commodity nor its farmer; adapters walk the
/// batch's proposal to find both and pass them to [`Self::matches`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFilter {
    pub farmer_id: Option<UserId>,
    pub commodity_id: Option<CommodityId>,
    pub status: Option<BatchStatus>,
}

impl BatchFilter {
    /// Whether `batch`, grown from `commodity_id` by `owner_id`, satisfies
    /// every set criterion.
    pub fn matches(&self, batch: &Batch, commodity_id: CommodityId, owner_id: UserId) -> bool {
        self.farmer_id.is_none_or(|id| owner_id == id)
            && self.commodity_id.is_none_or(|id| commodity_id == id)
            && self.status.is_none_or(|status| batch.status == status)
    }
}
