//! Production batches created when a transaction is accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BatchId, ProposalId, TransactionId};

/// Stage of a production run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Crops are in the ground; treatments may be scheduled.
    Planting,
    /// The harvest has been accepted.
    Harvesting,
}

/// One accepted production run.
///
/// Target ordering across the lifecycle:
/// `created_at <= treatment dates <= estimated_harvest_date <= harvest date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: BatchId,
    pub proposal_id: ProposalId,
    pub transaction_id: TransactionId,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub estimated_harvest_date: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Batch {
    /// Start planting for an accepted transaction.
    pub fn planting(
        proposal_id: ProposalId,
        transaction_id: TransactionId,
        now: DateTime<Utc>,
        estimated_harvest_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BatchId::random(),
            proposal_id,
            transaction_id,
            status: BatchStatus::Planting,
            created_at: now,
            estimated_harvest_date,
            updated_at: None,
        }
    }

    /// Move the batch on once its harvest is accepted.
    pub fn start_harvesting(&mut self, now: DateTime<Utc>) {
        self.status = BatchStatus::Harvesting;
        self.updated_at = Some(now);
    }
}
