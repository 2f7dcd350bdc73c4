//! Buyer commitments against approved proposals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BatchId, Error, ProposalId, TransactionId, UserId};

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

/// A buyer's offer to purchase the yield of a proposal.
///
/// ## Invariants
/// - `batch_id` is set exactly when `status` is `Accepted`.
/// - At most one accepted transaction exists per proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub buyer_id: UserId,
    pub proposal_id: ProposalId,
    pub batch_id: Option<BatchId>,
    pub status: TransactionStatus,
    pub total_price: f64,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Farmer decision on a pending transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionDecision {
    Accepted,
    Rejected,
}

impl Transaction {
    /// Open a pending transaction.
    pub fn pending(
        buyer_id: UserId,
        proposal_id: ProposalId,
        address: String,
        total_price: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::random(),
            buyer_id,
            proposal_id,
            batch_id: None,
            status: TransactionStatus::Pending,
            total_price,
            address,
            created_at: now,
            updated_at: None,
        }
    }

    fn ensure_pending(&self) -> Result<(), Error> {
        if self.status == TransactionStatus::Pending {
            Ok(())
        } else {
            Err(Error::invalid_state("transaction is no longer pending"))
        }
    }

    /// Accept and link the batch created for it.
    pub fn accept(&mut self, batch_id: BatchId, now: DateTime<Utc>) -> Result<(), Error> {
        self.ensure_pending()?;
        self.status = TransactionStatus::Accepted;
        self.batch_id = Some(batch_id);
        self.updated_at = Some(now);
        Ok(())
    }

    /// Decline the offer.
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.ensure_pending()?;
        self.status = TransactionStatus::Rejected;
        self.updated_at = Some(now);
        Ok(())
    }

    /// Withdraw the offer on the buyer's behalf.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.ensure_pending()?;
        self.status = TransactionStatus::Cancelled;
        self.updated_at = Some(now);
        Ok(())
    }
}
