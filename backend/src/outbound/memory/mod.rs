//! In-process document store implementing every repository port.
//!
//! One [`InMemoryStore`] holds all six collections behind a single mutex, so
//! a multi-row write such as a supersession is atomic with respect to every
//! other call. Storage-level uniqueness rules are enforced here and reported
//! as [`RepositoryError::Conflict`]:
//!
//! - a live commodity name is unique per owner;
//! - a proposal has at most one accepted transaction;
//! - treatment record numbers are unique within a batch;
//! - a batch has at most one harvest.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Datelike, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::RepositoryError;
use crate::domain::{
    Batch, BatchId, Commodity, CommodityId, Harvest, HarvestId, Proposal, ProposalId,
    Transaction, TransactionId, TreatmentRecord, TreatmentRecordId,
};

mod batches;
mod commodities;
mod harvests;
mod proposals;
mod transactions;
mod treatment_records;

#[derive(Debug, Default)]
struct Tables {
    commodities: HashMap<CommodityId, Commodity>,
    proposals: HashMap<ProposalId, Proposal>,
    transactions: HashMap<TransactionId, Transaction>,
    batches: HashMap<BatchId, Batch>,
    treatment_records: HashMap<TreatmentRecordId, TreatmentRecord>,
    harvests: HashMap<HarvestId, Harvest>,
}

/// Document store backing every repository port in one process.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use crop_connect::outbound::memory::InMemoryStore;
///
/// let store = Arc::new(InMemoryStore::new());
/// assert_eq!(store.len(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored rows across every collection.
    pub fn len(&self) -> usize {
        let tables = self.tables();
        tables.commodities.len()
            + tables.proposals.len()
            + tables.transactions.len()
            + tables.batches.len()
            + tables.treatment_records.len()
            + tables.harvests.len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Mutations are single map operations; a poisoned lock still guards
        // consistent rows.
        self.tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Sort-then-slice helper shared by every listing.
fn paged<T>(rows: Vec<T>, page: PageRequest) -> Page<T> {
    let total = u64::try_from(rows.len()).unwrap_or(u64::MAX);
    Page {
        items: page.slice(rows),
        total,
    }
}

fn created_in(at: DateTime<Utc>, year: i32) -> bool {
    at.year() == year
}

fn count(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

fn missing(what: &str) -> RepositoryError {
    RepositoryError::query(format!("{what} does not exist"))
}
