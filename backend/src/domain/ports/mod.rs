//! Driven ports of the workflow engine.
//!
//! Services depend only on these traits; adapters under `outbound` implement
//! them. Every port reports failures through an enum generated by
//! `define_port_error!`.

mod macros;
pub(crate) use macros::define_port_error;

mod batch_repository;
mod commodity_repository;
mod harvest_repository;
mod identity_resolver;
mod media_store;
mod proposal_repository;
mod query;
mod repository_error;
mod transaction_repository;
mod treatment_record_repository;

pub use batch_repository::BatchRepository;
#[cfg(test)]
pub use batch_repository::MockBatchRepository;
pub use commodity_repository::CommodityRepository;
#[cfg(test)]
pub use commodity_repository::MockCommodityRepository;
pub use harvest_repository::HarvestRepository;
#[cfg(test)]
pub use harvest_repository::MockHarvestRepository;
#[cfg(test)]
pub use identity_resolver::MockIdentityResolver;
pub use identity_resolver::{IdentityError, IdentityResolver};
#[cfg(test)]
pub use media_store::MockMediaStore;
pub use media_store::{MediaStore, MediaStoreError};
#[cfg(test)]
pub use proposal_repository::MockProposalRepository;
pub use proposal_repository::ProposalRepository;
pub use query::{
    BatchFilter, HarvestFilter, ProposalFilter, TransactionFilter, TreatmentRecordFilter,
    TreatmentRecordSort, TreatmentSortField,
};
pub use repository_error::RepositoryError;
#[cfg(test)]
pub use transaction_repository::MockTransactionRepository;
pub use transaction_repository::TransactionRepository;
#[cfg(test)]
pub use treatment_record_repository::MockTreatmentRecordRepository;
pub use treatment_record_repository::TreatmentRecordRepository;
