//! Production workflow engine for a farm-to-buyer supply chain.
//!
//! Farmers publish commodities and planting proposals, buyers open
//! transactions against approved proposals, and an accepted transaction
//! starts a production batch whose field treatments and harvest validators
//! review. [`domain`] holds the aggregates, lifecycle services and ports;
//! [`outbound`] holds the adapters implementing those ports.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
