//! Outbound adapters implementing the domain ports.
//!
//! - **identity**: bearer token verification.
//! - **media**: image object stores and the per-call time bound.
//! - **memory**: process-local document store backing every repository.
//!
//! Adapters translate between domain types and their storage shape. They
//! hold no workflow rules beyond the uniqueness backstops each collection
//! enforces.

pub mod identity;
pub mod media;
pub mod memory;
