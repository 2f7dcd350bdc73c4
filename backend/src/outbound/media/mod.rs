//! Media store adapters.

mod bounded;
mod in_memory;

pub use bounded::BoundedMediaStore;
pub use in_memory::{InMemoryMediaStore, StoredObject};
