//! In-process async mutual exclusion keyed by entity id.
//!
//! Lifecycle operations that read, check and then write (scheduling the next
//! treatment, submitting a harvest, deciding a transaction) hold the lock for
//! their batch or proposal across the whole sequence. Storage-level
//! uniqueness rules remain the backstop across processes.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard returned by [`KeyedLocks::lock`]; the key is released on drop.
#[derive(Debug)]
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

/// A set of async mutexes created on demand, one per key.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash,
{
    /// Create an empty lock set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder has `key`, then hold it.
    pub async fn lock(&self, key: K) -> KeyGuard {
        let slot = {
            let mut slots = self.slots();
            // Slots referenced only by the map are idle.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry(key).or_default())
        };
        KeyGuard {
            _guard: slot.lock_owned().await,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<K, Arc<AsyncMutex<()>>>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
