//! At most one in-flight reconciliation per agent identity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Identity = (String, String);
type Slots = Arc<Mutex<HashMap<Identity, Slot>>>;

#[derive(Debug, Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    /// Holder plus waiters.
    users: usize,
}

/// Per-identity mutual exclusion. Passes for different agents never wait on
/// each other; slots are removed once nobody holds or waits on them.
#[derive(Debug, Clone, Default)]
pub struct IdentityLocks {
    slots: Slots,
}

/// Registration on a slot. Dropping it, including when a pending
/// [`IdentityLocks::acquire`] is abandoned, releases the slot once unused.
#[derive(Debug)]
struct Lease {
    identity: Identity,
    slots: Slots,
}

/// Held for the duration of one pass.
#[derive(Debug)]
pub struct IdentityGuard {
    _guard: OwnedMutexGuard<()>,
    _lease: Lease,
}

impl IdentityLocks {
    /// Empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `namespace/name`.
    pub async fn acquire(&self, namespace: &str, name: &str) -> IdentityGuard {
        let identity = (namespace.to_string(), name.to_string());
        let lock = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(identity.clone()).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };
        let lease = Lease {
            identity,
            slots: Arc::clone(&self.slots),
        };

        IdentityGuard {
            _guard: lock.lock_owned().await,
            _lease: lease,
        }
    }

    /// Number of identities with a live slot.
    pub fn active(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(&self.identity) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(&self.identity);
            }
        }
    }
}
