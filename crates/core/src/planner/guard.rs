use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::item::OwnerId;

/// Owners with a generation or regeneration currently running.
#[derive(Clone, Default)]
pub struct GenerationLocks {
    running: Arc<Mutex<HashSet<OwnerId>>>,
}

impl GenerationLocks {
    /// Non-blocking. `None` when a run for the owner already holds the lock.
    pub fn try_acquire(&self, owner_id: &OwnerId) -> Option<GenerationLockGuard> {
        if !self.running().insert(owner_id.clone()) {
            return None;
        }
        tracing::debug!(event_name = "planner.lock_acquired", owner_id = %owner_id);
        Some(GenerationLockGuard { owner_id: owner_id.clone(), locks: self.clone() })
    }

    pub fn is_running(&self, owner_id: &OwnerId) -> bool {
        self.running().contains(owner_id)
    }

    fn release(&self, owner_id: &OwnerId) {
        self.running().remove(owner_id);
        tracing::debug!(event_name = "planner.lock_released", owner_id = %owner_id);
    }

    fn running(&self) -> MutexGuard<'_, HashSet<OwnerId>> {
        match self.running.lock() {
            Ok(running) => running,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Releases the owner's lock on drop, including on early return or panic.
pub struct GenerationLockGuard {
    owner_id: OwnerId,
    locks: GenerationLocks,
}

impl Drop for GenerationLockGuard {
    fn drop(&mut self) {
        self.locks.release(&self.owner_id);
    }
}
