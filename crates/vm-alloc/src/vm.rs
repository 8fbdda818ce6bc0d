//! VM execution-slot pool.
//!
//! Exclusive, capacity-bounded reservation of caller-chosen VM ids. The pool
//! stores occupancy only; launching the VM, wiring its network, and tearing
//! it down are the caller's job, and a slot must be freed only after the
//! underlying VM is fully gone.

use std::sync::{Mutex, MutexGuard, PoisonError};

use slot_pool::{KeySlots, ReserveOutcome};
use tracing::{debug, warn};

use crate::error::{PoolError, Result};

/// Acknowledgment of a live reservation.
///
/// Carries the id back to the caller's teardown path; dropping it does not
/// free the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct VmHandle {
    pub vm_id: String,
}

/// Fixed-capacity pool of VM slots keyed by caller-supplied unique ids.
///
/// One mutex covers the whole allocate/free critical section; failures are
/// synchronous and leave the pool unchanged.
pub struct VmPool {
    slots: Mutex<KeySlots<String>>,
}

impl VmPool {
    /// Create a pool with `capacity` free slots and no live ids.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(KeySlots::new(capacity)),
        }
    }

    /// Reserve a slot under `vm_id`.
    ///
    /// Fails with [`PoolError::DuplicateId`] when the id is already live
    /// (checked before capacity, so a full pool still reports duplicates as
    /// such) and [`PoolError::Exhausted`] when every slot is taken.
    pub fn allocate(&self, vm_id: impl Into<String>) -> Result<VmHandle> {
        let vm_id = vm_id.into();
        let mut slots = self.lock();
        match slots.reserve(vm_id.clone()) {
            ReserveOutcome::Reserved => {
                let free = slots.free_count();
                drop(slots);
                debug!(vm_id = %vm_id, free, "allocated VM slot");
                Ok(VmHandle { vm_id })
            }
            ReserveOutcome::AlreadyReserved => {
                drop(slots);
                warn!(vm_id = %vm_id, "VM id already allocated");
                Err(PoolError::DuplicateId(vm_id))
            }
            ReserveOutcome::Exhausted => {
                let capacity = slots.capacity();
                drop(slots);
                warn!(vm_id = %vm_id, capacity, "VM pool exhausted");
                Err(PoolError::Exhausted { capacity })
            }
        }
    }

    /// Release the reservation held under `vm_id`.
    ///
    /// Fails with [`PoolError::UnknownId`] when the id is not live (double
    /// free or a never-allocated id).
    pub fn free(&self, vm_id: &str) -> Result<()> {
        let released = self.lock().release(vm_id);
        if !released {
            warn!(vm_id = %vm_id, "release of a VM id that is not live");
            return Err(PoolError::UnknownId(vm_id.to_owned()));
        }
        debug!(vm_id = %vm_id, "freed VM slot");
        Ok(())
    }

    /// Whether `vm_id` currently holds a slot.
    pub fn is_allocated(&self, vm_id: &str) -> bool {
        self.lock().contains(vm_id)
    }

    /// Live ids, sorted. Diagnostic surface for orchestrator state dumps.
    pub fn live_ids(&self) -> Vec<String> {
        let slots = self.lock();
        let mut ids: Vec<String> = slots.iter().cloned().collect();
        drop(slots);
        ids.sort_unstable();
        ids
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Slots currently free.
    pub fn free_slots(&self) -> usize {
        self.lock().free_count()
    }

    // Same poisoning stance as NiPool: the reservation set is consistent at
    // every point a panic could occur, so recover the guard.
    fn lock(&self) -> MutexGuard<'_, KeySlots<String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
