//! Network Interface Pool for Firecracker microVMs
//!
//! Hands out fixed-size slots whose index drives every piece of the
//! interface's network identity. MAC, TAP device name, and IP placement are
//! pure functions of the slot index, so a freed slot's identity is recomputed
//! bit-for-bit when the index is reissued.
//!
//! ```text
//!   index  mac                host dev    primary        gateway
//!   0      02:FC:00:00:00:00  fc-0-tap0   196.128.0.2    196.128.0.1
//!   1      02:FC:00:00:00:01  fc-1-tap0   197.128.0.3    197.128.0.1
//!   2      02:FC:00:00:00:02  fc-2-tap0   196.128.0.4    196.128.0.1
//!   254    02:FC:00:00:00:FE  fc-254-tap0 196.128.1.0    196.128.0.1
//! ```
//!
//! Even indices land in the `196.128.0.0/10` group, odd indices in
//! `197.128.0.0/10`; each group's `.128.0.1` is its shared gateway. The host
//! portion of the primary address is a base-256 two-octet encoding of
//! `index + 2`, reserving offsets 0 and 1 for infrastructure.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use slot_pool::FreeIndexSet;
use tracing::{debug, warn};

use crate::error::{PoolError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Locally-administered MAC prefix shared by every interface.
const MAC_PREFIX: &str = "02:FC:00:00";
/// TAP device name prefix and suffix around the decimal index.
const DEV_PREFIX: &str = "fc-";
const DEV_SUFFIX: &str = "-tap0";
/// Mask literal shared by both address groups.
const SUBNET_MASK: &str = "/10";
/// Second octet shared by both address groups.
const SECOND_OCTET: u32 = 128;
/// Host offsets 0 and 1 of each group are reserved for infrastructure (the
/// gateway sits at offset 1), so interface `i` takes host offset `i + 2`.
const HOST_OFFSET_BASE: usize = 2;

/// Highest capacity the addressing scheme can serve: the primary-address
/// host portion is a two-octet encoding of `index + 2`, so `index + 2` must
/// fit in 16 bits. Indices past this point have no defined addressing.
pub const MAX_NI_SLOTS: usize = (1 << 16) - HOST_OFFSET_BASE;

// The MAC's two variable octets cover 65536 indices, more than MAX_NI_SLOTS.
const _: () = assert!(MAX_NI_SLOTS <= 1 << 16);

// ---------------------------------------------------------------------------
// Derivation helpers (pure functions)
// ---------------------------------------------------------------------------

fn derive_mac(index: usize) -> String {
    format!("{MAC_PREFIX}:{:02X}:{:02X}", index / 256, index % 256)
}

fn derive_host_dev_name(index: usize) -> String {
    format!("{DEV_PREFIX}{index}{DEV_SUFFIX}")
}

/// Even indices use the 196 group, odd indices the 197 group.
fn group_prefix(index: usize) -> usize {
    196 + index % 2
}

fn derive_primary_address(index: usize) -> String {
    let offset = index + HOST_OFFSET_BASE;
    format!(
        "{}.{SECOND_OCTET}.{}.{}",
        group_prefix(index),
        offset / 256,
        offset % 256
    )
}

fn derive_gateway_address(index: usize) -> String {
    format!("{}.{SECOND_OCTET}.0.1", group_prefix(index))
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Fully-populated network identity for one microVM.
///
/// Every field is derived from `index` alone; the pool keeps no reference to
/// the descriptor after allocation, only the index's occupancy bit. Mutating
/// a returned descriptor has no effect on pool state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct NetworkInterface {
    /// Slot index in `[0, capacity)`, never shared by two live interfaces.
    pub index: usize,
    /// Locally-administered MAC (e.g. `02:FC:00:00:00:2A`).
    pub mac_address: String,
    /// Host-side TAP device name (e.g. `fc-42-tap0`).
    pub host_dev_name: String,
    /// Guest-facing address (e.g. `196.128.0.44`).
    pub primary_address: String,
    /// CIDR mask literal for the group (`/10`).
    pub subnet: String,
    /// Shared gateway of the interface's group (e.g. `196.128.0.1`).
    pub gateway_address: String,
}

impl NetworkInterface {
    fn for_index(index: usize) -> Self {
        Self {
            index,
            mac_address: derive_mac(index),
            host_dev_name: derive_host_dev_name(index),
            primary_address: derive_primary_address(index),
            subnet: SUBNET_MASK.to_owned(),
            gateway_address: derive_gateway_address(index),
        }
    }
}

// ---------------------------------------------------------------------------
// NiPool
// ---------------------------------------------------------------------------

/// Fixed-capacity pool of network-interface slots.
///
/// One mutex covers the whole allocate/free critical section: index
/// selection, occupancy flip, and counter update are atomic with respect to
/// other callers. Failures are synchronous and leave the pool unchanged.
pub struct NiPool {
    slots: Mutex<FreeIndexSet>,
}

impl NiPool {
    /// Create a pool with all `capacity` slots free.
    ///
    /// Capacity is capped at [`MAX_NI_SLOTS`]; larger requests fail with
    /// [`PoolError::CapacityExceeded`].
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity > MAX_NI_SLOTS {
            return Err(PoolError::CapacityExceeded {
                requested: capacity,
                max: MAX_NI_SLOTS,
            });
        }
        Ok(Self {
            slots: Mutex::new(FreeIndexSet::new(capacity)),
        })
    }

    /// Allocate the lowest free slot, materialized as a full descriptor.
    ///
    /// Fails with [`PoolError::Exhausted`] when every slot is live.
    pub fn allocate(&self) -> Result<NetworkInterface> {
        let mut slots = self.lock();
        let Some(index) = slots.acquire() else {
            let capacity = slots.capacity();
            drop(slots);
            warn!(capacity, "network interface pool exhausted");
            return Err(PoolError::Exhausted { capacity });
        };
        drop(slots);
        let ni = NetworkInterface::for_index(index);
        debug!(
            index,
            mac = %ni.mac_address,
            primary = %ni.primary_address,
            "allocated network interface"
        );
        Ok(ni)
    }

    /// Return a previously-allocated descriptor's slot to the free set.
    ///
    /// Fails with [`PoolError::InvalidRelease`] when the index is out of
    /// range or not currently live (double free or pool mismatch). A later
    /// allocation of the same index recomputes identical fields.
    pub fn free(&self, ni: NetworkInterface) -> Result<()> {
        let released = self.lock().release(ni.index);
        if !released {
            warn!(index = ni.index, "release of a slot that is not live");
            return Err(PoolError::InvalidRelease { index: ni.index });
        }
        debug!(index = ni.index, "freed network interface");
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Slots currently free.
    pub fn free_slots(&self) -> usize {
        self.lock().free_count()
    }

    // A poisoned lock only means another caller panicked while holding it;
    // the bitset is consistent at every point a panic could occur, so
    // recover the guard instead of propagating the poison.
    fn lock(&self) -> MutexGuard<'_, FreeIndexSet> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
