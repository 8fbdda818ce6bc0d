mod index;
mod keyed;

pub use index::FreeIndexSet;
pub use keyed::{KeySlots, ReserveOutcome};
